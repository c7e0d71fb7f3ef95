//! Domain layer for the Ideia Print back-office.
//!
//! This crate is free of I/O. It contains:
//! - Domain models (orders, clients, statuses, chat, followers, notifications)
//! - The error taxonomy shared by all workflow operations
//! - Tagged change-feed event shapes
//! - Pure services (mention parsing, schedule computation, dashboard
//!   aggregation, chat projection)

pub mod error;
pub mod events;
pub mod models;
pub mod services;
