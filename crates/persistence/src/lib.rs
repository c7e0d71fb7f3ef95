//! Persistence layer for the Ideia Print back-office.
//!
//! This crate realizes the three external collaborators behind traits:
//! - Row stores per collection (`repositories`), with Postgres and
//!   in-memory implementations
//! - Blob storage (`blob`), local filesystem and in-memory
//! - The auth provider (`auth`), holding principal credentials
//!
//! plus the in-process change feed (`events`) every committed mutation is
//! published to, and the `Store` aggregate the workflow layer consumes.

pub mod auth;
pub mod blob;
pub mod db;
pub mod entities;
pub mod events;
pub mod metrics;
pub mod repositories;
pub mod store;

pub use store::Store;
