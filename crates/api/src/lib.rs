//! HTTP surface and workflow layer of the Ideia Print back-office.
//!
//! Exposed as a library so integration tests can build the full router
//! with `app::create_app` against an in-memory store.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
