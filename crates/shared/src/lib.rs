//! Shared utilities for the Ideia Print back-office.
//!
//! This crate provides common functionality used across all other crates:
//! - Password hashing with Argon2id
//! - JWT signing and validation (RS256)
//! - Common validation logic for domain fields

pub mod jwt;
pub mod password;
pub mod validation;
