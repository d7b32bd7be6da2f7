//! Public API module.
//!
//! This module contains the user-facing client and the data types its
//! operations take and return.

pub mod client;
pub mod models;
