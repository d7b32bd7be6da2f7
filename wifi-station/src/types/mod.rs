//! Shared value types and constants.

pub mod bounded;
pub mod constants;
