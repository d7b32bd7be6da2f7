//! Core internal logic for connection management.
//!
//! This module contains the radio sequencing behind the client's public
//! operations: joining a network, scanning, addressing, and the blocking
//! waits on platform events.

pub(crate) mod address;
pub(crate) mod connection;
pub(crate) mod scan;
pub(crate) mod state_wait;
