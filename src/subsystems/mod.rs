//! Subsystem modules for the folklore server.

pub mod comms;
pub mod memory;
pub mod stories;
