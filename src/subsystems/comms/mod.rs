//! Comms subsystem: the HTTP surface.
//!
//! [`axum_channel`] owns the listener and the router; [`state`] is the
//! capability boundary handlers go through.

pub mod axum_channel;
pub mod state;

pub use axum_channel::{build_router, run_axum};
pub use state::CommsState;
