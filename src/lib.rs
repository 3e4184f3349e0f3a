// Library root: exposes internals for integration tests and the binary.
// The binary entry point is src/main.rs.

pub mod bootstrap;
pub mod core;
pub mod llm;
pub mod subsystems;

pub use crate::core::{config, error};
pub use bootstrap::{logger, probe};
