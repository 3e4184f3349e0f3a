//! Bootstrap layer: modules that run before the listener starts.
//!
//! - **logger**: tracing-subscriber initialisation.
//! - **probe**: one-shot dependency probe for the store and the model.

pub mod logger;
pub mod probe;
