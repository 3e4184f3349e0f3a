//! Status store implementations.

pub mod noop;
#[cfg(feature = "store-sqlite")]
pub mod sqlite;
