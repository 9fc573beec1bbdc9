//! The `utils` module provides shared pieces used across `streamhub`:
//! the crate's error types and logging setup.

pub mod error;
pub mod logging;
