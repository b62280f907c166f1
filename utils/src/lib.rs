//! Shared utilities for the age verification service.

pub mod logging;

pub use logging::{init_logging, LogFormat};
