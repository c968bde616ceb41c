//! Error types and result aliases for crustify.
//!
//! Analysis itself never fails: malformed input is tolerated and logged.
//! Errors only come from I/O, configuration and the command line:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used throughout the crate

use anyhow::Result as AnyhowResult;

pub type Result<T> = AnyhowResult<T>;
