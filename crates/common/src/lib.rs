//! Common utilities and types shared across Pingmon components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
