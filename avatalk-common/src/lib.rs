//! # Avatalk Common Library
//!
//! Shared code for the Avatalk services:
//! - Error type and result alias
//! - Bootstrap configuration loading (TOML, environment, compiled defaults)
//! - Root folder resolution

pub mod config;
pub mod error;

pub use error::{Error, Result};
