//! # Cine Common Library
//!
//! Shared code for the cinema showtime tools including:
//! - Database schema creation and row models
//! - Configuration loading and path resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
