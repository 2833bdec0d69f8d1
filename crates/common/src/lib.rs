//! Common types and utilities for Cyber Command

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod progression;
pub mod unlock;

pub use config::Config;
pub use error::{Error, Result};
