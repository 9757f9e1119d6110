//! Infrastructure layer: host-facing adapters around the domain.

pub mod config;

pub use config::{ConfigError, ConfigLoader};
