//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! CLI flags / environment variables (cli)
//!     → schema.rs (ServiceConfig, serde defaults)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to every server at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the service starts
//! - All fields have defaults so tests can build minimal configs
//! - Validation reports every problem, not just the first

pub mod schema;
pub mod validation;

pub use schema::ServiceConfig;
pub use validation::{validate_config, ValidationError};

/// Error type for configuration resolution.
#[derive(Debug)]
pub enum ConfigError {
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validate `config`, folding every problem into one [`ConfigError`].
pub fn check(config: &ServiceConfig) -> Result<(), ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)
}
