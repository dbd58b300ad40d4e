//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports fit)
//! - Detect listeners that would collide
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before any listener is bound

use thiserror::Error;

use crate::config::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service name must not be empty")]
    EmptyName,

    #[error("shutdown_timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("port {0} leaves no room for the gRPC port (port + 1)")]
    NoGrpcPort(u16),

    #[error("{first} and {second} servers both use port {port}")]
    PortConflict {
        first: &'static str,
        second: &'static str,
        port: u16,
    },
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    if config.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let mut ports = vec![("http", config.port)];
    if config.port == u16::MAX {
        errors.push(ValidationError::NoGrpcPort(config.port));
    } else {
        ports.push(("grpc", config.grpc_port()));
    }
    ports.push(("admin", config.admin_port));

    for (i, &(first, a)) in ports.iter().enumerate() {
        for &(second, b) in ports.iter().skip(i + 1) {
            // 0 asks the OS for a fresh port every time.
            if a != 0 && a == b {
                errors.push(ValidationError::PortConflict {
                    first,
                    second,
                    port: a,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let config = ServiceConfig {
            shutdown_timeout_secs: 0,
            port: 9089,
            admin_port: 9090,
            ..Default::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroShutdownTimeout,
                ValidationError::PortConflict {
                    first: "grpc",
                    second: "admin",
                    port: 9090
                },
            ]
        );
    }

    #[test]
    fn max_port_has_no_grpc_neighbour() {
        let config = ServiceConfig {
            port: u16::MAX,
            ..Default::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoGrpcPort(u16::MAX)]);
    }

    #[test]
    fn ephemeral_ports_may_repeat() {
        let config = ServiceConfig {
            port: 0,
            admin_port: 0,
            ..Default::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
