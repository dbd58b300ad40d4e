//! Build metadata.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Commit the binary was built from, from `PIKCEL_COMMIT_SHA` at build time.
pub const COMMIT_SHA: &str = match option_env!("PIKCEL_COMMIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

pub const TARGET_OS: &str = std::env::consts::OS;
pub const TARGET_ARCH: &str = std::env::consts::ARCH;
