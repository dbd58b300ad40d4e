//! pikcel service binary.
//!
//! Thin entry point: parse the command line and hand off to `pikcel::cli`.

use clap::Parser;

use pikcel::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Cli::parse().run().await
}
