//! Command-line interface.
//!
//! ```text
//! pikcel [--debug] server [--port 8080] [--admin-port 9090] ...
//! pikcel version
//! ```
//!
//! Every server flag has an environment variable override.

pub mod server;
pub mod version;

use std::error::Error;

use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};

pub use server::ServerCmd;

#[derive(Debug, Parser)]
#[command(name = "pikcel")]
#[command(version = crate::version::VERSION)]
#[command(about = "Canvas service with HTTP, gRPC and admin servers", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct Globals {
    /// Enable verbose logging
    #[arg(long, global = true, env = "DEBUG", value_parser = BoolishValueParser::new())]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP, gRPC and admin servers
    Server(ServerCmd),
    /// Print build information
    Version,
}

impl Cli {
    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        match self.command {
            Command::Server(cmd) => cmd.run(&self.globals).await,
            Command::Version => {
                println!("{}", version::render());
                Ok(())
            }
        }
    }
}
