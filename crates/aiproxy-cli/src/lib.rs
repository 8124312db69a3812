//! Command-line interface for aiproxy.
//!
//! `aiproxy serve` runs the websocket proxy; `aiproxy config` prints the
//! configuration the server would use. Flags override environment
//! variables, which may also come from a `.env` file.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by main.rs binary
use anyhow as _;
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;

// Re-export primary types for convenient access
pub use bootstrap::{init_logging, server_config, validated_server_config};
pub use commands::{Commands, ServerArgs};
pub use error::CliError;
pub use parser::Cli;
