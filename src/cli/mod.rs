//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Verify the credential
//! - `discover` - Print the stream catalog
//! - `read` - Extract records from streams

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{catalog_message, record_message, schema_message, select_streams, Runner};
