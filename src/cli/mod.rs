//! CLI module
//!
//! Command-line interface for fetching retail prices.
//!
//! # Commands
//!
//! - `fetch` - Fetch every page and optionally write Parquet
//! - `schema` - Print the active column schema

mod commands;
mod runner;

pub use commands::{Cli, Commands, FetchArgs, OutputFormat};
pub use runner::{
    exit_code, Runner, EXIT_FAILURE, EXIT_PARTIAL, EXIT_PERSISTENCE, EXIT_SUCCESS,
};
