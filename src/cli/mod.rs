//! Command-line interface for topic-forge.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, GenerateArgs};
