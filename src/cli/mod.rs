//! CLI layer for recap-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! summarizing and segmenting transcripts and inspecting configuration.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ConfigArgs};
