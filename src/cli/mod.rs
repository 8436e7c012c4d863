//! Command-line interface: argument parsing and per-subcommand dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
