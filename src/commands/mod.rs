//! CLI subcommands

pub mod graph;
pub mod init;
pub mod search;
