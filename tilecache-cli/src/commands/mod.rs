//! CLI subcommands.

pub mod cache;
pub mod common;
pub mod init;
pub mod plan;
pub mod preload;
pub mod serve;
