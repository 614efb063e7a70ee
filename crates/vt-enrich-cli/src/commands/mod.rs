//! CLI commands

pub mod banner;
pub mod enrich;
