//! CLI module graph.

pub mod account;
pub mod command;
pub mod market;
pub mod output;
pub mod paths;
pub mod run;
pub mod settings;
