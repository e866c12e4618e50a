//! Command-line front end for splitpaste.

pub mod commands;
pub mod config;
pub mod logging;
