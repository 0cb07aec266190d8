//! CLI module - command implementations for `fcraft`

pub mod commands;
