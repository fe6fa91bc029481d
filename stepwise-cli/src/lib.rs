//! Stepwise CLI - Command-line interface for stepwise migrations.
//!
//! This crate provides the `stepwise` binary: it migrates a SQLite database
//! up or down to a target version and reports the status of every migration
//! file against the database ledger.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
