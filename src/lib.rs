//! Filetrack library crate
//!
//! Periodic file-change detector: walks configured folder trees, fingerprints
//! files on (name, mtime), and tracks observations in a SQLite state store so
//! each run reports only what is new or modified. Not a live FS-event watcher.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod fingerprint;
pub mod output;
pub mod report;
pub mod runner;
pub mod scanner;
pub mod store;
