//! Core types, configuration, and error handling for gitdeep.
//!
//! This crate provides the shared foundation used by the other gitdeep crates:
//! - [`GitdeepError`]: error enum shared by every crate, with `miette` diagnostic codes
//! - [`GitdeepConfig`]: `[mining]`, `[forensics]` and `[duplication]` settings from `.gitdeep.toml`
//! - Shared types: [`CommitMeta`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    DuplicationConfig, ForensicsConfig, GitdeepConfig, MiningConfig, DUPLICATION_EXTENSIONS,
    PROD_EXTENSIONS, SKIPPED_DIRS,
};
pub use error::GitdeepError;
pub use types::{CommitMeta, OutputFormat};

/// A convenience `Result` type for gitdeep operations.
pub type Result<T> = std::result::Result<T, GitdeepError>;
