//! Software-health forensics over version-control history.
//!
//! Turns mined commit history into quantitative health signals:
//! - [`mining`]: textual `git log --numstat` miner and the ordered [`mining::History`]
//! - [`repository`] / [`mirror`]: history from a local repository or a temporary clone
//! - [`concentration`]: contributor concentration (bus factor)
//! - [`trend`]: commit-cadence decay
//! - [`intent`]: feature vs maintenance work in commit messages
//! - [`forensics`]: per-file rhythm, ownership and coupling classification
//! - [`duplication`]: pairwise line-token similarity over a source tree
//! - [`report`]: the combined health report

pub mod concentration;
pub mod coupling;
pub mod duplication;
pub mod forensics;
pub mod intent;
pub mod mining;
pub mod mirror;
pub mod report;
pub mod repository;
pub mod trend;
