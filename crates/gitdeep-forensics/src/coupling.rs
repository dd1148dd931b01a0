//! Temporal coupling detection.
//!
//! Counts how often two files change in the same commit. Pairs are keyed
//! canonically (lexicographically smaller path first) so a pair is never
//! counted in both directions.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::mining::CommitRecord;

/// A pair of files that changed together in at least `co_commits` commits.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::coupling::CoupledPair;
///
/// let pair = CoupledPair {
///     file1: "src/auth.rs".into(),
///     file2: "src/session.rs".into(),
///     co_commits: 7,
/// };
/// assert!(pair.file1 < pair.file2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupledPair {
    /// Lexicographically smaller path.
    pub file1: String,
    /// Lexicographically larger path.
    pub file2: String,
    /// Commits touching both files.
    pub co_commits: u32,
}

/// Co-change counter fed one commit at a time.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::coupling::CoChangeCounter;
/// use gitdeep_forensics::mining::parse_log;
///
/// let log = "^CF^c|2024-01-03T00:00:00Z|a\n1\t0\tb.rs\n1\t0\ta.rs\n\
///            ^CF^b|2024-01-02T00:00:00Z|a\n1\t0\ta.rs\n1\t0\tb.rs\n";
/// let mut counter = CoChangeCounter::default();
/// for commit in parse_log(log).chronological() {
///     counter.record(commit);
/// }
/// assert_eq!(counter.count("b.rs", "a.rs"), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoChangeCounter {
    pairs: HashMap<(String, String), u32>,
}

impl CoChangeCounter {
    /// Count every unordered pair of distinct files touched by `commit`.
    /// A path repeated within the commit counts once.
    pub fn record(&mut self, commit: &CommitRecord) {
        let mut seen = HashSet::new();
        let unique_files: Vec<&str> = commit
            .files
            .iter()
            .map(|f| f.path.as_str())
            .filter(|p| seen.insert(*p))
            .collect();

        for i in 0..unique_files.len() {
            for j in (i + 1)..unique_files.len() {
                let key = normalize_pair(unique_files[i], unique_files[j]);
                *self.pairs.entry(key).or_default() += 1;
            }
        }
    }

    /// Co-change count of two paths, in either order.
    pub fn count(&self, a: &str, b: &str) -> u32 {
        self.pairs.get(&normalize_pair(a, b)).copied().unwrap_or(0)
    }

    /// Number of distinct pairs seen so far.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `limit` most coupled pairs with at least `min_co_commits` shared
    /// commits, by count descending then by pair ascending.
    pub fn top(&self, min_co_commits: u32, limit: usize) -> Vec<CoupledPair> {
        let mut pairs: Vec<CoupledPair> = self
            .pairs
            .iter()
            .filter(|(_, count)| **count >= min_co_commits)
            .map(|((file1, file2), count)| CoupledPair {
                file1: file1.clone(),
                file2: file2.clone(),
                co_commits: *count,
            })
            .collect();

        pairs.sort_by(|a, b| {
            b.co_commits
                .cmp(&a.co_commits)
                .then_with(|| a.file1.cmp(&b.file1))
                .then_with(|| a.file2.cmp(&b.file2))
        });
        pairs.truncate(limit);
        pairs
    }
}

fn normalize_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
