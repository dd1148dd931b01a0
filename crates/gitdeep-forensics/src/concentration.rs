//! Contributor concentration (bus factor) analysis.
//!
//! Ranks authors of the recent-commit metadata by commit count and finds the
//! smallest group of top contributors that together made more than half of
//! all attributed commits.

use std::collections::HashMap;
use std::fmt;

use gitdeep_core::CommitMeta;
use serde::{Deserialize, Serialize};

/// Commit share of one contributor.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::concentration::ContributorShare;
///
/// let share = ContributorShare {
///     author: "alice".into(),
///     commit_count: 30,
///     ownership_pct: 60.0,
/// };
/// assert!(share.ownership_pct > 50.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorShare {
    /// Author name or login.
    pub author: String,
    /// Commits attributed to this author.
    pub commit_count: usize,
    /// `commit_count / total * 100`, unrounded.
    pub ownership_pct: f64,
}

/// Result of the concentration analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFactor {
    /// Number of top contributors whose combined share exceeds 50%.
    pub bus_factor: usize,
    /// Distinct authors in the input.
    pub total_contributors: usize,
    /// The contributors counted into the bus factor, highest share first.
    pub top_contributors: Vec<ContributorShare>,
}

/// Compute the bus factor of a recent-commit list.
///
/// Authors are ranked by commit count, ties broken by ascending name, and
/// accumulated until their cumulative count exceeds half of all commits.
/// Records without an author are ignored; if none has one the result is
/// empty with a bus factor of 0.
///
/// # Examples
///
/// ```
/// use gitdeep_core::CommitMeta;
/// use gitdeep_forensics::concentration::analyze_concentration;
///
/// let commits: Vec<CommitMeta> = ["alice", "alice", "alice", "bob"]
///     .iter()
///     .enumerate()
///     .map(|(i, a)| CommitMeta {
///         sha: i.to_string(),
///         message: String::new(),
///         author: Some((*a).to_string()),
///         date: None,
///     })
///     .collect();
///
/// let result = analyze_concentration(&commits);
/// assert_eq!(result.bus_factor, 1);
/// assert_eq!(result.total_contributors, 2);
/// assert_eq!(result.top_contributors[0].author, "alice");
/// ```
pub fn analyze_concentration(commits: &[CommitMeta]) -> BusFactor {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for commit in commits {
        match commit.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => *counts.entry(author).or_default() += 1,
            _ => tracing::trace!(sha = %commit.sha, "commit without author"),
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        tracing::debug!(commits = commits.len(), "no attributed commits");
        return BusFactor::default();
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total_contributors = ranked.len();
    let mut top_contributors = Vec::new();
    let mut cumulative = 0usize;

    for (author, count) in ranked {
        cumulative += count;
        top_contributors.push(ContributorShare {
            author: author.to_string(),
            commit_count: count,
            ownership_pct: count as f64 / total as f64 * 100.0,
        });
        // integer form of cumulative / total > 0.5
        if cumulative * 2 > total {
            break;
        }
    }

    BusFactor {
        bus_factor: top_contributors.len(),
        total_contributors,
        top_contributors,
    }
}

impl fmt::Display for BusFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contributor Concentration")?;
        writeln!(f, "=========================")?;
        writeln!(
            f,
            "Bus factor: {} of {} contributors\n",
            self.bus_factor, self.total_contributors
        )?;

        if self.top_contributors.is_empty() {
            return writeln!(f, "No attributed commits.");
        }

        writeln!(f, "{:<40} {:>8} {:>8}", "Author", "Commits", "Share")?;
        writeln!(f, "{}", "-".repeat(58))?;
        for c in &self.top_contributors {
            writeln!(
                f,
                "{:<40} {:>8} {:>7.1}%",
                c.author, c.commit_count, c.ownership_pct
            )?;
        }
        Ok(())
    }
}

impl BusFactor {
    /// Render as a markdown section.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Contributor Concentration\n\n");
        out.push_str(&format!(
            "**Bus factor:** {} of {} contributors\n\n",
            self.bus_factor, self.total_contributors
        ));
        if !self.top_contributors.is_empty() {
            out.push_str("| Author | Commits | Share |\n");
            out.push_str("|--------|---------|-------|\n");
            for c in &self.top_contributors {
                out.push_str(&format!(
                    "| {} | {} | {:.1}% |\n",
                    c.author, c.commit_count, c.ownership_pct
                ));
            }
            out.push('\n');
        }
        out
    }
}
