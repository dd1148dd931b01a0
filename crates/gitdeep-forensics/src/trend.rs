//! Commit-cadence decay.
//!
//! Buckets recent commits into calendar months and compares the mean monthly
//! volume of the later half of the series against the earlier half.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use gitdeep_core::CommitMeta;
use serde::{Deserialize, Serialize};

use crate::mining::parse_timestamp;

/// Decay score when the later half averages under half the earlier volume.
pub const HIGH_DECAY: f64 = 0.8;
/// Decay score when the later half averages between 50% and 80%.
pub const MODERATE_DECAY: f64 = 0.5;

/// Cadence decay of a commit series.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::trend::ActivityDecay;
///
/// let decay = ActivityDecay::no_activity();
/// assert_eq!(decay.decay_score, 1.0);
/// assert!(decay.is_stagnant);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDecay {
    /// 0.0 (steady), 0.5 (moderate decay), 0.8 (high decay) or 1.0 (no commits).
    pub decay_score: f64,
    /// `decay_score >= 0.8`.
    pub is_stagnant: bool,
    /// Second-half mean over first-half mean, when both halves exist.
    pub decay_ratio: Option<f64>,
    /// Mean commits per month over the earlier half.
    pub first_half_mean: f64,
    /// Mean commits per month over the later half.
    pub second_half_mean: f64,
    /// Commits per `YYYY-MM` month, chronologically ordered.
    pub activity_trend: BTreeMap<String, usize>,
}

impl ActivityDecay {
    /// No commits at all: treated as fully stagnant.
    pub fn no_activity() -> Self {
        Self {
            decay_score: 1.0,
            is_stagnant: true,
            decay_ratio: None,
            first_half_mean: 0.0,
            second_half_mean: 0.0,
            activity_trend: BTreeMap::new(),
        }
    }

    /// Fewer than two distinct months: not enough data to call a trend.
    pub fn insufficient_data() -> Self {
        Self {
            decay_score: 0.0,
            is_stagnant: false,
            ..Self::no_activity()
        }
    }
}

/// Compute the cadence decay of a recent-commit list.
///
/// Input order does not matter. Records with a missing or unparsable date
/// are ignored.
///
/// # Examples
///
/// ```
/// use gitdeep_core::CommitMeta;
/// use gitdeep_forensics::trend::analyze_trend;
///
/// let dates = ["2024-01-03T10:00:00Z", "2024-01-20T10:00:00Z", "2024-02-11T10:00:00Z"];
/// let commits: Vec<CommitMeta> = dates
///     .iter()
///     .map(|d| CommitMeta {
///         sha: d.to_string(),
///         message: String::new(),
///         author: None,
///         date: Some(d.to_string()),
///     })
///     .collect();
///
/// let decay = analyze_trend(&commits);
/// assert_eq!(decay.activity_trend["2024-01"], 2);
/// assert_eq!(decay.decay_ratio, Some(0.5));
/// assert_eq!(decay.decay_score, 0.5);
/// ```
pub fn analyze_trend(commits: &[CommitMeta]) -> ActivityDecay {
    if commits.is_empty() {
        return ActivityDecay::no_activity();
    }

    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for commit in commits {
        let Some(ts) = commit.date.as_deref().and_then(parse_timestamp) else {
            tracing::trace!(sha = %commit.sha, "commit without a usable date");
            continue;
        };
        *months
            .entry(format!("{:04}-{:02}", ts.year(), ts.month()))
            .or_default() += 1;
    }

    if months.len() < 2 {
        tracing::debug!(months = months.len(), "too few months for a trend");
        return ActivityDecay::insufficient_data();
    }

    let counts: Vec<usize> = months.values().copied().collect();
    let (decay_score, decay_ratio, first_half_mean, second_half_mean) = decay_of(&counts);

    ActivityDecay {
        decay_score,
        is_stagnant: decay_score >= HIGH_DECAY,
        decay_ratio,
        first_half_mean,
        second_half_mean,
        activity_trend: months,
    }
}

/// Score a chronological series of monthly counts (at least two entries).
fn decay_of(counts: &[usize]) -> (f64, Option<f64>, f64, f64) {
    let mid = counts.len() / 2;
    let first = mean(&counts[..mid]);
    let second = mean(&counts[mid..]);

    if first <= 0.0 {
        return (0.0, None, first, second);
    }

    let ratio = second / first;
    let score = if ratio < 0.5 {
        HIGH_DECAY
    } else if ratio < 0.8 {
        MODERATE_DECAY
    } else {
        0.0
    };
    (score, Some(ratio), first, second)
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

impl ActivityDecay {
    fn verdict(&self) -> &'static str {
        if self.activity_trend.is_empty() && self.is_stagnant {
            "no commits"
        } else if self.activity_trend.is_empty() {
            "not enough history"
        } else if self.decay_score >= HIGH_DECAY {
            "high decay"
        } else if self.decay_score >= MODERATE_DECAY {
            "moderate decay"
        } else {
            "steady"
        }
    }

    /// Render as a markdown section.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Activity Trend\n\n");
        out.push_str(&format!(
            "**Decay score:** {:.1} ({})\n\n",
            self.decay_score,
            self.verdict()
        ));
        if !self.activity_trend.is_empty() {
            out.push_str("| Month | Commits |\n");
            out.push_str("|-------|---------|\n");
            for (month, count) in &self.activity_trend {
                out.push_str(&format!("| {month} | {count} |\n"));
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ActivityDecay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Activity Trend")?;
        writeln!(f, "==============")?;
        writeln!(f, "Decay score: {:.1} ({})", self.decay_score, self.verdict())?;
        if let Some(ratio) = self.decay_ratio {
            writeln!(
                f,
                "Monthly mean: {:.1} -> {:.1} (ratio {:.2})",
                self.first_half_mean, self.second_half_mean, ratio
            )?;
        }
        if !self.activity_trend.is_empty() {
            writeln!(f)?;
            for (month, count) in &self.activity_trend {
                writeln!(f, "{month}  {count:>5}")?;
            }
        }
        Ok(())
    }
}
