//! Combined health report.
//!
//! Bundles the independent analyses into one serializable value.
//! Each analysis runs on its own input; none sees another's output.

use std::fmt;
use std::path::Path;

use gitdeep_core::{CommitMeta, GitdeepConfig};
use serde::{Deserialize, Serialize};

use crate::concentration::{analyze_concentration, BusFactor};
use crate::duplication::{detect_duplication, DuplicationReport};
use crate::forensics::{analyze_files, FileForensics};
use crate::intent::{analyze_intent, CommitIntent};
use crate::mining::History;
use crate::mirror::LocalMirror;
use crate::trend::{analyze_trend, ActivityDecay};

/// All health signals of one repository.
///
/// # Examples
///
/// ```
/// use gitdeep_core::GitdeepConfig;
/// use gitdeep_forensics::mining::History;
/// use gitdeep_forensics::report::build_report;
///
/// let report = build_report(&[], &History::empty(), None, &GitdeepConfig::default());
/// assert_eq!(report.bus_factor.bus_factor, 0);
/// assert!(report.decay.is_stagnant);
/// assert!(report.duplication.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub bus_factor: BusFactor,
    pub decay: ActivityDecay,
    pub intent: CommitIntent,
    pub file_forensics: FileForensics,
    /// `None` when no working tree was available to scan.
    pub duplication: Option<DuplicationReport>,
}

/// Run every analysis.
///
/// `recent` feeds the contributor, trend and intent analyzers, `history` the file
/// forensics engine, and `tree` (when present) the duplication detector.
/// A duplication scan that fails is logged and reported as `None`.
pub fn build_report(
    recent: &[CommitMeta],
    history: &History,
    tree: Option<&Path>,
    config: &GitdeepConfig,
) -> HealthReport {
    let duplication = tree.and_then(|root| {
        match detect_duplication(root, &config.duplication, &[]) {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "duplication scan failed");
                None
            }
        }
    });

    HealthReport {
        bus_factor: analyze_concentration(recent),
        decay: analyze_trend(recent),
        intent: analyze_intent(recent),
        file_forensics: analyze_files(history, &config.forensics),
        duplication,
    }
}

/// Analyze a local working copy.
///
/// Without platform metadata, the contributor and trend analyzers see the
/// `recent_commit_limit` most recent mined commits.
pub fn report_for_history(
    history: &History,
    recent: Option<&[CommitMeta]>,
    tree: Option<&Path>,
    config: &GitdeepConfig,
) -> HealthReport {
    match recent {
        Some(recent) => build_report(recent, history, tree, config),
        None => {
            let derived = history.recent_metadata(config.mining.recent_commit_limit);
            build_report(&derived, history, tree, config)
        }
    }
}

/// Clone `url`, analyze it, and remove the clone.
///
/// If the clone cannot be acquired the report is built from no local data:
/// an empty history and no duplication scan.
pub async fn report_for_remote(
    url: &str,
    recent: Option<&[CommitMeta]>,
    config: &GitdeepConfig,
) -> HealthReport {
    match LocalMirror::acquire(url, &config.mining).await {
        Ok(mirror) => {
            let history = mirror.history().await;
            report_for_history(&history, recent, Some(mirror.path()), config)
        }
        Err(err) => {
            tracing::warn!(url, error = %err, "mirror acquisition failed");
            report_for_history(&History::empty(), recent, None, config)
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.bus_factor)?;
        writeln!(f, "{}", self.decay)?;
        writeln!(f, "{}", self.intent)?;
        writeln!(f, "{}", self.file_forensics)?;
        match &self.duplication {
            Some(duplication) => write!(f, "{duplication}"),
            None => writeln!(f, "Duplication: no working tree scanned."),
        }
    }
}

impl HealthReport {
    /// Render the whole report as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitdeep_core::GitdeepConfig;
    /// use gitdeep_forensics::mining::History;
    /// use gitdeep_forensics::report::build_report;
    ///
    /// let report = build_report(&[], &History::empty(), None, &GitdeepConfig::default());
    /// let md = report.to_markdown();
    /// assert!(md.starts_with("# Repository Health"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Repository Health\n\n");
        out.push_str(&self.bus_factor.to_markdown());
        out.push_str(&self.decay.to_markdown());
        out.push_str(&self.intent.to_markdown());
        out.push_str(&self.file_forensics.to_markdown());
        match &self.duplication {
            Some(duplication) => out.push_str(&duplication.to_markdown()),
            None => out.push_str("## Duplication\n\nNo working tree scanned.\n"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::parse_log;

    const LOG: &str = "\
^CF^c3|2024-03-20T10:00:00Z|alice
4\t1\tsrc/app.py
^CF^c2|2024-02-10T10:00:00Z|bob
4\t1\tsrc/app.py
^CF^c1|2024-01-05T10:00:00Z|alice
80\t0\tsrc/app.py
";

    #[test]
    fn derives_recent_metadata_from_history() {
        let history = parse_log(LOG);
        let report = report_for_history(&history, None, None, &GitdeepConfig::default());
        assert_eq!(report.bus_factor.total_contributors, 2);
        assert_eq!(report.bus_factor.top_contributors[0].author, "alice");
        assert_eq!(report.decay.activity_trend.len(), 3);
        assert_eq!(report.file_forensics.total_files_tracked, 1);
    }

    #[test]
    fn explicit_metadata_wins() {
        let history = parse_log(LOG);
        let recent = vec![CommitMeta {
            sha: "x".into(),
            message: "only".into(),
            author: Some("carol".into()),
            date: Some("2024-05-01T00:00:00Z".into()),
        }];
        let report = report_for_history(&history, Some(recent.as_slice()), None, &GitdeepConfig::default());
        assert_eq!(report.bus_factor.top_contributors[0].author, "carol");
        assert_eq!(report.intent.total, 1);
        assert_eq!(report.intent.other, 1);
        // one month is not a trend
        assert_eq!(report.decay.decay_score, 0.0);
    }

    #[test]
    fn failed_scan_is_reported_as_none() {
        let report = build_report(
            &[],
            &History::empty(),
            Some(Path::new("/definitely/not/here")),
            &GitdeepConfig::default(),
        );
        assert!(report.duplication.is_none());
    }

    #[test]
    fn serializes_nested_camel_case() {
        let report = report_for_history(&parse_log(LOG), None, None, &GitdeepConfig::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["busFactor"]["topContributors"].is_array());
        assert!(json["decay"]["activityTrend"].is_object());
        assert_eq!(json["intent"]["total"], 3);
        assert_eq!(json["fileForensics"]["totalFilesTracked"], 1);
        assert!(json["duplication"].is_null());
    }

    #[tokio::test]
    async fn unreachable_remote_has_no_local_data() {
        let config = GitdeepConfig::default();
        let report = report_for_remote("/definitely/not/a/repository", None, &config).await;
        assert_eq!(report.file_forensics.total_files_tracked, 0);
        assert!(report.duplication.is_none());
        assert!(report.decay.is_stagnant);
    }
}
