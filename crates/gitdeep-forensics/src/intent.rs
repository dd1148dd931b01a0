//! Commit-intent analysis.
//!
//! Sorts recent commit messages into feature, fix, chore, docs and other
//! work by keyword, and derives how much of the effort goes to maintenance.

use std::fmt;
use std::sync::OnceLock;

use gitdeep_core::CommitMeta;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Share of fix + chore commits above which a repository is maintenance-focused.
pub const MAINTENANCE_FOCUS_SHARE: f64 = 0.6;

/// What a commit set out to do, judged from its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Feature,
    Fix,
    Chore,
    Docs,
    Other,
}

impl Intent {
    /// Human-readable category name.
    pub fn label(self) -> &'static str {
        match self {
            Intent::Feature => "Features",
            Intent::Fix => "Fixes",
            Intent::Chore => "Chores/Config",
            Intent::Docs => "Docs",
            Intent::Other => "Other",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// checked in this order; the first match wins
fn patterns() -> &'static [(Intent, Regex)] {
    static PATTERNS: OnceLock<Vec<(Intent, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (Intent::Feature, r"(?i)\b(feat|feature|add|new)\b"),
            (Intent::Fix, r"(?i)\b(fix|patch|bug|resolve)\b"),
            (Intent::Chore, r"(?i)\b(chore|config|build|ci|test)\b"),
            (Intent::Docs, r"(?i)\b(doc|docs|readme)\b"),
        ]
        .into_iter()
        .map(|(intent, pattern)| (intent, Regex::new(pattern).expect("valid intent pattern")))
        .collect()
    })
}

/// Classify one commit message.
///
/// Keywords are matched as whole words, case-insensitively. A message that
/// matches several categories takes the first of feature, fix, chore, docs.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::intent::{classify_message, Intent};
///
/// assert_eq!(classify_message("Fix crash on empty input"), Intent::Fix);
/// assert_eq!(classify_message("feat: add export"), Intent::Feature);
/// assert_eq!(classify_message("prefix handling"), Intent::Other);
/// ```
pub fn classify_message(message: &str) -> Intent {
    patterns()
        .iter()
        .find(|(_, re)| re.is_match(message))
        .map_or(Intent::Other, |(intent, _)| *intent)
}

/// Intent breakdown of a recent-commit list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitIntent {
    pub feature: usize,
    pub fix: usize,
    pub chore: usize,
    pub docs: usize,
    pub other: usize,
    /// Commits classified.
    pub total: usize,
    /// `(fix + chore) / feature`, two decimals. With no feature commits this
    /// is the raw maintenance count.
    pub tech_debt_ratio: f64,
    /// Fixes and chores make up more than 60% of all commits.
    pub maintenance_focus: bool,
}

impl CommitIntent {
    /// Count per category, in display order.
    pub fn breakdown(&self) -> [(Intent, usize); 5] {
        [
            (Intent::Feature, self.feature),
            (Intent::Fix, self.fix),
            (Intent::Chore, self.chore),
            (Intent::Docs, self.docs),
            (Intent::Other, self.other),
        ]
    }

    /// Render as a markdown section.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Commit Intent\n\n");
        out.push_str(&format!(
            "**Tech debt ratio:** {:.2}{}\n\n",
            self.tech_debt_ratio,
            if self.maintenance_focus {
                " (maintenance-focused)"
            } else {
                ""
            }
        ));
        if self.total > 0 {
            out.push_str("| Intent | Commits |\n");
            out.push_str("|--------|---------|\n");
            for (intent, count) in self.breakdown() {
                out.push_str(&format!("| {intent} | {count} |\n"));
            }
            out.push('\n');
        }
        out
    }
}

/// Classify every message and derive the maintenance signals.
///
/// # Examples
///
/// ```
/// use gitdeep_core::CommitMeta;
/// use gitdeep_forensics::intent::analyze_intent;
///
/// let commits: Vec<CommitMeta> = ["fix typo", "fix build", "add parser"]
///     .iter()
///     .enumerate()
///     .map(|(i, m)| CommitMeta {
///         sha: i.to_string(),
///         message: (*m).to_string(),
///         author: None,
///         date: None,
///     })
///     .collect();
///
/// let intent = analyze_intent(&commits);
/// assert_eq!(intent.fix, 2);
/// assert_eq!(intent.tech_debt_ratio, 2.0);
/// assert!(intent.maintenance_focus);
/// ```
pub fn analyze_intent(commits: &[CommitMeta]) -> CommitIntent {
    let mut result = CommitIntent::default();
    for commit in commits {
        match classify_message(&commit.message) {
            Intent::Feature => result.feature += 1,
            Intent::Fix => result.fix += 1,
            Intent::Chore => result.chore += 1,
            Intent::Docs => result.docs += 1,
            Intent::Other => result.other += 1,
        }
    }

    result.total = commits.len();
    if result.total == 0 {
        return result;
    }

    let maintenance = result.fix + result.chore;
    let ratio = if result.feature == 0 {
        maintenance as f64
    } else {
        maintenance as f64 / result.feature as f64
    };
    result.tech_debt_ratio = (ratio * 100.0).round() / 100.0;
    result.maintenance_focus = maintenance as f64 / result.total as f64 > MAINTENANCE_FOCUS_SHARE;
    tracing::debug!(
        total = result.total,
        maintenance,
        ratio = result.tech_debt_ratio,
        "classified commit intent"
    );
    result
}

impl fmt::Display for CommitIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commit Intent")?;
        writeln!(f, "=============")?;
        write!(f, "Tech debt ratio: {:.2}", self.tech_debt_ratio)?;
        if self.maintenance_focus {
            write!(f, " (maintenance-focused)")?;
        }
        writeln!(f)?;
        if self.total == 0 {
            return writeln!(f, "No commits.");
        }
        writeln!(f)?;
        for (intent, count) in self.breakdown() {
            writeln!(f, "{:<16} {count:>5}", intent.label())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(msgs: &[&str]) -> Vec<CommitMeta> {
        msgs.iter()
            .enumerate()
            .map(|(i, m)| CommitMeta {
                sha: format!("sha{i}"),
                message: (*m).to_string(),
                author: Some("dev".into()),
                date: None,
            })
            .collect()
    }

    #[test]
    fn keywords_match_whole_words_only() {
        assert_eq!(classify_message("Update README"), Intent::Docs);
        assert_eq!(classify_message("addition of tests"), Intent::Other);
        assert_eq!(classify_message("prefix rename"), Intent::Other);
        assert_eq!(classify_message("CI: bump runner"), Intent::Chore);
        assert_eq!(classify_message("resolve merge conflict"), Intent::Fix);
    }

    #[test]
    fn feature_takes_precedence() {
        // matches feature, fix and docs keywords
        assert_eq!(classify_message("add docs for bug report"), Intent::Feature);
        assert_eq!(classify_message("fix test flake"), Intent::Fix);
        assert_eq!(classify_message("test the docs"), Intent::Chore);
    }

    #[test]
    fn empty_input_has_no_signal() {
        let intent = analyze_intent(&[]);
        assert_eq!(intent, CommitIntent::default());
        assert!(!intent.maintenance_focus);
    }

    #[test]
    fn ratio_is_maintenance_over_features() {
        let intent = analyze_intent(&messages(&[
            "feat: search",
            "new page",
            "add api",
            "fix leak",
            "chore: deps",
            "docs: usage",
        ]));
        assert_eq!(intent.feature, 3);
        assert_eq!(intent.docs, 1);
        assert_eq!(intent.tech_debt_ratio, 0.67);
        assert!(!intent.maintenance_focus);
    }

    #[test]
    fn without_features_ratio_is_raw_count() {
        let intent = analyze_intent(&messages(&["fix a", "fix b", "bump version"]));
        assert_eq!(intent.tech_debt_ratio, 2.0);
        assert_eq!(intent.other, 1);
        // 2 of 3 is above 60%
        assert!(intent.maintenance_focus);
    }

    #[test]
    fn exactly_sixty_percent_is_not_focus() {
        let intent = analyze_intent(&messages(&["fix", "fix", "ci", "add", "misc"]));
        assert!(!intent.maintenance_focus);
    }

    #[test]
    fn serializes_lowercase_intents() {
        assert_eq!(serde_json::to_string(&Intent::Docs).unwrap(), "\"docs\"");
        let json = serde_json::to_value(analyze_intent(&messages(&["fix"]))).unwrap();
        assert_eq!(json["techDebtRatio"], 1.0);
        assert_eq!(json["maintenanceFocus"], true);
    }

    #[test]
    fn renders_breakdown() {
        let intent = analyze_intent(&messages(&["fix a", "add b"]));
        assert!(intent.to_string().contains("Chores/Config"));
        assert!(intent.to_markdown().contains("| Fixes | 1 |"));
        assert!(CommitIntent::default().to_string().contains("No commits."));
    }
}
