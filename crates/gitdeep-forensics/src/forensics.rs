//! File Forensics Engine.
//!
//! Folds the full commit history, oldest first, into one profile per file
//! and classifies files by churn, rhythm, ownership and growth. Every ranked
//! list is produced by a stable sort over files pre-ordered by path, so the
//! result does not depend on the order equal-ranked files were encountered.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};
use gitdeep_core::ForensicsConfig;
use serde::{Deserialize, Serialize};

use crate::coupling::{CoChangeCounter, CoupledPair};
use crate::mining::{CommitRecord, History, UNKNOWN_AUTHOR};

/// Classification label attached to a file.
///
/// Serializes to its display label.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::forensics::Tag;
///
/// assert_eq!(Tag::SingleOwnerRisk.to_string(), "Single-Owner Risk");
/// assert_eq!(serde_json::to_string(&Tag::BugProne).unwrap(), "\"Bug-Prone\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    #[serde(rename = "Hotspot")]
    Hotspot,
    #[serde(rename = "Bug-Prone")]
    BugProne,
    #[serde(rename = "Legacy")]
    Legacy,
    #[serde(rename = "Single-Owner Risk")]
    SingleOwnerRisk,
    #[serde(rename = "Bloated")]
    Bloated,
    #[serde(rename = "Night Owl")]
    NightOwl,
    #[serde(rename = "Weekend Warrior")]
    WeekendWarrior,
    #[serde(rename = "Test File")]
    TestFile,
    #[serde(rename = "Prod File")]
    ProdFile,
    #[serde(rename = "Healthy")]
    Healthy,
}

impl Tag {
    pub fn label(self) -> &'static str {
        match self {
            Tag::Hotspot => "Hotspot",
            Tag::BugProne => "Bug-Prone",
            Tag::Legacy => "Legacy",
            Tag::SingleOwnerRisk => "Single-Owner Risk",
            Tag::Bloated => "Bloated",
            Tag::NightOwl => "Night Owl",
            Tag::WeekendWarrior => "Weekend Warrior",
            Tag::TestFile => "Test File",
            Tag::ProdFile => "Prod File",
            Tag::Healthy => "Healthy",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Derived health metrics of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    /// File path relative to the repository root.
    pub path: String,
    /// Added plus deleted lines over the whole history.
    pub changes: u64,
    pub added: u64,
    pub deleted: u64,
    /// `added - deleted`.
    pub net_growth: i64,
    /// Commits touching the file.
    pub commit_count: u32,
    pub first_seen: DateTime<FixedOffset>,
    pub last_seen: DateTime<FixedOffset>,
    /// Whole days between first and last change.
    pub age_days: i64,
    /// `age_days / commit_count`, or -1 for files changed only once.
    pub frequency_days: f64,
    /// Author with the largest change volume; `"Unknown"` if the volume is 0.
    pub primary_owner: String,
    /// Primary owner's share of the change volume, 0-100.
    pub ownership_pct: f64,
    /// Share of commits made on Saturday or Sunday, 0-100.
    pub weekend_pct: f64,
    /// Share of commits made before 06:00 or after 20:59, 0-100.
    pub night_pct: f64,
    pub is_test: bool,
    pub is_prod: bool,
}

/// Everything the engine derives from one history.
///
/// # Examples
///
/// ```
/// use gitdeep_core::ForensicsConfig;
/// use gitdeep_forensics::forensics::analyze_files;
/// use gitdeep_forensics::mining::History;
///
/// let result = analyze_files(&History::empty(), &ForensicsConfig::default());
/// assert_eq!(result.total_files_tracked, 0);
/// assert!(result.hotspots.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileForensics {
    /// Per-file table for every tracked file, by path.
    pub files: Vec<FileMetrics>,
    /// Tags of every file that received at least one.
    pub tags: BTreeMap<String, Vec<Tag>>,
    pub hotspots: Vec<FileMetrics>,
    pub bug_prone: Vec<FileMetrics>,
    pub legacy_candidates: Vec<FileMetrics>,
    pub ownership_risks: Vec<FileMetrics>,
    pub inflation_risks: Vec<FileMetrics>,
    pub night_owls: Vec<FileMetrics>,
    pub weekend_warriors: Vec<FileMetrics>,
    pub test_files: Vec<FileMetrics>,
    pub prod_files: Vec<FileMetrics>,
    /// Production files with no other tag.
    pub healthy: Vec<FileMetrics>,
    pub top_coupled: Vec<CoupledPair>,
    /// Distinct paths seen in the history.
    pub total_files_tracked: usize,
}

impl FileForensics {
    /// Tags of `path`, empty if it has none.
    pub fn tags_of(&self, path: &str) -> &[Tag] {
        self.tags.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ranked lists with their headings, in classification order.
    pub fn sections(&self) -> [(&'static str, &[FileMetrics]); 10] {
        [
            ("Hotspots", self.hotspots.as_slice()),
            ("Bug-prone", self.bug_prone.as_slice()),
            ("Legacy candidates", self.legacy_candidates.as_slice()),
            ("Single-owner risks", self.ownership_risks.as_slice()),
            ("Bloated", self.inflation_risks.as_slice()),
            ("Night owls", self.night_owls.as_slice()),
            ("Weekend warriors", self.weekend_warriors.as_slice()),
            ("Test files", self.test_files.as_slice()),
            ("Prod files", self.prod_files.as_slice()),
            ("Healthy", self.healthy.as_slice()),
        ]
    }

    /// Render as a markdown section.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## File Forensics\n\n");
        out.push_str(&format!(
            "**Files tracked:** {}\n\n",
            self.total_files_tracked
        ));

        for (title, files) in self.sections() {
            if files.is_empty() {
                continue;
            }
            out.push_str(&format!("### {title}\n\n"));
            out.push_str("| File | Commits | Changes | Net | Owner | Owner % |\n");
            out.push_str("|------|---------|---------|-----|-------|---------|\n");
            for m in files {
                out.push_str(&format!(
                    "| {} | {} | {} | {:+} | {} | {:.1}% |\n",
                    m.path, m.commit_count, m.changes, m.net_growth, m.primary_owner, m.ownership_pct
                ));
            }
            out.push('\n');
        }

        if !self.top_coupled.is_empty() {
            out.push_str("### Coupled files\n\n");
            out.push_str("| File | File | Shared commits |\n");
            out.push_str("|------|------|----------------|\n");
            for pair in &self.top_coupled {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    pair.file1, pair.file2, pair.co_commits
                ));
            }
            out.push('\n');
        }
        out
    }
}

/// Running per-file accumulator.
struct FileProfile {
    first_seen: DateTime<FixedOffset>,
    last_seen: DateTime<FixedOffset>,
    added: u64,
    deleted: u64,
    changes: u64,
    commit_count: u32,
    /// Change volume per author, in order of first touch.
    authors: Vec<(String, u64)>,
    weekend_commits: u32,
    night_commits: u32,
    is_test: bool,
    is_prod: bool,
}

impl FileProfile {
    fn new(path: &str, at: DateTime<FixedOffset>, prod_extensions: &[String]) -> Self {
        let (is_test, is_prod) = classify_path(path, prod_extensions);
        Self {
            first_seen: at,
            last_seen: at,
            added: 0,
            deleted: 0,
            changes: 0,
            commit_count: 0,
            authors: Vec::new(),
            weekend_commits: 0,
            night_commits: 0,
            is_test,
            is_prod,
        }
    }

    fn add_volume(&mut self, author: &str, volume: u64) {
        match self.authors.iter_mut().find(|(name, _)| name == author) {
            Some((_, total)) => *total += volume,
            None => self.authors.push((author.to_string(), volume)),
        }
    }

    fn into_metrics(self, path: String) -> FileMetrics {
        let age_days = (self.last_seen - self.first_seen).num_days();
        let frequency_days = if self.commit_count > 1 {
            age_days as f64 / f64::from(self.commit_count)
        } else {
            -1.0
        };

        let total_volume: u64 = self.authors.iter().map(|(_, v)| v).sum();
        let (primary_owner, ownership_pct) = if total_volume > 0 {
            let mut best: Option<&(String, u64)> = None;
            for entry in &self.authors {
                // strictly greater: the earliest author keeps a tie
                if best.map_or(true, |b| entry.1 > b.1) {
                    best = Some(entry);
                }
            }
            match best {
                Some((name, volume)) => (
                    name.clone(),
                    *volume as f64 / total_volume as f64 * 100.0,
                ),
                None => (UNKNOWN_AUTHOR.to_string(), 0.0),
            }
        } else {
            (UNKNOWN_AUTHOR.to_string(), 0.0)
        };

        let commits = f64::from(self.commit_count.max(1));

        FileMetrics {
            path,
            changes: self.changes,
            added: self.added,
            deleted: self.deleted,
            net_growth: self.added as i64 - self.deleted as i64,
            commit_count: self.commit_count,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            age_days,
            frequency_days,
            primary_owner,
            ownership_pct,
            weekend_pct: f64::from(self.weekend_commits) / commits * 100.0,
            night_pct: f64::from(self.night_commits) / commits * 100.0,
            is_test: self.is_test,
            is_prod: self.is_prod,
        }
    }
}

/// `(is_test, is_prod)` for a path. Test classification wins.
fn classify_path(path: &str, prod_extensions: &[String]) -> (bool, bool) {
    let lower = path.to_lowercase();
    if lower.contains("test") || lower.contains("spec") {
        return (true, false);
    }
    let is_prod = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| prod_extensions.iter().any(|p| p == ext));
    (false, is_prod)
}

fn is_weekend(ts: &DateTime<FixedOffset>) -> bool {
    matches!(ts.weekday(), Weekday::Sat | Weekday::Sun)
}

fn is_night(ts: &DateTime<FixedOffset>) -> bool {
    let hour = ts.hour();
    hour < 6 || hour > 20
}

/// Run the engine over a mined history.
///
/// Commits are consumed through [`History::chronological`]. Files changed in
/// a single commit appear in the per-file table but are never classified.
///
/// # Examples
///
/// ```
/// use gitdeep_core::ForensicsConfig;
/// use gitdeep_forensics::forensics::{analyze_files, Tag};
/// use gitdeep_forensics::mining::parse_log;
///
/// let log = "^CF^b|2024-03-05T10:00:00Z|alice\n5\t5\tsrc/app.py\n\
///            ^CF^a|2024-03-04T10:00:00Z|alice\n100\t0\tsrc/app.py\n";
/// let result = analyze_files(&parse_log(log), &ForensicsConfig::default());
///
/// let app = &result.files[0];
/// assert_eq!(app.commit_count, 2);
/// assert_eq!(app.primary_owner, "alice");
/// assert!(result.tags_of("src/app.py").contains(&Tag::Hotspot));
/// ```
pub fn analyze_files(history: &History, config: &ForensicsConfig) -> FileForensics {
    if history.is_empty() {
        return FileForensics::default();
    }

    let mut profiles: HashMap<String, FileProfile> = HashMap::new();
    let mut co_changes = CoChangeCounter::default();

    for commit in history.chronological() {
        co_changes.record(commit);
        fold_commit(&mut profiles, commit, &config.prod_extensions);
    }

    let mut files: Vec<FileMetrics> = profiles
        .into_iter()
        .map(|(path, profile)| profile.into_metrics(path))
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let total_files_tracked = files.len();
    tracing::debug!(
        commits = history.len(),
        files = total_files_tracked,
        "folded file profiles"
    );

    let classifier = Classifier {
        config,
        valid: files.iter().filter(|f| f.commit_count > 1).collect(),
    };

    let hotspots = classifier.rank(
        |_| true,
        |a, b| {
            b.commit_count
                .cmp(&a.commit_count)
                .then(b.changes.cmp(&a.changes))
        },
    );
    let bug_prone = classifier.rank(
        |f| f.commit_count >= config.bug_prone_min_commits,
        |a, b| volume_per_commit(a).total_cmp(&volume_per_commit(b)),
    );
    let legacy_candidates = classifier.rank(
        |f| f.age_days > config.legacy_min_age_days,
        |a, b| a.last_seen.cmp(&b.last_seen),
    );
    let ownership_risks = classifier.rank(
        |f| {
            f.is_prod
                && f.ownership_pct >= config.owner_risk_min_pct
                && f.changes > config.owner_risk_min_changes
        },
        |a, b| b.changes.cmp(&a.changes),
    );
    let inflation_risks = classifier.rank(
        |f| {
            f.is_prod
                && f.net_growth > config.bloat_min_net_growth
                && (f.deleted as f64) < f.added as f64 * config.bloat_max_delete_ratio
        },
        |a, b| b.net_growth.cmp(&a.net_growth),
    );
    let night_owls = classifier.rank(
        |f| f.night_pct > config.rhythm_min_pct,
        |a, b| b.night_pct.total_cmp(&a.night_pct),
    );
    let weekend_warriors = classifier.rank(
        |f| f.weekend_pct > config.rhythm_min_pct,
        |a, b| b.weekend_pct.total_cmp(&a.weekend_pct),
    );
    let test_files = classifier.rank(|f| f.is_test, |a, b| b.changes.cmp(&a.changes));
    let prod_files = classifier.rank(|f| f.is_prod, |a, b| b.changes.cmp(&a.changes));

    let mut tags: BTreeMap<String, Vec<Tag>> = BTreeMap::new();
    for (tag, list) in [
        (Tag::Hotspot, &hotspots),
        (Tag::BugProne, &bug_prone),
        (Tag::Legacy, &legacy_candidates),
        (Tag::SingleOwnerRisk, &ownership_risks),
        (Tag::Bloated, &inflation_risks),
        (Tag::NightOwl, &night_owls),
        (Tag::WeekendWarrior, &weekend_warriors),
        (Tag::TestFile, &test_files),
        (Tag::ProdFile, &prod_files),
    ] {
        for file in list {
            tags.entry(file.path.clone()).or_default().push(tag);
        }
    }

    let healthy: Vec<FileMetrics> = classifier
        .valid
        .iter()
        .filter(|f| f.is_prod && !tags.contains_key(&f.path))
        .map(|f| (*f).clone())
        .collect();
    for file in &healthy {
        tags.insert(file.path.clone(), vec![Tag::Healthy]);
    }

    let top_coupled = co_changes.top(config.coupling_min_co_commits, config.top_n);

    FileForensics {
        files,
        tags,
        hotspots,
        bug_prone,
        legacy_candidates,
        ownership_risks,
        inflation_risks,
        night_owls,
        weekend_warriors,
        test_files,
        prod_files,
        healthy,
        top_coupled,
        total_files_tracked,
    }
}

fn fold_commit(
    profiles: &mut HashMap<String, FileProfile>,
    commit: &CommitRecord,
    prod_extensions: &[String],
) {
    let at = commit.timestamp;
    let weekend = is_weekend(&at);
    let night = is_night(&at);

    for change in &commit.files {
        let profile = profiles
            .entry(change.path.clone())
            .or_insert_with(|| FileProfile::new(&change.path, at, prod_extensions));

        if at < profile.first_seen {
            profile.first_seen = at;
        }
        if at > profile.last_seen {
            profile.last_seen = at;
        }

        profile.added += change.lines_added;
        profile.deleted += change.lines_deleted;
        profile.changes += change.changes();
        profile.commit_count += 1;
        profile.add_volume(&commit.author, change.changes());

        if weekend {
            profile.weekend_commits += 1;
        }
        if night {
            profile.night_commits += 1;
        }
    }
}

fn volume_per_commit(file: &FileMetrics) -> f64 {
    file.changes as f64 / f64::from(file.commit_count.max(1))
}

/// Ranked selection over files with more than one commit.
struct Classifier<'a> {
    config: &'a ForensicsConfig,
    /// Sorted by path.
    valid: Vec<&'a FileMetrics>,
}

impl Classifier<'_> {
    fn rank<P, C>(&self, predicate: P, compare: C) -> Vec<FileMetrics>
    where
        P: Fn(&FileMetrics) -> bool,
        C: Fn(&FileMetrics, &FileMetrics) -> Ordering,
    {
        let mut selected: Vec<&FileMetrics> =
            self.valid.iter().copied().filter(|f| predicate(*f)).collect();
        // stable: equal-ranked files keep ascending path order
        selected.sort_by(|a, b| compare(*a, *b));
        selected
            .into_iter()
            .take(self.config.top_n)
            .cloned()
            .collect()
    }
}

impl fmt::Display for FileForensics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File Forensics")?;
        writeln!(f, "==============")?;
        writeln!(f, "Files tracked: {}", self.total_files_tracked)?;

        for (title, files) in self.sections() {
            if files.is_empty() {
                continue;
            }
            writeln!(f, "\n{title}:")?;
            writeln!(
                f,
                "  {:<50} {:>7} {:>8} {:>8}  {}",
                "File", "Commits", "Changes", "Net", "Owner"
            )?;
            for m in files {
                writeln!(
                    f,
                    "  {:<50} {:>7} {:>8} {:>+8}  {} ({:.0}%)",
                    m.path, m.commit_count, m.changes, m.net_growth, m.primary_owner, m.ownership_pct
                )?;
            }
        }

        if !self.top_coupled.is_empty() {
            writeln!(f, "\nCoupled files:")?;
            for pair in &self.top_coupled {
                writeln!(f, "  {:>4}x  {} <-> {}", pair.co_commits, pair.file1, pair.file2)?;
            }
        }
        Ok(())
    }
}
