//! Internal duplication detection.
//!
//! Treats each source file as the set of its distinct trimmed lines and
//! compares every pair of files by Jaccard similarity. Purely line-based:
//! renamed identifiers or reformatted code are not recognized.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use gitdeep_core::{DuplicationConfig, GitdeepError};
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Two files with a similar set of lines.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::duplication::DuplicatePair;
///
/// let pair = DuplicatePair::new("a.py".into(), "b.py".into(), 0.5);
/// assert_eq!(pair.similarity_pct, 50.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePair {
    /// Earlier file in walk order.
    pub file1: String,
    /// Later file in walk order.
    pub file2: String,
    /// Jaccard similarity, 0.0-1.0.
    pub similarity: f64,
    /// `similarity * 100`, rounded to one decimal.
    pub similarity_pct: f64,
}

impl DuplicatePair {
    pub fn new(file1: String, file2: String, similarity: f64) -> Self {
        Self {
            file1,
            file2,
            similarity,
            similarity_pct: round1(similarity * 100.0),
        }
    }

    fn touches(&self, path: &str) -> bool {
        self.file1 == path || self.file2 == path
    }
}

/// Result of a duplication scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicationReport {
    /// Mean similarity over pairs sharing at least one line, as a percentage
    /// rounded to one decimal.
    pub duplication_pct: f64,
    /// Most similar flagged pairs, highest first.
    pub pairs: Vec<DuplicatePair>,
    /// Every flagged pair touching one of the requested files of interest.
    pub focus_pairs: Vec<DuplicatePair>,
    /// Files with a scanned extension found by the walk.
    pub candidates_found: usize,
    /// Candidates kept after the cap.
    pub candidates_considered: usize,
    /// Candidates with enough distinct lines to be compared.
    pub files_compared: usize,
    /// Whether the cap dropped candidates.
    pub truncated: bool,
}

/// Tokenized file ready for comparison.
struct TokenSet {
    path: String,
    tokens: HashSet<String>,
}

/// Scan `root` for internal duplication.
///
/// `focus` lists paths (relative to `root`) whose flagged pairs are reported
/// in full in [`DuplicationReport::focus_pairs`] regardless of the top-N limit.
///
/// # Errors
///
/// Returns [`GitdeepError::FileNotFound`] if `root` does not exist.
///
/// # Examples
///
/// ```
/// use gitdeep_core::DuplicationConfig;
/// use gitdeep_forensics::duplication::detect_duplication;
///
/// let dir = tempfile::tempdir().unwrap();
/// let report = detect_duplication(dir.path(), &DuplicationConfig::default(), &[]).unwrap();
/// assert_eq!(report.duplication_pct, 0.0);
/// assert!(report.pairs.is_empty());
/// ```
pub fn detect_duplication(
    root: &Path,
    config: &DuplicationConfig,
    focus: &[String],
) -> Result<DuplicationReport, GitdeepError> {
    if !root.exists() {
        return Err(GitdeepError::FileNotFound(root.to_path_buf()));
    }

    let candidates = collect_candidates(root, config);
    let candidates_found = candidates.len();
    let truncated = candidates_found > config.max_candidates;
    if truncated {
        tracing::debug!(
            found = candidates_found,
            cap = config.max_candidates,
            "duplication candidates truncated"
        );
    }

    let sets: Vec<TokenSet> = candidates
        .into_iter()
        .take(config.max_candidates)
        .filter_map(|path| {
            let tokens = tokenize(&path, config.min_line_len);
            if tokens.len() <= config.min_tokens {
                return None;
            }
            Some(TokenSet {
                path: relative_path(root, &path),
                tokens,
            })
        })
        .collect();

    let candidates_considered = candidates_found.min(config.max_candidates);
    let (duplication_pct, mut flagged) = compare_all(&sets, config.flag_threshold);

    flagged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    let focus_pairs: Vec<DuplicatePair> = flagged
        .iter()
        .filter(|p| focus.iter().any(|f| p.touches(f)))
        .cloned()
        .collect();

    flagged.truncate(config.top_n);

    Ok(DuplicationReport {
        duplication_pct,
        pairs: flagged,
        focus_pairs,
        candidates_found,
        candidates_considered,
        files_compared: sets.len(),
        truncated,
    })
}

/// Candidate source files in deterministic depth-first, name-sorted order.
fn collect_candidates(root: &Path, config: &DuplicationConfig) -> Vec<PathBuf> {
    let skip_dirs = config.skip_dirs.clone();
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            let Some(name) = entry.file_name().to_str() else {
                return false;
            };
            !name.starts_with('.') && !skip_dirs.iter().any(|d| d == name)
        })
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::trace!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| config.extensions.iter().any(|x| *x == ext));
        if matches {
            files.push(entry.into_path());
        }
    }
    files
}

/// Distinct trimmed lines longer than `min_line_len` characters.
///
/// Unreadable or non-UTF-8 files yield no tokens.
fn tokenize(path: &Path, min_line_len: usize) -> HashSet<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|l| l.chars().count() > min_line_len)
            .map(String::from)
            .collect(),
        Err(err) => {
            tracing::trace!(path = %path.display(), error = %err, "unreadable candidate");
            HashSet::new()
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Jaccard similarity of two sets; 0.0 when both are empty.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use gitdeep_forensics::duplication::jaccard;
///
/// let a: HashSet<&str> = ["x", "y", "z"].into_iter().collect();
/// let b: HashSet<&str> = ["y", "z", "w"].into_iter().collect();
/// assert_eq!(jaccard(&a, &b), 0.5);
/// ```
pub fn jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let intersection = small.iter().filter(|t| large.contains(*t)).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Compare every unordered pair. Rows are computed in parallel and reduced
/// in index order, so the sum is the same on every run.
fn compare_all(sets: &[TokenSet], flag_threshold: f64) -> (f64, Vec<DuplicatePair>) {
    let rows: Vec<(f64, usize, Vec<DuplicatePair>)> = (0..sets.len())
        .into_par_iter()
        .map(|i| {
            let mut sum = 0.0;
            let mut overlapping = 0usize;
            let mut flagged = Vec::new();
            for j in (i + 1)..sets.len() {
                let sim = jaccard(&sets[i].tokens, &sets[j].tokens);
                if sim > 0.0 {
                    sum += sim;
                    overlapping += 1;
                }
                if sim > flag_threshold {
                    flagged.push(DuplicatePair::new(
                        sets[i].path.clone(),
                        sets[j].path.clone(),
                        sim,
                    ));
                }
            }
            (sum, overlapping, flagged)
        })
        .collect();

    let mut total = 0.0;
    let mut comparisons = 0usize;
    let mut flagged = Vec::new();
    for (sum, count, pairs) in rows {
        total += sum;
        comparisons += count;
        flagged.extend(pairs);
    }

    let pct = if comparisons > 0 {
        round1(total / comparisons as f64 * 100.0)
    } else {
        0.0
    };
    (pct, flagged)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl fmt::Display for DuplicationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Duplication")?;
        writeln!(f, "===========")?;
        writeln!(
            f,
            "Mean similarity: {:.1}% over {} files{}\n",
            self.duplication_pct,
            self.files_compared,
            if self.truncated { " (candidate list truncated)" } else { "" }
        )?;

        if self.pairs.is_empty() {
            return writeln!(f, "No highly similar files.");
        }
        for pair in &self.pairs {
            writeln!(f, "{:>5.1}%  {}  <->  {}", pair.similarity_pct, pair.file1, pair.file2)?;
        }
        if !self.focus_pairs.is_empty() {
            writeln!(f, "\nFiles of interest:")?;
            for pair in &self.focus_pairs {
                writeln!(f, "{:>5.1}%  {}  <->  {}", pair.similarity_pct, pair.file1, pair.file2)?;
            }
        }
        Ok(())
    }
}

impl DuplicationReport {
    /// Render as a markdown section.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("## Duplication\n\n");
        out.push_str(&format!(
            "**Mean similarity:** {:.1}% over {} files\n\n",
            self.duplication_pct, self.files_compared
        ));
        if !self.pairs.is_empty() {
            out.push_str("| File | File | Similarity |\n");
            out.push_str("|------|------|------------|\n");
            for pair in &self.pairs {
                out.push_str(&format!(
                    "| {} | {} | {:.1}% |\n",
                    pair.file1, pair.file2, pair.similarity_pct
                ));
            }
            out.push('\n');
        }
        out
    }
}
