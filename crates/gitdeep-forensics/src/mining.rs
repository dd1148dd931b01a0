//! Commit history records and the textual log miner.
//!
//! Parses the output of
//! `git log --format=^CF^%H|%cI|%an --numstat` into [`CommitRecord`]s.
//! Parsing is line-level fault-isolated: a bad header or file line is dropped
//! and the rest of the stream is still mined.

use chrono::{DateTime, FixedOffset};
use gitdeep_core::CommitMeta;
use serde::{Deserialize, Serialize};

/// Marker that starts every commit header line.
pub const HEADER_MARKER: &str = "^CF^";

/// `git log` format string producing headers the miner understands.
///
/// The subject follows a tab after the author and is optional when parsing.
pub const LOG_FORMAT: &str = "--format=^CF^%H|%cI|%an%x09%s";

/// Author recorded for headers with an empty author field.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One commit with its per-file line counts.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::mining::{parse_timestamp, CommitRecord, FileChange};
///
/// let record = CommitRecord {
///     sha: "abc123".into(),
///     timestamp: parse_timestamp("2024-02-10T23:15:00+01:00").unwrap(),
///     author: "alice".into(),
///     message: "Add parser".into(),
///     files: vec![FileChange { path: "src/lib.rs".into(), lines_added: 10, lines_deleted: 3 }],
/// };
/// assert_eq!(record.files[0].changes(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Full commit hash.
    pub sha: String,
    /// Commit date in the committer's own offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Author name.
    pub author: String,
    /// Subject line, empty when the log did not carry one.
    #[serde(default)]
    pub message: String,
    /// Files touched, in log order.
    pub files: Vec<FileChange>,
}

/// Line counts for one file within a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// File path relative to the repository root.
    pub path: String,
    /// Lines added (0 for binary files).
    pub lines_added: u64,
    /// Lines deleted (0 for binary files).
    pub lines_deleted: u64,
}

impl FileChange {
    /// Total change volume: added plus deleted lines.
    pub fn changes(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

/// Arrival order of a commit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Order {
    /// Most recent commit first, as `git log` and platform APIs emit them.
    NewestFirst,
    /// Oldest commit first.
    OldestFirst,
}

/// A mined commit sequence together with its arrival order.
///
/// Consumers that fold over history must process commits oldest-first.
/// `History` keeps the records exactly as they arrived and only hands them
/// out through [`History::chronological`], so no analyzer has to know (or
/// guess) which way the producer emitted them.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::mining::parse_log;
///
/// let log = "^CF^b2|2024-03-02T10:00:00Z|bob\n\
///            ^CF^a1|2024-03-01T10:00:00Z|alice\n";
/// let history = parse_log(log);
/// let shas: Vec<&str> = history.chronological().map(|c| c.sha.as_str()).collect();
/// assert_eq!(shas, ["a1", "b2"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    records: Vec<CommitRecord>,
    order: Order,
}

impl History {
    /// Wrap records that arrived most-recent first.
    pub fn newest_first(records: Vec<CommitRecord>) -> Self {
        Self {
            records,
            order: Order::NewestFirst,
        }
    }

    /// Wrap records that arrived oldest first.
    pub fn oldest_first(records: Vec<CommitRecord>) -> Self {
        Self {
            records,
            order: Order::OldestFirst,
        }
    }

    /// An empty history: local data unavailable.
    pub fn empty() -> Self {
        Self::newest_first(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Records in arrival order.
    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    /// Records oldest first, whatever the arrival order.
    pub fn chronological(&self) -> Box<dyn Iterator<Item = &CommitRecord> + '_> {
        match self.order {
            Order::OldestFirst => Box::new(self.records.iter()),
            Order::NewestFirst => Box::new(self.records.iter().rev()),
        }
    }

    /// The `limit` most recent commits as platform-style metadata,
    /// newest first.
    ///
    /// Used when no hosting-platform client is available to feed the
    /// contributor and trend analyzers.
    pub fn recent_metadata(&self, limit: usize) -> Vec<CommitMeta> {
        let newest: Box<dyn Iterator<Item = &CommitRecord>> = match self.order {
            Order::NewestFirst => Box::new(self.records.iter()),
            Order::OldestFirst => Box::new(self.records.iter().rev()),
        };
        newest
            .take(limit)
            .map(|c| CommitMeta {
                sha: c.sha.clone(),
                message: c.message.clone(),
                author: Some(c.author.clone()),
                date: Some(c.timestamp.to_rfc3339()),
            })
            .collect()
    }
}

/// Parse an ISO-8601 commit date.
///
/// Accepts strict RFC 3339 (`%cI`, platform APIs) and git's default
/// `2024-01-31 17:02:11 +0100` form. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z"))
        .ok()
}

/// Mine a textual log into commit records, newest first.
///
/// Headers without a sha or a parseable date are skipped together with the
/// file lines that follow them. File lines with non-numeric counts (`-` for
/// binary files) get zero counts; lines with fewer than three tab-separated
/// fields are dropped.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::mining::parse_log;
///
/// let log = "^CF^abc|2024-05-01T09:30:00+02:00|alice\n\
///            12\t4\tsrc/main.rs\n\
///            -\t-\tassets/logo.png\n";
/// let history = parse_log(log);
/// let commit = &history.records()[0];
/// assert_eq!(commit.files.len(), 2);
/// assert_eq!(commit.files[1].lines_added, 0);
/// ```
pub fn parse_log(text: &str) -> History {
    let mut records: Vec<CommitRecord> = Vec::new();
    // `false` while inside the body of a skipped header
    let mut in_commit = false;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(rest) = line.trim_start().strip_prefix(HEADER_MARKER) {
            match parse_header(rest) {
                Some(record) => {
                    records.push(record);
                    in_commit = true;
                }
                None => {
                    tracing::debug!(line = line_no + 1, "skipping malformed commit header");
                    in_commit = false;
                }
            }
            continue;
        }

        if !in_commit {
            tracing::trace!(line = line_no + 1, "file line outside of a commit");
            continue;
        }

        match parse_file_line(line) {
            Some(change) => {
                if let Some(current) = records.last_mut() {
                    current.files.push(change);
                }
            }
            None => tracing::trace!(line = line_no + 1, "dropping malformed file line"),
        }
    }

    History::newest_first(records)
}

fn parse_header(rest: &str) -> Option<CommitRecord> {
    let (fields, message) = rest.split_once('\t').unwrap_or((rest, ""));
    let mut fields = fields.splitn(3, '|');
    let sha = fields.next()?.trim();
    let date = fields.next()?.trim();
    if sha.is_empty() || date.is_empty() {
        return None;
    }
    let timestamp = parse_timestamp(date)?;
    let author = fields
        .next()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR);

    Some(CommitRecord {
        sha: sha.to_string(),
        timestamp,
        author: author.to_string(),
        message: message.trim().to_string(),
        files: Vec::new(),
    })
}

fn parse_file_line(line: &str) -> Option<FileChange> {
    let mut fields = line.splitn(3, '\t');
    let added = fields.next()?.trim();
    let deleted = fields.next()?.trim();
    let path = fields.next()?.trim();
    if path.is_empty() {
        return None;
    }

    let path = match unquote_path(path) {
        Some(unquoted) => resolve_rename_path(&unquoted),
        None => {
            let resolved = resolve_rename_path(path);
            unquote_path(&resolved).unwrap_or(resolved)
        }
    };

    Some(FileChange {
        path,
        lines_added: added.parse().unwrap_or(0),
        lines_deleted: deleted.parse().unwrap_or(0),
    })
}

/// Undo git's C-style path quoting.
///
/// Returns `None` unless `raw` is a complete quoted string. Octal escapes are
/// raw bytes and are decoded as UTF-8.
///
/// # Examples
///
/// ```
/// use gitdeep_forensics::mining::unquote_path;
///
/// assert_eq!(unquote_path(r#""caf\303\251.py""#).as_deref(), Some("café.py"));
/// assert_eq!(unquote_path(r#""tab\there.py""#).as_deref(), Some("tab\there.py"));
/// assert_eq!(unquote_path("plain.py"), None);
/// ```
pub fn unquote_path(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let src = inner.as_bytes();
    let mut bytes = Vec::with_capacity(src.len());
    let mut i = 0;

    while i < src.len() {
        match src[i] {
            b'\\' => {
                let escaped = *src.get(i + 1)?;
                let (byte, width) = match escaped {
                    b'0'..=b'7' => {
                        let digits = src.get(i + 1..i + 4)?;
                        let mut value: u16 = 0;
                        for d in digits {
                            if !(b'0'..=b'7').contains(d) {
                                return None;
                            }
                            value = value * 8 + u16::from(d - b'0');
                        }
                        (u8::try_from(value).ok()?, 4)
                    }
                    b'a' => (0x07, 2),
                    b'b' => (0x08, 2),
                    b't' => (b'\t', 2),
                    b'n' => (b'\n', 2),
                    b'v' => (0x0b, 2),
                    b'f' => (0x0c, 2),
                    b'r' => (b'\r', 2),
                    b'"' => (b'"', 2),
                    b'\\' => (b'\\', 2),
                    _ => return None,
                };
                bytes.push(byte);
                i += width;
            }
            // an unescaped quote means this was not one quoted string
            b'"' => return None,
            b => {
                bytes.push(b);
                i += 1;
            }
        }
    }

    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Resolve numstat rename notation to the destination path.
///
/// `old.rs => new.rs` becomes `new.rs`; `src/{a => b}/lib.rs` becomes
/// `src/b/lib.rs`. Plain paths are returned unchanged.
pub fn resolve_rename_path(raw: &str) -> String {
    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if open < close {
            if let Some((_, new)) = raw[open + 1..close].split_once(" => ") {
                let mut path = format!("{}{}{}", &raw[..open], new, &raw[close + 1..]);
                while path.contains("//") {
                    path = path.replace("//", "/");
                }
                return path.trim_start_matches('/').to_string();
            }
        }
    }
    match raw.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOG: &str = "\
^CF^c3|2024-03-03T22:00:00+00:00|carol
5\t1\tsrc/app.py
2\t0\ttests/test_app.py

^CF^b2|2024-03-02T10:00:00+00:00|bob
-\t-\tdocs/diagram.png
10\t2\tsrc/app.py
^CF^a1|2024-03-01T09:00:00+00:00|alice
100\t0\tsrc/app.py
";

    #[test]
    fn parses_headers_and_file_lines() {
        let history = parse_log(SAMPLE_LOG);
        assert_eq!(history.len(), 3);
        assert_eq!(history.order(), Order::NewestFirst);

        let newest = &history.records()[0];
        assert_eq!(newest.sha, "c3");
        assert_eq!(newest.author, "carol");
        assert_eq!(newest.files.len(), 2);
        assert_eq!(newest.files[0].path, "src/app.py");
        assert_eq!(newest.files[0].lines_added, 5);
        assert_eq!(newest.files[0].lines_deleted, 1);
    }

    #[test]
    fn binary_marker_maps_to_zero() {
        let history = parse_log(SAMPLE_LOG);
        let png = &history.records()[1].files[0];
        assert_eq!(png.path, "docs/diagram.png");
        assert_eq!(png.lines_added, 0);
        assert_eq!(png.lines_deleted, 0);
    }

    #[test]
    fn chronological_reverses_newest_first() {
        let history = parse_log(SAMPLE_LOG);
        let shas: Vec<&str> = history.chronological().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, ["a1", "b2", "c3"]);

        let forward = History::oldest_first(history.records().to_vec());
        let shas: Vec<&str> = forward.chronological().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, ["c3", "b2", "a1"]);
    }

    #[test]
    fn header_without_date_is_skipped_with_its_files() {
        let log = "\
^CF^good1|2024-01-02T00:00:00Z|alice
1\t1\ta.rs
^CF^broken
7\t7\torphan.rs
^CF^good2|2024-01-01T00:00:00Z|bob
2\t2\tb.rs
";
        let history = parse_log(log);
        assert_eq!(history.len(), 2);
        let all_paths: Vec<&str> = history
            .records()
            .iter()
            .flat_map(|c| c.files.iter().map(|f| f.path.as_str()))
            .collect();
        assert_eq!(all_paths, ["a.rs", "b.rs"]);
    }

    #[test]
    fn unparsable_date_skips_header() {
        let log = "^CF^abc|yesterday|alice\n3\t1\tx.rs\n";
        assert!(parse_log(log).is_empty());
    }

    #[test]
    fn missing_author_becomes_unknown() {
        let history = parse_log("^CF^abc|2024-01-01T00:00:00Z|\n1\t0\tx.rs\n");
        assert_eq!(history.records()[0].author, UNKNOWN_AUTHOR);

        let history = parse_log("^CF^abc|2024-01-01T00:00:00Z\n");
        assert_eq!(history.records()[0].author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn author_may_contain_pipes() {
        let history = parse_log("^CF^abc|2024-01-01T00:00:00Z|team|infra\n");
        assert_eq!(history.records()[0].author, "team|infra");
    }

    #[test]
    fn malformed_file_lines_are_dropped() {
        let log = "\
^CF^abc|2024-01-01T00:00:00Z|alice
not a numstat line
4\t2
3\t1\tkept.rs
";
        let history = parse_log(log);
        let files = &history.records()[0].files;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "kept.rs");
    }

    #[test]
    fn file_lines_before_first_header_are_dropped() {
        let history = parse_log("1\t1\tstray.rs\n^CF^abc|2024-01-01T00:00:00Z|alice\n");
        assert_eq!(history.len(), 1);
        assert!(history.records()[0].files.is_empty());
    }

    #[test]
    fn git_default_date_format_is_accepted() {
        let ts = parse_timestamp("2024-01-31 17:02:11 +0100").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-31T17:02:11+01:00");
        assert!(parse_timestamp("31/01/2024").is_none());
    }

    #[test]
    fn crlf_input_is_handled() {
        let history = parse_log("^CF^abc|2024-01-01T00:00:00Z|alice\r\n1\t2\tx.rs\r\n");
        assert_eq!(history.records()[0].files[0].path, "x.rs");
        assert_eq!(history.records()[0].files[0].lines_deleted, 2);
    }

    #[test]
    fn mining_is_deterministic() {
        assert_eq!(parse_log(SAMPLE_LOG), parse_log(SAMPLE_LOG));
    }

    #[test]
    fn empty_text_yields_empty_history() {
        assert!(parse_log("").is_empty());
        assert!(parse_log("\n\n   \n").is_empty());
    }

    #[test]
    fn rename_paths_resolve_to_destination() {
        assert_eq!(resolve_rename_path("old.rs => new.rs"), "new.rs");
        assert_eq!(resolve_rename_path("src/{a => b}/lib.rs"), "src/b/lib.rs");
        assert_eq!(resolve_rename_path("src/{ => nested}/lib.rs"), "src/nested/lib.rs");
        assert_eq!(resolve_rename_path("src/{gone => }/lib.rs"), "src/lib.rs");
        assert_eq!(resolve_rename_path("plain/path.rs"), "plain/path.rs");
    }

    #[test]
    fn subject_follows_a_tab() {
        let log = "^CF^a|2024-01-01T00:00:00Z|Ann Lee\tfix: handle | in names\n\
                   1\t0\tsrc/lib.rs\n\
                   ^CF^b|2024-01-02T00:00:00Z|bob\n";
        let history = parse_log(log);
        let first = &history.records()[0];
        assert_eq!(first.author, "Ann Lee");
        assert_eq!(first.message, "fix: handle | in names");
        assert_eq!(history.records()[1].message, "");
        assert_eq!(history.recent_metadata(1)[0].message, "fix: handle | in names");
    }

    #[test]
    fn quoted_paths_are_unescaped() {
        let log = "^CF^a|2024-01-01T00:00:00Z|dev\n\
                   3\t0\t\"caf\\303\\251.py\"\n\
                   1\t1\t\"with\\ttab.js\"\n\
                   2\t0\t\"src/{old.py => n\\303\\251w.py}\"\n";
        let history = parse_log(log);
        let paths: Vec<&str> = history.records()[0]
            .files
            .iter()
            .map(|f| f.path.as_str())
            .collect();
        assert_eq!(paths, ["café.py", "with\ttab.js", "src/néw.py"]);
    }

    #[test]
    fn unquote_rejects_partial_quoting() {
        assert_eq!(unquote_path("\"a\" => \"b\""), None);
        assert_eq!(unquote_path("\"bad\\q\""), None);
        assert_eq!(unquote_path("\"trunc\\30\""), None);
        assert_eq!(unquote_path("\"\\\"quoted\\\"\""), Some("\"quoted\"".to_string()));
    }

    #[test]
    fn quoted_rename_sides_resolve() {
        let log = "^CF^a|2024-01-01T00:00:00Z|dev\n\
                   1\t0\t\"old\\303\\251.py\" => \"new\\303\\251.py\"\n";
        let history = parse_log(log);
        assert_eq!(history.records()[0].files[0].path, "newé.py");
    }

    #[test]
    fn recent_metadata_is_newest_first_and_limited() {
        let history = parse_log(SAMPLE_LOG);
        let meta = history.recent_metadata(2);
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[0].sha, "c3");
        assert_eq!(meta[1].author.as_deref(), Some("bob"));

        let forward = History::oldest_first(history.records().iter().rev().cloned().collect());
        assert_eq!(forward.recent_metadata(1)[0].sha, "c3");
    }
}
