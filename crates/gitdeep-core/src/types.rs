use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One entry of the recent-commit metadata supplied by a hosting-platform
/// client, newest first.
///
/// `author` and `date` are optional: platform payloads omit them for commits
/// made by unlinked accounts, and the analyzers treat such records as
/// unattributed or undatable rather than failing.
///
/// # Examples
///
/// ```
/// use gitdeep_core::CommitMeta;
///
/// let meta: CommitMeta = serde_json::from_str(
///     r#"{"sha":"abc123","message":"fix: parser","author":"alice","date":"2024-03-01T10:00:00Z"}"#,
/// ).unwrap();
/// assert_eq!(meta.author.as_deref(), Some("alice"));
///
/// let bare: CommitMeta = serde_json::from_str(r#"{"sha":"def456"}"#).unwrap();
/// assert!(bare.author.is_none());
/// assert!(bare.message.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    /// Commit hash.
    pub sha: String,
    /// Commit message (may be multi-line).
    #[serde(default)]
    pub message: String,
    /// Author display name or login.
    #[serde(default)]
    pub author: Option<String>,
    /// ISO-8601 author or commit date.
    #[serde(default)]
    pub date: Option<String>,
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use gitdeep_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn commit_meta_array_deserializes() {
        let json = r#"[
            {"sha": "a1", "message": "feat: x", "author": "alice", "date": "2024-01-05T08:00:00Z"},
            {"sha": "b2", "message": "chore", "author": null, "date": null}
        ]"#;
        let commits: Vec<CommitMeta> = serde_json::from_str(json).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].date.as_deref(), Some("2024-01-05T08:00:00Z"));
        assert!(commits[1].author.is_none());
    }

    #[test]
    fn commit_meta_serializes_round_trip_fields() {
        let meta = CommitMeta {
            sha: "abc".into(),
            message: "init".into(),
            author: Some("bob".into()),
            date: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["author"], "bob");
        assert!(json["date"].is_null());
    }
}
