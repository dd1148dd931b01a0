use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GitdeepError;

/// Extensions counted as production source by the file forensics engine.
pub const PROD_EXTENSIONS: &[&str] = &["py", "js", "ts", "java", "go", "c", "cpp", "cs", "rs"];

/// Extensions scanned by the duplication detector.
pub const DUPLICATION_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "java", "go", "c", "cpp", "cs", "php", "rb", "swift", "kt", "rs",
];

/// Dependency and build directories never walked by the duplication detector.
pub const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "venv",
    "env",
    "dist",
    "build",
    "vendor",
    "target",
];

/// Top-level configuration loaded from `.gitdeep.toml`.
///
/// Every section is optional; missing keys fall back to the defaults the
/// analyzers were tuned with.
///
/// # Examples
///
/// ```
/// use gitdeep_core::GitdeepConfig;
///
/// let config = GitdeepConfig::default();
/// assert_eq!(config.forensics.top_n, 5);
/// assert_eq!(config.duplication.max_candidates, 300);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitdeepConfig {
    /// Mirror acquisition and history limits.
    #[serde(default)]
    pub mining: MiningConfig,
    /// File forensics thresholds.
    #[serde(default)]
    pub forensics: ForensicsConfig,
    /// Duplication detector settings.
    #[serde(default)]
    pub duplication: DuplicationConfig,
}

impl GitdeepConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GitdeepError::Io`] if the file cannot be read, or
    /// [`GitdeepError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gitdeep_core::GitdeepConfig;
    /// use std::path::Path;
    ///
    /// let config = GitdeepConfig::from_file(Path::new(".gitdeep.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, GitdeepError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GitdeepError::Toml`] if parsing fails, or
    /// [`GitdeepError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitdeep_core::GitdeepConfig;
    ///
    /// let toml = r#"
    /// [duplication]
    /// max_candidates = 50
    /// "#;
    /// let config = GitdeepConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.duplication.max_candidates, 50);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, GitdeepError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GitdeepError> {
        if self.mining.clone_timeout_secs == 0 || self.mining.log_timeout_secs == 0 {
            return Err(GitdeepError::Config(
                "mining timeouts must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.duplication.flag_threshold) {
            return Err(GitdeepError::Config(format!(
                "duplication.flag_threshold must be within [0, 1], got {}",
                self.duplication.flag_threshold
            )));
        }
        Ok(())
    }
}

/// Local mirror acquisition settings.
///
/// # Examples
///
/// ```
/// use gitdeep_core::MiningConfig;
///
/// let config = MiningConfig::default();
/// assert_eq!(config.clone_timeout_secs, 60);
/// assert_eq!(config.log_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Abort `git clone` after this many seconds (default: 60).
    #[serde(default = "default_clone_timeout")]
    pub clone_timeout_secs: u64,
    /// Abort `git log` after this many seconds (default: 30).
    #[serde(default = "default_log_timeout")]
    pub log_timeout_secs: u64,
    /// Recent commits fed to the contributor and trend analyzers when they
    /// are derived from the mined history (default: 200).
    #[serde(default = "default_recent_commit_limit")]
    pub recent_commit_limit: usize,
}

fn default_clone_timeout() -> u64 {
    60
}

fn default_log_timeout() -> u64 {
    30
}

fn default_recent_commit_limit() -> usize {
    200
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            clone_timeout_secs: default_clone_timeout(),
            log_timeout_secs: default_log_timeout(),
            recent_commit_limit: default_recent_commit_limit(),
        }
    }
}

/// Classification thresholds for the file forensics engine.
///
/// # Examples
///
/// ```
/// use gitdeep_core::ForensicsConfig;
///
/// let config = ForensicsConfig::default();
/// assert_eq!(config.coupling_min_co_commits, 3);
/// assert_eq!(config.owner_risk_min_pct, 80.0);
/// assert!(config.prod_extensions.iter().any(|e| e == "py"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForensicsConfig {
    /// Length of every ranked list (default: 5).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Minimum shared commits for a coupled pair (default: 3).
    #[serde(default = "default_coupling_min")]
    pub coupling_min_co_commits: u32,
    /// Minimum commits for a bug-prone candidate (default: 3).
    #[serde(default = "default_bug_prone_min_commits")]
    pub bug_prone_min_commits: u32,
    /// Files older than this many days are legacy candidates (default: 30).
    #[serde(default = "default_legacy_min_age")]
    pub legacy_min_age_days: i64,
    /// Ownership share that makes a production file a single-owner risk (default: 80).
    #[serde(default = "default_owner_risk_pct")]
    pub owner_risk_min_pct: f64,
    /// Change volume a single-owner risk must exceed (default: 50).
    #[serde(default = "default_owner_risk_changes")]
    pub owner_risk_min_changes: u64,
    /// Net growth a bloated file must exceed (default: 200).
    #[serde(default = "default_bloat_growth")]
    pub bloat_min_net_growth: i64,
    /// Deleted/added ratio a bloated file must stay under (default: 0.1).
    #[serde(default = "default_bloat_delete_ratio")]
    pub bloat_max_delete_ratio: f64,
    /// Night or weekend share above which a file is tagged (default: 50).
    #[serde(default = "default_rhythm_pct")]
    pub rhythm_min_pct: f64,
    /// Extensions treated as production source.
    #[serde(default = "default_prod_extensions")]
    pub prod_extensions: Vec<String>,
}

fn default_top_n() -> usize {
    5
}

fn default_coupling_min() -> u32 {
    3
}

fn default_bug_prone_min_commits() -> u32 {
    3
}

fn default_legacy_min_age() -> i64 {
    30
}

fn default_owner_risk_pct() -> f64 {
    80.0
}

fn default_owner_risk_changes() -> u64 {
    50
}

fn default_bloat_growth() -> i64 {
    200
}

fn default_bloat_delete_ratio() -> f64 {
    0.1
}

fn default_rhythm_pct() -> f64 {
    50.0
}

fn default_prod_extensions() -> Vec<String> {
    PROD_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            coupling_min_co_commits: default_coupling_min(),
            bug_prone_min_commits: default_bug_prone_min_commits(),
            legacy_min_age_days: default_legacy_min_age(),
            owner_risk_min_pct: default_owner_risk_pct(),
            owner_risk_min_changes: default_owner_risk_changes(),
            bloat_min_net_growth: default_bloat_growth(),
            bloat_max_delete_ratio: default_bloat_delete_ratio(),
            rhythm_min_pct: default_rhythm_pct(),
            prod_extensions: default_prod_extensions(),
        }
    }
}

/// Duplication detector settings.
///
/// # Examples
///
/// ```
/// use gitdeep_core::DuplicationConfig;
///
/// let config = DuplicationConfig::default();
/// assert_eq!(config.max_candidates, 300);
/// assert_eq!(config.min_line_len, 5);
/// assert_eq!(config.min_tokens, 10);
/// assert_eq!(config.flag_threshold, 0.4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationConfig {
    /// Candidate files kept, in walk order (default: 300).
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Trimmed lines this long or shorter are not tokens (default: 5).
    #[serde(default = "default_min_line_len")]
    pub min_line_len: usize,
    /// Files with this many tokens or fewer are not compared (default: 10).
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    /// Similarity above which a pair is flagged (default: 0.4).
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: f64,
    /// Flagged pairs reported (default: 5).
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Extensions scanned.
    #[serde(default = "default_duplication_extensions")]
    pub extensions: Vec<String>,
    /// Directory names skipped during the walk.
    #[serde(default = "default_skipped_dirs")]
    pub skip_dirs: Vec<String>,
}

fn default_max_candidates() -> usize {
    300
}

fn default_min_line_len() -> usize {
    5
}

fn default_min_tokens() -> usize {
    10
}

fn default_flag_threshold() -> f64 {
    0.4
}

fn default_duplication_extensions() -> Vec<String> {
    DUPLICATION_EXTENSIONS
        .iter()
        .map(|e| (*e).to_string())
        .collect()
}

fn default_skipped_dirs() -> Vec<String> {
    SKIPPED_DIRS.iter().map(|d| (*d).to_string()).collect()
}

impl Default for DuplicationConfig {
    fn default() -> Self {
        Self {
            max_candidates: default_max_candidates(),
            min_line_len: default_min_line_len(),
            min_tokens: default_min_tokens(),
            flag_threshold: default_flag_threshold(),
            top_n: default_top_n(),
            extensions: default_duplication_extensions(),
            skip_dirs: default_skipped_dirs(),
        }
    }
}
