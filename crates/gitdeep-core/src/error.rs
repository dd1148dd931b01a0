use std::path::PathBuf;

/// Errors that can occur across the gitdeep crates.
///
/// Malformed history data is not an error: the analyzers degrade to sentinel
/// values instead. Variants here cover the genuine failures (unreadable
/// inputs, broken configuration, git plumbing). Each variant carries a
/// `miette` diagnostic code so the binary can report it directly.
///
/// # Examples
///
/// ```
/// use gitdeep_core::GitdeepError;
///
/// let err = GitdeepError::Config("clone_timeout_secs must be positive".into());
/// assert!(err.to_string().contains("clone_timeout_secs"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GitdeepError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(gitdeep::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(gitdeep::config), help("check the values in .gitdeep.toml"))]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(gitdeep::git))]
    Git(String),

    /// Temporary mirror could not be cloned or read.
    #[error("mirror error: {0}")]
    #[diagnostic(code(gitdeep::mirror))]
    Mirror(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(gitdeep::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(gitdeep::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(gitdeep::not_found))]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GitdeepError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn mirror_error_displays_message() {
        let err = GitdeepError::Mirror("clone timed out after 60s".into());
        assert_eq!(err.to_string(), "mirror error: clone timed out after 60s");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = GitdeepError::FileNotFound(PathBuf::from("/tmp/history.log"));
        assert!(err.to_string().contains("/tmp/history.log"));
    }

    #[test]
    fn json_error_converts() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1,").unwrap_err();
        let err: GitdeepError = json_err.into();
        assert!(err.to_string().starts_with("serialization error"));
    }

    #[test]
    fn config_error_has_diagnostic_code() {
        use miette::Diagnostic;

        let err = GitdeepError::Config("bad threshold".into());
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("gitdeep::config"));
        assert!(err.help().is_some());
    }
}
