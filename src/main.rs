use std::fmt::Display;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{ArgGroup, CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use serde::Serialize;

use gitdeep_core::{CommitMeta, GitdeepConfig, OutputFormat};
use gitdeep_forensics::concentration::{analyze_concentration, BusFactor};
use gitdeep_forensics::duplication::{detect_duplication, DuplicationReport};
use gitdeep_forensics::forensics::{analyze_files, FileForensics};
use gitdeep_forensics::intent::{analyze_intent, CommitIntent};
use gitdeep_forensics::mining::{parse_log, History};
use gitdeep_forensics::report::{report_for_history, report_for_remote, HealthReport};
use gitdeep_forensics::repository::mine_repository;
use gitdeep_forensics::trend::{analyze_trend, ActivityDecay};

#[derive(Parser)]
#[command(
    name = "gitdeep",
    version,
    about = "Repository forensics from git history",
    long_about = "gitdeep turns version-control history into software-health signals:\n\
                   contributor concentration (bus factor), commit-cadence decay, commit intent,\n\
                   per-file rhythm/ownership/coupling classification, and internal duplication.\n\n\
                   Examples:\n  \
                     gitdeep forensics --repo .                 Classify files of a local repo\n  \
                     git log --format='^CF^%H|%cI|%an%x09%s' --numstat | gitdeep forensics\n  \
                     gitdeep contributors --commits commits.json  Bus factor from platform data\n  \
                     gitdeep dups --path src                     Pairwise duplication scan\n  \
                     gitdeep analyze --url https://host/org/repo.git"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .gitdeep.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Classify files by churn, rhythm, ownership and coupling
    #[command(
        long_about = "Classify files by churn, rhythm, ownership and coupling.\n\n\
        Reads full history either from a local repository (--repo) or from log text\n\
        produced by `git log --format=^CF^%H|%cI|%an%x09%s --numstat` (--log, or stdin).\n\n\
        Examples:\n  gitdeep forensics --repo .\n  gitdeep forensics --log history.txt --format json",
        group(ArgGroup::new("source").args(["log", "repo"]))
    )]
    Forensics {
        /// Read log text from a file instead of stdin
        #[arg(long)]
        log: Option<PathBuf>,
        /// Mine a local repository directly
        #[arg(long)]
        repo: Option<PathBuf>,
    },
    /// Compute the bus factor of recent commits
    #[command(long_about = "Compute the bus factor of recent commits.\n\n\
        Takes a JSON array of {sha, message, author, date} objects, newest first,\n\
        as returned by a hosting platform. Without --commits the most recent\n\
        commits of the repository at --repo are used.\n\n\
        Examples:\n  gitdeep contributors --commits commits.json\n  gitdeep contributors --repo .")]
    Contributors {
        /// JSON file with recent-commit metadata
        #[arg(long)]
        commits: Option<PathBuf>,
        /// Repository to derive recent commits from (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Measure commit-cadence decay
    #[command(long_about = "Measure commit-cadence decay.\n\n\
        Buckets recent commits by calendar month and compares the later half of\n\
        the series with the earlier half.\n\n\
        Examples:\n  gitdeep trend --commits commits.json\n  gitdeep trend --repo . --format markdown")]
    Trend {
        /// JSON file with recent-commit metadata
        #[arg(long)]
        commits: Option<PathBuf>,
        /// Repository to derive recent commits from (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Classify recent commit messages by intent
    #[command(long_about = "Classify recent commit messages by intent.\n\n\
        Sorts each message into feature, fix, chore, docs or other work by keyword\n\
        and reports the ratio of maintenance (fix + chore) to feature commits.\n\n\
        Examples:\n  gitdeep intent --commits commits.json\n  gitdeep intent --repo .")]
    Intent {
        /// JSON file with recent-commit metadata
        #[arg(long)]
        commits: Option<PathBuf>,
        /// Repository to derive recent commits from (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Detect internal duplication between source files
    #[command(long_about = "Detect internal duplication between source files.\n\n\
        Compares every pair of source files by the Jaccard similarity of their\n\
        distinct trimmed lines.\n\n\
        Examples:\n  gitdeep dups --path .\n  gitdeep dups --path . --focus src/handlers.py")]
    Dups {
        /// Directory to scan (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Report every flagged pair touching these files
        #[arg(long)]
        focus: Vec<String>,
    },
    /// Run every analysis and print a combined health report
    #[command(
        long_about = "Run every analysis and print a combined health report.\n\n\
        With --url the repository is cloned into a temporary directory that is\n\
        removed afterwards. If the clone fails the report is built without local data.\n\n\
        Examples:\n  gitdeep analyze --repo .\n  gitdeep analyze --url https://example.com/org/repo.git --commits commits.json",
        group(ArgGroup::new("target").args(["url", "repo"]).required(true))
    )]
    Analyze {
        /// Remote repository to clone
        #[arg(long)]
        url: Option<String>,
        /// Local repository
        #[arg(long)]
        repo: Option<PathBuf>,
        /// JSON file with recent-commit metadata
        #[arg(long)]
        commits: Option<PathBuf>,
    },
    /// Create a default .gitdeep.toml configuration file
    #[command(long_about = "Create a default .gitdeep.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .gitdeep.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# gitdeep configuration

[mining]
# clone_timeout_secs = 60
# log_timeout_secs = 30
# recent_commit_limit = 200

[forensics]
# top_n = 5
# coupling_min_co_commits = 3
# bug_prone_min_commits = 3
# legacy_min_age_days = 30
# owner_risk_min_pct = 80.0
# owner_risk_min_changes = 50
# bloat_min_net_growth = 200
# bloat_max_delete_ratio = 0.1
# rhythm_min_pct = 50.0
# prod_extensions = ["py", "js", "ts", "java", "go", "c", "cpp", "cs", "rs"]

[duplication]
# max_candidates = 300
# min_line_len = 5
# min_tokens = 10
# flag_threshold = 0.4
# top_n = 5
# extensions = ["py", "js", "ts", "java", "go", "c", "cpp", "cs", "php", "rb", "swift", "kt", "rs"]
# skip_dirs = ["node_modules", "venv", "env", "dist", "build", "vendor", "target"]
"#;

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("gitdeep v{version} - repository forensics from git history\n");

    println!("Commands:");
    println!("  forensics     File churn, rhythm, ownership and coupling");
    println!("  contributors  Bus factor of recent commits");
    println!("  trend         Commit-cadence decay");
    println!("  intent        Feature vs maintenance work in commit messages");
    println!("  dups          Internal duplication");
    println!("  analyze       All of the above as one report");
    println!("  init          Create default configuration\n");

    println!("Run 'gitdeep <command> --help' for details.");
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GitdeepConfig> {
    let config = match path {
        Some(path) => GitdeepConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => {
            let default_path = Path::new(".gitdeep.toml");
            if default_path.exists() {
                GitdeepConfig::from_file(default_path)?
            } else {
                GitdeepConfig::default()
            }
        }
    };
    Ok(config)
}

fn read_log_input(file: Option<&Path>) -> Result<String> {
    let bytes = match file {
        Some(path) => std::fs::read(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .into_diagnostic()
                .wrap_err("reading log from stdin")?;
            buf
        }
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_commits(path: &Path) -> Result<Vec<CommitMeta>> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err(format!("reading {}", path.display()))?;
    serde_json::from_str(&content)
        .into_diagnostic()
        .wrap_err(format!("parsing commit metadata in {}", path.display()))
}

fn mine_local(path: &Path) -> Result<History> {
    if !path.exists() {
        return Err(miette::miette!(
            help = "Run gitdeep from inside a git repository, or pass --repo",
            "Path does not exist: {}",
            path.display()
        ));
    }
    tracing::debug!(path = %path.display(), "mining repository");
    let history = mine_repository(path)
        .wrap_err_with(|| format!("mining {}", path.display()))?;
    tracing::debug!(commits = history.len(), "mined history");
    Ok(history)
}

/// Recent-commit metadata from a file, or derived from the repository.
fn recent_commits(
    commits: Option<&Path>,
    repo: &Path,
    config: &GitdeepConfig,
) -> Result<Vec<CommitMeta>> {
    match commits {
        Some(path) => read_commits(path),
        None => {
            let history = mine_local(repo)?;
            Ok(history.recent_metadata(config.mining.recent_commit_limit))
        }
    }
}

fn print_output<T>(value: &T, format: OutputFormat, markdown: fn(&T) -> String) -> Result<()>
where
    T: Serialize + Display,
{
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        OutputFormat::Markdown => print!("{}", markdown(value)),
        OutputFormat::Text => print!("{value}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        None => print_welcome(),
        Some(Command::Forensics { ref log, ref repo }) => {
            let history = match repo {
                Some(path) => mine_local(path)?,
                None => parse_log(&read_log_input(log.as_deref())?),
            };
            if history.is_empty() {
                tracing::warn!("no commits found; nothing to classify");
            }
            let result = analyze_files(&history, &config.forensics);
            print_output(&result, cli.format, FileForensics::to_markdown)?;
        }
        Some(Command::Contributors {
            ref commits,
            ref repo,
        }) => {
            let recent = recent_commits(commits.as_deref(), repo, &config)?;
            let result = analyze_concentration(&recent);
            print_output(&result, cli.format, BusFactor::to_markdown)?;
        }
        Some(Command::Trend {
            ref commits,
            ref repo,
        }) => {
            let recent = recent_commits(commits.as_deref(), repo, &config)?;
            let result = analyze_trend(&recent);
            print_output(&result, cli.format, ActivityDecay::to_markdown)?;
        }
        Some(Command::Intent {
            ref commits,
            ref repo,
        }) => {
            let recent = recent_commits(commits.as_deref(), repo, &config)?;
            let result = analyze_intent(&recent);
            print_output(&result, cli.format, CommitIntent::to_markdown)?;
        }
        Some(Command::Dups {
            ref path,
            ref focus,
        }) => {
            let report = detect_duplication(path, &config.duplication, focus)?;
            print_output(&report, cli.format, DuplicationReport::to_markdown)?;
        }
        Some(Command::Analyze {
            ref url,
            ref repo,
            ref commits,
        }) => {
            let recent = commits.as_deref().map(read_commits).transpose()?;
            let report = match (url, repo) {
                (Some(url), _) => {
                    eprintln!("Cloning {url}...");
                    report_for_remote(url, recent.as_deref(), &config).await
                }
                (None, Some(path)) => {
                    let history = mine_local(path)?;
                    report_for_history(&history, recent.as_deref(), Some(path), &config)
                }
                (None, None) => miette::bail!("pass --url or --repo"),
            };
            print_output(&report, cli.format, HealthReport::to_markdown)?;
        }
        Some(Command::Init) => {
            let path = Path::new(".gitdeep.toml");
            if path.exists() {
                miette::bail!(".gitdeep.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .gitdeep.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "gitdeep", &mut std::io::stdout());
        }
    }

    Ok(())
}
