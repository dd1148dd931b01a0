//! History extraction from a local repository via git2.
//!
//! Produces the same [`CommitRecord`]s as the textual miner without
//! shelling out to `git log`, for working copies that are already on disk.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{DiffFindOptions, DiffOptions, Repository, Sort};
use gitdeep_core::GitdeepError;

use crate::mining::{CommitRecord, FileChange, History, UNKNOWN_AUTHOR};

/// Mine the full history reachable from HEAD, newest first.
///
/// Merge commits are skipped: their diff against the first parent repeats
/// changes already attributed to the merged commits.
///
/// # Errors
///
/// Returns [`GitdeepError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use gitdeep_forensics::repository::mine_repository;
///
/// let history = mine_repository(Path::new(".")).unwrap();
/// println!("{} commits", history.len());
/// ```
pub fn mine_repository(repo_path: &Path) -> Result<History, GitdeepError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| GitdeepError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| GitdeepError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk.set_sorting(Sort::TIME).ok();

    if revwalk.push_head().is_err() {
        // unborn HEAD: nothing committed yet
        return Ok(History::empty());
    }

    let mut records = Vec::new();
    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| GitdeepError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| GitdeepError::Git(format!("failed to find commit: {e}")))?;

        if commit.parent_count() > 1 {
            continue;
        }

        let Some(timestamp) = commit_time(&commit) else {
            tracing::debug!(%oid, "commit time out of range, skipping");
            continue;
        };

        let author = commit
            .author()
            .name()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
            .to_string();

        records.push(CommitRecord {
            sha: oid.to_string(),
            timestamp,
            author,
            message: commit.summary().unwrap_or_default().to_string(),
            files: extract_file_changes(&repo, &commit)?,
        });
    }

    Ok(History::newest_first(records))
}

fn commit_time(commit: &git2::Commit) -> Option<DateTime<FixedOffset>> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)?;
    offset.timestamp_opt(time.seconds(), 0).single()
}

fn extract_file_changes(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileChange>, GitdeepError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| GitdeepError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| GitdeepError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| GitdeepError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| GitdeepError::Git(format!("failed to compute diff: {e}")))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| GitdeepError::Git(format!("failed to find renames: {e}")))?;

    // Deltas keep the log order; line counts are filled in afterwards.
    let mut order: Vec<String> = Vec::new();
    for delta in diff.deltas() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        if !path.is_empty() {
            order.push(path);
        }
    }

    let mut line_counts: HashMap<String, (u64, u64)> = HashMap::new();
    diff.foreach(
        &mut |_delta, _progress| true,
        None,
        None,
        Some(&mut |delta, _hunk, line| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();

            let entry = line_counts.entry(path).or_insert((0, 0));
            match line.origin() {
                '+' => entry.0 += 1,
                '-' => entry.1 += 1,
                _ => {}
            }
            true
        }),
    )
    .map_err(|e| GitdeepError::Git(format!("failed to iterate diff lines: {e}")))?;

    Ok(order
        .into_iter()
        .map(|path| {
            let (lines_added, lines_deleted) = line_counts.get(&path).copied().unwrap_or((0, 0));
            FileChange {
                path,
                lines_added,
                lines_deleted,
            }
        })
        .collect())
}
