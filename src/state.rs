//! Durable processed-page state (C4).
//!
//! Same atomic temp-file-then-rename write and read-or-init load path as any
//! durable JSON progress record: cursor bookkeeping for a GraphQL page walk
//! rather than a block height or transaction ledger.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedState {
    #[serde(default)]
    pub current_cursor: Option<String>,
    #[serde(default)]
    pub last_successful_cursor: Option<String>,
    #[serde(default)]
    pub last_processed_repo: Option<String>,
    #[serde(default)]
    pub last_updated: u64,
    #[serde(default)]
    pub completed_successfully: bool,
    #[serde(default)]
    pub processed_repos: Vec<String>,
    #[serde(default)]
    pub output_file_name: Option<String>,
}

impl Default for ProcessedState {
    fn default() -> Self {
        Self {
            current_cursor: None,
            last_successful_cursor: None,
            last_processed_repo: None,
            last_updated: 0,
            completed_successfully: false,
            processed_repos: Vec::new(),
            output_file_name: None,
        }
    }
}

/// Fields an `update` call may overwrite. `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub repo_name: Option<String>,
    pub new_cursor: Option<String>,
    pub last_successful_cursor: Option<String>,
}

impl ProcessedState {
    pub fn processed_repo_set(&self) -> HashSet<&str> {
        self.processed_repos.iter().map(String::as_str).collect()
    }

    pub fn has_processed(&self, repo_name: &str) -> bool {
        self.processed_repos.iter().any(|r| r == repo_name)
    }

    fn touch(&mut self) {
        self.last_updated = now_unix();
    }
}

/// Loads state from `path`, per §4.3:
/// - absent file: fresh default state, `resume = false`.
/// - present and `completed_successfully`: logs and returns a fresh default
///   state, `resume = false` (a finished run is never silently resumed).
/// - present, not completed, caller requested resume: loaded state, `resume = true`.
/// - present, not completed, caller did not request resume: fresh default
///   state, `resume = false` (an explicit fresh start discards old progress).
///
/// A malformed file is logged at error level and treated as absent rather
/// than failing the invocation.
pub fn load(path: impl AsRef<Path>, resume_requested: bool) -> (ProcessedState, bool) {
    let path = path.as_ref();
    if !path.exists() {
        return (ProcessedState::default(), false);
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "failed to read state file; starting fresh");
            return (ProcessedState::default(), false);
        }
    };

    let parsed: Result<ProcessedState, _> = serde_json::from_str(&raw);
    let state = match parsed {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "state file is malformed; starting fresh");
            return (ProcessedState::default(), false);
        }
    };

    if state.completed_successfully {
        tracing::info!(path = %path.display(), "previous run completed successfully; starting fresh");
        return (ProcessedState::default(), false);
    }

    if !resume_requested {
        return (ProcessedState::default(), false);
    }

    (state, true)
}

/// Applies `update` to `state`, bumps `last_updated`, and persists. Persistence
/// failures are logged and swallowed: the in-memory state remains authoritative
/// for the remainder of the run (§4.3).
pub fn update(state: &mut ProcessedState, path: impl AsRef<Path>, delta: StateUpdate) {
    if let Some(cursor) = delta.new_cursor {
        state.current_cursor = Some(cursor);
    }
    if let Some(cursor) = delta.last_successful_cursor {
        state.last_successful_cursor = Some(cursor);
    }
    if let Some(repo) = delta.repo_name {
        if !state.has_processed(&repo) {
            state.processed_repos.push(repo.clone());
        }
        state.last_processed_repo = Some(repo);
    }
    state.touch();

    if let Err(err) = save(state, &path) {
        tracing::error!(path = %path.as_ref().display(), error = %err, "failed to persist state; continuing in-memory");
    }
}

/// Atomic-ish write: serialize to a temp file, then rename over the real path.
/// Includes the Windows remove-then-rename fallback since `fs::rename` there
/// fails when the destination already exists.
pub fn save(state: &ProcessedState, path: impl AsRef<Path>) -> Result<(), HarvestError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        if cfg!(windows) {
            let _ = fs::remove_file(path);
            fs::rename(&tmp_path, path)?;
        } else {
            return Err(HarvestError::State(format!(
                "failed to replace state file {}: {err}",
                path.display()
            )));
        }
    }
    Ok(())
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_absent_file_is_fresh_no_resume() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let (state, resume) = load(&path, true);
        assert!(!resume);
        assert_eq!(state.processed_repos.len(), 0);
    }

    #[test]
    fn completed_run_is_never_resumed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = ProcessedState::default();
        state.completed_successfully = true;
        state.processed_repos.push("repo-a".to_string());
        save(&state, &path).unwrap();

        let (loaded, resume) = load(&path, true);
        assert!(!resume);
        assert!(loaded.processed_repos.is_empty());
    }

    #[test]
    fn malformed_file_is_treated_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not valid json").unwrap();
        let (state, resume) = load(&path, true);
        assert!(!resume);
        assert_eq!(state.processed_repos.len(), 0);
    }

    #[test]
    fn resume_requires_explicit_request() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = ProcessedState::default();
        state.processed_repos.push("repo-a".to_string());
        save(&state, &path).unwrap();

        let (fresh, no_resume) = load(&path, false);
        assert!(!no_resume);
        assert!(fresh.processed_repos.is_empty());

        let (resumed, did_resume) = load(&path, true);
        assert!(did_resume);
        assert_eq!(resumed.processed_repos, vec!["repo-a".to_string()]);
    }

    #[test]
    fn update_is_idempotent_on_repeated_repo_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = ProcessedState::default();

        update(
            &mut state,
            &path,
            StateUpdate {
                repo_name: Some("repo-a".to_string()),
                new_cursor: Some("cursor-1".to_string()),
                last_successful_cursor: Some("cursor-1".to_string()),
            },
        );
        update(
            &mut state,
            &path,
            StateUpdate {
                repo_name: Some("repo-a".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(state.processed_repos, vec!["repo-a".to_string()]);
        assert_eq!(state.current_cursor.as_deref(), Some("cursor-1"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = ProcessedState::default();
        state.current_cursor = Some("abc".to_string());
        state.output_file_name = Some("acme-all_repos-202601010000_ts.csv".to_string());
        save(&state, &path).unwrap();

        let (loaded, resume) = load(&path, true);
        assert!(resume);
        assert_eq!(loaded.current_cursor.as_deref(), Some("abc"));
        assert_eq!(
            loaded.output_file_name.as_deref(),
            Some("acme-all_repos-202601010000_ts.csv")
        );
    }
}
