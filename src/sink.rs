//! Row sink (C11): append-only CSV writer with header-once-if-absent
//! semantics, plus the output filename convention.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::HarvestError;
use crate::row::OutputRow;

pub struct RowSink {
    path: PathBuf,
}

impl RowSink {
    /// Opens (or prepares to open) the sink at `path`. Nothing touches disk
    /// until the first [`RowSink::append`] call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, writing the header first iff the file is currently
    /// absent or empty. Flushes after every row so a crash mid-harvest loses
    /// at most the in-flight row, never a previously accepted one.
    pub fn append(&self, row: &OutputRow) -> Result<(), HarvestError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let needs_header = !self.path.exists()
            || std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}

pub const HEADER: &[&str] = &[
    "Org_Name",
    "Repo_Name",
    "Is_Empty",
    "Last_Push",
    "Last_Update",
    "isFork",
    "isArchived",
    "Disk_Size_kb",
    "Repo_Size_mb",
    "Record_Count",
    "Collaborator_Count",
    "Protected_Branch_Count",
    "PR_Review_Count",
    "PR_Review_Comment_Count",
    "Commit_Comment_Count",
    "Milestone_Count",
    "PR_Count",
    "Project_Count",
    "Branch_Count",
    "Release_Count",
    "Issue_Count",
    "Issue_Event_Count",
    "Issue_Comment_Count",
    "Tag_Count",
    "Discussion_Count",
    "Has_Wiki",
    "Full_URL",
    "Migration_Issue",
    "Created",
];

/// `<org-lowercased>-all_repos-YYYYMMDDHHMM_ts.csv`, computed once at harvest
/// start. The caller persists the result into `ProcessedState.output_file_name`
/// so a resumed run keeps writing to the same file.
pub fn default_output_file_name(org: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-all_repos-{}_ts.csv",
        org.to_lowercase(),
        now.format("%Y%m%d%H%M")
    )
}

/// Reads the `Repo_Name` column of an existing output file into a set, used by
/// the missing-repo auditor (C7). Returns an empty set if the file is absent.
pub fn read_emitted_repo_names(
    path: impl AsRef<Path>,
) -> Result<std::collections::HashSet<String>, HarvestError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(std::collections::HashSet::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let name_idx = headers
        .iter()
        .position(|h| h == "Repo_Name")
        .ok_or_else(|| HarvestError::Sink("output file is missing a Repo_Name column".to_string()))?;

    let mut names = std::collections::HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(name) = record.get(name_idx) {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}
