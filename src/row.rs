//! Row shaper (C6): pure mapping from a repository snapshot plus its
//! aggregate counts into the flat, 29-column output record.

use serde::Serialize;

use crate::aggregate::{IssueAggregate, PullRequestAggregate};
use crate::model::RepoSnapshot;

/// Record count ≥ this threshold flags a repository as migration risk (§3).
const MIGRATION_RECORD_COUNT_THRESHOLD: i64 = 60_000;
/// Disk size in MB strictly greater than this also flags migration risk.
const MIGRATION_DISK_MB_THRESHOLD: i64 = 1_500;

#[derive(Debug, Clone, Serialize)]
pub struct OutputRow {
    #[serde(rename = "Org_Name")]
    pub org_name: String,
    #[serde(rename = "Repo_Name")]
    pub repo_name: String,
    #[serde(rename = "Is_Empty")]
    pub is_empty: bool,
    #[serde(rename = "Last_Push")]
    pub last_push: String,
    #[serde(rename = "Last_Update")]
    pub last_update: String,
    #[serde(rename = "isFork")]
    pub is_fork: bool,
    #[serde(rename = "isArchived")]
    pub is_archived: bool,
    #[serde(rename = "Disk_Size_kb")]
    pub disk_size_kb: i64,
    #[serde(rename = "Repo_Size_mb")]
    pub repo_size_mb: i64,
    #[serde(rename = "Record_Count")]
    pub record_count: i64,
    #[serde(rename = "Collaborator_Count")]
    pub collaborator_count: i64,
    #[serde(rename = "Protected_Branch_Count")]
    pub protected_branch_count: i64,
    #[serde(rename = "PR_Review_Count")]
    pub pr_review_count: i64,
    #[serde(rename = "PR_Review_Comment_Count")]
    pub pr_review_comment_count: i64,
    #[serde(rename = "Commit_Comment_Count")]
    pub commit_comment_count: i64,
    #[serde(rename = "Milestone_Count")]
    pub milestone_count: i64,
    #[serde(rename = "PR_Count")]
    pub pr_count: i64,
    #[serde(rename = "Project_Count")]
    pub project_count: i64,
    #[serde(rename = "Branch_Count")]
    pub branch_count: i64,
    #[serde(rename = "Release_Count")]
    pub release_count: i64,
    #[serde(rename = "Issue_Count")]
    pub issue_count: i64,
    #[serde(rename = "Issue_Event_Count")]
    pub issue_event_count: i64,
    #[serde(rename = "Issue_Comment_Count")]
    pub issue_comment_count: i64,
    #[serde(rename = "Tag_Count")]
    pub tag_count: i64,
    #[serde(rename = "Discussion_Count")]
    pub discussion_count: i64,
    #[serde(rename = "Has_Wiki")]
    pub has_wiki: bool,
    #[serde(rename = "Full_URL")]
    pub full_url: String,
    #[serde(rename = "Migration_Issue")]
    pub migration_issue: bool,
    #[serde(rename = "Created")]
    pub created: String,
}

/// Maps a repository snapshot and its pre-computed aggregates into the flat
/// output record. `Issue_Event_Count`/`Issue_Comment_Count` are the sum of the
/// issue-only and PR-derived contributions — the header carries one column
/// for each, not one per source.
pub fn shape_row(
    org_name: &str,
    snapshot: &RepoSnapshot,
    issues: &IssueAggregate,
    pull_requests: &PullRequestAggregate,
) -> OutputRow {
    let repo_size_mb = (snapshot.disk_size_kb / 1024).max(0);
    let issue_event_count = issues.issue_event_count + pull_requests.issue_event_count;
    let issue_comment_count = issues.issue_comment_count + pull_requests.issue_comment_count;

    let commit_comment_count = snapshot.commit_comment_count + pull_requests.commit_comment_count;

    let record_count = snapshot.collaborator_count
        + snapshot.protected_branch_count
        + snapshot.pr_total_count * 2 // counted once as PR count, once as review count
        + snapshot.milestone_count
        + snapshot.issue_total_count
        + pull_requests.review_comment_count
        + commit_comment_count
        + issue_comment_count
        + issue_event_count
        + snapshot.release_count
        + snapshot.project_count;

    let migration_issue = record_count >= MIGRATION_RECORD_COUNT_THRESHOLD
        || repo_size_mb > MIGRATION_DISK_MB_THRESHOLD;

    OutputRow {
        org_name: org_name.to_string(),
        repo_name: snapshot.name.clone(),
        is_empty: snapshot.is_empty,
        last_push: snapshot.pushed_at.clone().unwrap_or_default(),
        last_update: snapshot.updated_at.clone(),
        is_fork: snapshot.is_fork,
        is_archived: snapshot.is_archived,
        disk_size_kb: snapshot.disk_size_kb,
        repo_size_mb,
        record_count,
        collaborator_count: snapshot.collaborator_count,
        protected_branch_count: snapshot.protected_branch_count,
        pr_review_count: pull_requests.review_count,
        pr_review_comment_count: pull_requests.review_comment_count,
        commit_comment_count,
        milestone_count: snapshot.milestone_count,
        pr_count: snapshot.pr_total_count,
        project_count: snapshot.project_count,
        branch_count: snapshot.branch_count,
        release_count: snapshot.release_count,
        issue_count: snapshot.issue_total_count,
        issue_event_count,
        issue_comment_count,
        tag_count: snapshot.tag_count,
        discussion_count: snapshot.discussion_count,
        has_wiki: snapshot.has_wiki_enabled,
        full_url: snapshot.url.clone(),
        migration_issue,
        created: snapshot.created_at.clone(),
    }
}
