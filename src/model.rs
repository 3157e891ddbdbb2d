//! Domain types shared between the remote client facade, the aggregation logic,
//! and the row shaper (§3 Data Model).

use crate::queries::{IssueNodeRaw, PullRequestNodeRaw, RepositoryNodeRaw};

/// A single repository page node from the org walk, carrying the page cursor that
/// advanced *to* it so cursor state can be recovered from any snapshot (§3).
#[derive(Debug, Clone)]
pub struct RepoSnapshot {
    pub name: String,
    pub owner_login: String,
    pub created_at: String,
    pub pushed_at: Option<String>,
    pub updated_at: String,
    pub disk_size_kb: i64,
    pub is_empty: bool,
    pub is_fork: bool,
    pub is_archived: bool,
    pub has_wiki_enabled: bool,
    pub url: String,
    pub branch_count: i64,
    pub tag_count: i64,
    pub protected_branch_count: i64,
    pub collaborator_count: i64,
    pub commit_comment_count: i64,
    pub discussion_count: i64,
    pub milestone_count: i64,
    pub release_count: i64,
    pub project_count: i64,

    pub issue_total_count: i64,
    pub issue_has_next_page: bool,
    pub issue_end_cursor: Option<String>,
    pub first_page_issues: Vec<IssueNode>,

    pub pr_total_count: i64,
    pub pr_has_next_page: bool,
    pub pr_end_cursor: Option<String>,
    pub first_page_pull_requests: Vec<PullRequestNode>,

    /// The page cursor that produced this snapshot (the org iterator's `end_cursor`
    /// for the page this repo belongs to).
    pub page_cursor: Option<String>,
    pub page_has_next_page: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IssueNode {
    pub comment_count: i64,
    pub timeline_event_count: i64,
}

#[derive(Debug, Clone)]
pub struct PullRequestNode {
    pub number: i64,
    pub comment_count: i64,
    pub commit_count: i64,
    pub timeline_event_count: i64,
    pub review_count: i64,
    pub first_page_review_comment_counts: Vec<i64>,
}

impl From<&IssueNodeRaw> for IssueNode {
    fn from(raw: &IssueNodeRaw) -> Self {
        IssueNode {
            comment_count: raw.comments.total_count,
            timeline_event_count: raw.timeline_items.total_count,
        }
    }
}

impl From<&PullRequestNodeRaw> for PullRequestNode {
    fn from(raw: &PullRequestNodeRaw) -> Self {
        PullRequestNode {
            number: raw.number,
            comment_count: raw.comments.total_count,
            commit_count: raw.commits.total_count,
            timeline_event_count: raw.timeline_items.total_count,
            review_count: raw.reviews.total_count,
            first_page_review_comment_counts: raw
                .reviews
                .nodes
                .iter()
                .map(|r| r.comments.total_count)
                .collect(),
        }
    }
}

impl RepoSnapshot {
    pub fn from_raw(raw: RepositoryNodeRaw, page_cursor: Option<String>, page_has_next_page: bool) -> Self {
        let first_page_issues = raw.issues.nodes.iter().map(IssueNode::from).collect();
        let first_page_pull_requests = raw
            .pull_requests
            .nodes
            .iter()
            .map(PullRequestNode::from)
            .collect();

        RepoSnapshot {
            name: raw.name,
            owner_login: raw.owner.login,
            created_at: raw.created_at,
            pushed_at: raw.pushed_at,
            updated_at: raw.updated_at,
            disk_size_kb: raw.disk_usage.unwrap_or(0),
            is_empty: raw.is_empty,
            is_fork: raw.is_fork,
            is_archived: raw.is_archived,
            has_wiki_enabled: raw.has_wiki_enabled,
            url: raw.url,
            branch_count: raw.branches.total_count,
            tag_count: raw.tags.total_count,
            protected_branch_count: raw.branch_protection_rules.total_count,
            collaborator_count: raw.collaborators.map(|t| t.total_count).unwrap_or(0),
            commit_comment_count: raw.commit_comments.total_count,
            discussion_count: raw.discussions.total_count,
            milestone_count: raw.milestones.total_count,
            release_count: raw.releases.total_count,
            project_count: raw.projects.total_count,

            issue_total_count: raw.issues.total_count,
            issue_has_next_page: raw.issues.page_info.has_next_page,
            issue_end_cursor: raw.issues.page_info.end_cursor,
            first_page_issues,

            pr_total_count: raw.pull_requests.total_count,
            pr_has_next_page: raw.pull_requests.page_info.has_next_page,
            pr_end_cursor: raw.pull_requests.page_info.end_cursor,
            first_page_pull_requests,

            page_cursor,
            page_has_next_page,
        }
    }
}
