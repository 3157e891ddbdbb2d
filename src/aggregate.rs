//! Issue and pull-request aggregation (§4.5.2).
//!
//! Both aggregations fold first-page embedded nodes first, then continue via
//! the client facade's sub-pagers only when the parent snapshot reports more
//! pages. Negative event counts are preserved literally — see the design note
//! on aggregation anomalies.

use crate::client::GithubClient;
use crate::error::HarvestError;
use crate::model::RepoSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueAggregate {
    pub issue_comment_count: i64,
    pub issue_event_count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullRequestAggregate {
    pub issue_event_count: i64,
    pub issue_comment_count: i64,
    pub review_count: i64,
    pub review_comment_count: i64,
    pub commit_comment_count: i64,
}

/// A PR's commit count is capped before it is folded into the "redundant" tally
/// that offsets timeline events, so a PR with an unusually large commit history
/// doesn't drive the event count deeply negative on its own.
const MAX_COMMITS_FOR_REDUNDANCY: i64 = 250;

pub async fn aggregate_issues(
    client: &GithubClient,
    owner: &str,
    repo: &str,
    snapshot: &RepoSnapshot,
    page_size: u32,
) -> Result<IssueAggregate, HarvestError> {
    if snapshot.issue_total_count <= 0 {
        return Ok(IssueAggregate::default());
    }

    let mut comments_sum = 0i64;
    let mut timeline_sum = 0i64;
    for node in &snapshot.first_page_issues {
        comments_sum += node.comment_count;
        timeline_sum += node.timeline_event_count;
    }

    let mut agg = IssueAggregate {
        issue_comment_count: comments_sum,
        issue_event_count: timeline_sum - comments_sum,
    };

    if snapshot.issue_has_next_page && snapshot.issue_end_cursor.is_some() {
        let mut pager = client.iterate_repo_issues(
            owner,
            repo,
            page_size,
            snapshot.issue_end_cursor.clone(),
        );
        loop {
            let next = pager.next().await.map_err(|e| {
                tracing::error!(owner, repo, error = %e, "issue sub-page fetch failed; consider reducing page size");
                e
            })?;
            let Some(node) = next else { break };
            agg.issue_event_count += node.timeline_event_count - node.comment_count;
            agg.issue_comment_count += node.comment_count;
        }
    }

    Ok(agg)
}

pub async fn aggregate_pull_requests(
    client: &GithubClient,
    owner: &str,
    repo: &str,
    snapshot: &RepoSnapshot,
    page_size: u32,
) -> Result<PullRequestAggregate, HarvestError> {
    if snapshot.pr_total_count <= 0 {
        return Ok(PullRequestAggregate::default());
    }

    let mut agg = PullRequestAggregate::default();

    for node in &snapshot.first_page_pull_requests {
        fold_pull_request(&mut agg, owner, repo, node.number, node.comment_count, node.commit_count, node.timeline_event_count, node.review_count, &node.first_page_review_comment_counts);
    }

    if snapshot.pr_has_next_page && snapshot.pr_end_cursor.is_some() {
        let mut pager = client.iterate_repo_pull_requests(
            owner,
            repo,
            page_size,
            snapshot.pr_end_cursor.clone(),
        );
        loop {
            let next = pager.next().await.map_err(|e| {
                tracing::error!(owner, repo, error = %e, "pull request sub-page fetch failed; consider reducing page size");
                e
            })?;
            let Some(node) = next else { break };
            fold_pull_request(
                &mut agg,
                owner,
                repo,
                node.number,
                node.comment_count,
                node.commit_count,
                node.timeline_event_count,
                node.review_count,
                &node.first_page_review_comment_counts,
            );
        }
    }

    Ok(agg)
}

#[allow(clippy::too_many_arguments)]
fn fold_pull_request(
    agg: &mut PullRequestAggregate,
    owner: &str,
    repo: &str,
    number: i64,
    comments: i64,
    commits: i64,
    timeline: i64,
    review_count: i64,
    review_comment_counts: &[i64],
) {
    let redundant = comments + commits.min(MAX_COMMITS_FOR_REDUNDANCY);
    if redundant > timeline {
        tracing::warn!(
            owner,
            repo,
            pr_number = number,
            comments,
            commits,
            timeline,
            redundant,
            "pull request has more redundant events than timeline events"
        );
    }

    // Deliberately unclamped: a negative contribution here is preserved as-is
    // in the final row rather than floored to zero.
    agg.issue_event_count += timeline - redundant;
    agg.issue_comment_count += comments;
    agg.review_count += review_count;
    agg.review_comment_count += review_comment_counts.iter().sum::<i64>();
    agg.commit_comment_count += commits;
}
