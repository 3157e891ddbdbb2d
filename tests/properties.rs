//! Property-based tests for the algebraic laws from the design note: the
//! record-count law (P7) and the disk-size MB derivation (P9).

use proptest::prelude::*;
use repo_stats::aggregate::{IssueAggregate, PullRequestAggregate};
use repo_stats::model::RepoSnapshot;
use repo_stats::row::shape_row;

#[allow(clippy::too_many_arguments)]
fn arb_snapshot(
    collaborator_count: i64,
    protected_branch_count: i64,
    pr_total_count: i64,
    milestone_count: i64,
    issue_total_count: i64,
    release_count: i64,
    project_count: i64,
    disk_size_kb: i64,
    commit_comment_count: i64,
) -> RepoSnapshot {
    RepoSnapshot {
        name: "repo".into(),
        owner_login: "acme".into(),
        created_at: "2020-01-01T00:00:00Z".into(),
        pushed_at: None,
        updated_at: "2020-01-01T00:00:00Z".into(),
        disk_size_kb,
        is_empty: false,
        is_fork: false,
        is_archived: false,
        has_wiki_enabled: false,
        url: "https://example.test/acme/repo".into(),
        branch_count: 0,
        tag_count: 0,
        protected_branch_count,
        collaborator_count,
        commit_comment_count,
        discussion_count: 0,
        milestone_count,
        release_count,
        project_count,
        issue_total_count,
        issue_has_next_page: false,
        issue_end_cursor: None,
        first_page_issues: vec![],
        pr_total_count,
        pr_has_next_page: false,
        pr_end_cursor: None,
        first_page_pull_requests: vec![],
        page_cursor: None,
        page_has_next_page: false,
    }
}

proptest! {
    /// P7: record count equals the declared sum of every component, for any
    /// combination of non-negative snapshot/aggregate inputs.
    #[test]
    fn record_count_matches_the_declared_sum(
        collaborator_count in 0i64..10_000,
        protected_branch_count in 0i64..100,
        pr_total_count in 0i64..5_000,
        milestone_count in 0i64..500,
        issue_total_count in 0i64..20_000,
        release_count in 0i64..1_000,
        project_count in 0i64..200,
        review_comment_count in 0i64..5_000,
        repo_commit_comment_count in 0i64..5_000,
        pr_commit_comment_count in 0i64..5_000,
        issue_comment_count in 0i64..5_000,
        issue_event_count in -5_000i64..5_000,
    ) {
        let snapshot = arb_snapshot(
            collaborator_count, protected_branch_count, pr_total_count,
            milestone_count, issue_total_count, release_count, project_count, 0,
            repo_commit_comment_count,
        );
        let issues = IssueAggregate {
            issue_comment_count,
            issue_event_count,
        };
        let prs = PullRequestAggregate {
            issue_event_count: 0,
            issue_comment_count: 0,
            review_count: 0,
            review_comment_count,
            commit_comment_count: pr_commit_comment_count,
        };

        let row = shape_row("acme", &snapshot, &issues, &prs);

        // The record-count law sums the *emitted columns*, not the raw
        // per-source aggregates — Commit_Comment_Count is the repo-level and
        // PR-derived counts combined, which row.commit_comment_count already is.
        let expected = collaborator_count
            + protected_branch_count
            + pr_total_count * 2
            + milestone_count
            + issue_total_count
            + review_comment_count
            + row.commit_comment_count
            + row.issue_comment_count
            + row.issue_event_count
            + release_count
            + project_count;

        prop_assert_eq!(row.record_count, expected);
    }

    /// P9: disk size in MB is always floor(kB / 1024), never rounded up.
    #[test]
    fn disk_mb_is_always_floor_division(disk_size_kb in 0i64..50_000_000) {
        let snapshot = arb_snapshot(0, 0, 0, 0, 0, 0, 0, disk_size_kb, 0);
        let row = shape_row(
            "acme",
            &snapshot,
            &IssueAggregate::default(),
            &PullRequestAggregate::default(),
        );
        prop_assert_eq!(row.repo_size_mb, disk_size_kb / 1024);
        prop_assert!(row.repo_size_mb * 1024 <= disk_size_kb);
    }

    /// P9 corollary: the migration-risk flag is monotonic in disk size once
    /// record count is held at zero — crossing the 1500MB line always flips it.
    #[test]
    fn migration_flag_is_monotonic_in_disk_size(mb in 0i64..5_000) {
        let kb = mb * 1024;
        let snapshot = arb_snapshot(0, 0, 0, 0, 0, 0, 0, kb, 0);
        let row = shape_row(
            "acme",
            &snapshot,
            &IssueAggregate::default(),
            &PullRequestAggregate::default(),
        );
        prop_assert_eq!(row.migration_issue, mb > 1_500);
    }
}
