//! End-to-end harvest test against a mocked GraphQL/REST surface, following
//! the wiremock `MockServer` + `Mock::given` style used elsewhere in the pack
//! for HTTP-backed integration tests.

use repo_stats::client::{AuthMethod, GithubClient};
use repo_stats::config::HarvestConfig;
use repo_stats::engine;
use repo_stats::ratelimit::GovernorConfig;
use repo_stats::retry::RetryConfig;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn single_repo_page(has_next: bool, cursor: Option<&str>) -> serde_json::Value {
    json!({
        "data": {
            "organization": {
                "repositories": {
                    "pageInfo": { "hasNextPage": has_next, "endCursor": cursor },
                    "nodes": [{
                        "name": "widgets",
                        "owner": { "login": "acme" },
                        "createdAt": "2019-01-01T00:00:00Z",
                        "pushedAt": "2026-01-01T00:00:00Z",
                        "updatedAt": "2026-01-02T00:00:00Z",
                        "diskUsage": 2048,
                        "isEmpty": false,
                        "isFork": false,
                        "isArchived": false,
                        "hasWikiEnabled": true,
                        "url": "https://example.test/acme/widgets",
                        "branches": { "totalCount": 3 },
                        "tags": { "totalCount": 1 },
                        "branchProtectionRules": { "totalCount": 1 },
                        "collaborators": { "totalCount": 4 },
                        "commitComments": { "totalCount": 0 },
                        "discussions": { "totalCount": 0 },
                        "milestones": { "totalCount": 2 },
                        "releases": { "totalCount": 1 },
                        "projects": { "totalCount": 0 },
                        "issues": {
                            "totalCount": 1,
                            "pageInfo": { "hasNextPage": false, "endCursor": null },
                            "nodes": [{ "comments": { "totalCount": 2 }, "timelineItems": { "totalCount": 5 } }]
                        },
                        "pullRequests": {
                            "totalCount": 0,
                            "pageInfo": { "hasNextPage": false, "endCursor": null },
                            "nodes": []
                        }
                    }]
                }
            }
        }
    })
}

#[tokio::test]
async fn harvests_a_single_page_single_repo_org() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(single_repo_page(false, None)))
        .mount(&server)
        .await;

    let client = GithubClient::new(AuthMethod::Token("test-token".into()), &server.uri(), None)
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let cfg = HarvestConfig {
        org: "acme".to_string(),
        auth: AuthMethod::Token("test-token".into()),
        base_url: server.uri(),
        proxy_url: None,
        output_dir: dir.path().to_path_buf(),
        state_file: dir.path().join("state.json"),
        resume: false,
        org_page_size: 25,
        sub_page_size: 50,
        retry: RetryConfig::default(),
        governor: GovernorConfig::default(),
        rate_limit_check_interval: 1000,
    };

    let summary = engine::run(&client, &cfg).await.unwrap();
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.skipped_already_processed, 0);

    let (state, _) = repo_stats::state::load(&cfg.state_file, true);
    assert!(state.completed_successfully);
    assert_eq!(state.processed_repos, vec!["widgets".to_string()]);

    let output_file = dir
        .path()
        .join(state.output_file_name.clone().unwrap());
    let contents = std::fs::read_to_string(output_file).unwrap();
    assert!(contents.contains("widgets"));
    assert!(contents.contains("acme"));
}

#[tokio::test]
async fn resuming_an_incomplete_run_skips_already_processed_repos() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(single_repo_page(false, None)))
        .mount(&server)
        .await;

    let client = GithubClient::new(AuthMethod::Token("test-token".into()), &server.uri(), None)
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    // Seed a state file as if a prior attempt already wrote this repo's row
    // but the run was interrupted before completion (I1/I3).
    let mut seed = repo_stats::state::ProcessedState::default();
    seed.processed_repos.push("widgets".to_string());
    seed.last_processed_repo = Some("widgets".to_string());
    repo_stats::state::save(&seed, &state_path).unwrap();

    let cfg = HarvestConfig {
        org: "acme".to_string(),
        auth: AuthMethod::Token("test-token".into()),
        base_url: server.uri(),
        proxy_url: None,
        output_dir: dir.path().to_path_buf(),
        state_file: state_path,
        resume: true,
        org_page_size: 25,
        sub_page_size: 50,
        retry: RetryConfig::default(),
        governor: GovernorConfig::default(),
        rate_limit_check_interval: 1000,
    };

    let summary = engine::run(&client, &cfg).await.unwrap();
    assert_eq!(summary.rows_written, 0);
    assert_eq!(summary.skipped_already_processed, 1);
}
