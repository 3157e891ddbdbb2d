//! Raw GraphQL query strings and response-shape structs for the GitHub API.
//!
//! There is no first-class Rust binding for GitHub's GraphQL schema, so — following
//! the pattern used by GitHub-dashboard tools that hand-roll their queries — each
//! query is a `const` string paired with `serde::Deserialize` structs shaped to
//! match exactly the fields it asks for.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct OrgReposVars {
    pub org: String,
    pub page_size: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubPageVars {
    pub owner: String,
    pub name: String,
    pub page_size: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQlPayload<V> {
    pub query: &'static str,
    pub variables: V,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotalCount {
    #[serde(rename = "totalCount")]
    pub total_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwnerNode {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueConnectionPage {
    #[serde(rename = "totalCount")]
    pub total_count: i64,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub nodes: Vec<IssueNodeRaw>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueNodeRaw {
    pub comments: TotalCount,
    #[serde(rename = "timelineItems")]
    pub timeline_items: TotalCount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewNodeRaw {
    pub comments: TotalCount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConnectionPage {
    #[serde(rename = "totalCount")]
    pub total_count: i64,
    pub nodes: Vec<ReviewNodeRaw>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestNodeRaw {
    pub number: i64,
    pub comments: TotalCount,
    pub commits: TotalCount,
    #[serde(rename = "timelineItems")]
    pub timeline_items: TotalCount,
    pub reviews: ReviewConnectionPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestConnectionPage {
    #[serde(rename = "totalCount")]
    pub total_count: i64,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub nodes: Vec<PullRequestNodeRaw>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryNodeRaw {
    pub name: String,
    pub owner: RepoOwnerNode,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "pushedAt")]
    pub pushed_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "diskUsage")]
    pub disk_usage: Option<i64>,
    #[serde(rename = "isEmpty")]
    pub is_empty: bool,
    #[serde(rename = "isFork")]
    pub is_fork: bool,
    #[serde(rename = "isArchived")]
    pub is_archived: bool,
    #[serde(rename = "hasWikiEnabled")]
    pub has_wiki_enabled: bool,
    pub url: String,
    pub branches: TotalCount,
    pub tags: TotalCount,
    #[serde(rename = "branchProtectionRules")]
    pub branch_protection_rules: TotalCount,
    pub collaborators: Option<TotalCount>,
    #[serde(rename = "commitComments")]
    pub commit_comments: TotalCount,
    pub discussions: TotalCount,
    pub milestones: TotalCount,
    pub releases: TotalCount,
    pub projects: TotalCount,
    pub issues: IssueConnectionPage,
    #[serde(rename = "pullRequests")]
    pub pull_requests: PullRequestConnectionPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConnectionPage {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub nodes: Vec<RepositoryNodeRaw>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationNode {
    pub repositories: RepositoryConnectionPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrgReposData {
    pub organization: OrganizationNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePageData {
    pub repository: IssueConnectionPage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPageData {
    pub repository: PullRequestConnectionPage,
}

pub const ORG_REPOS_QUERY: &str = r#"
query ($org: String!, $page_size: Int!, $after: String) {
  organization(login: $org) {
    repositories(first: $page_size, after: $after, orderBy: {field: NAME, direction: ASC}) {
      pageInfo { hasNextPage endCursor }
      nodes {
        name
        owner { login }
        createdAt
        pushedAt
        updatedAt
        diskUsage
        isEmpty
        isFork
        isArchived
        hasWikiEnabled
        url
        branches: refs(refPrefix: "refs/heads/") { totalCount }
        tags: refs(refPrefix: "refs/tags/") { totalCount }
        branchProtectionRules { totalCount }
        collaborators(affiliation: DIRECT) { totalCount }
        commitComments { totalCount }
        discussions { totalCount }
        milestones { totalCount }
        releases { totalCount }
        projects { totalCount }
        issues(first: 50) {
          totalCount
          pageInfo { hasNextPage endCursor }
          nodes {
            comments { totalCount }
            timelineItems { totalCount }
          }
        }
        pullRequests(first: 50) {
          totalCount
          pageInfo { hasNextPage endCursor }
          nodes {
            number
            comments { totalCount }
            commits { totalCount }
            timelineItems { totalCount }
            reviews(first: 50) {
              totalCount
              nodes { comments { totalCount } }
            }
          }
        }
      }
    }
  }
}
"#;

pub const REPO_ISSUES_PAGE_QUERY: &str = r#"
query ($owner: String!, $name: String!, $page_size: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    issues(first: $page_size, after: $after) {
      totalCount
      pageInfo { hasNextPage endCursor }
      nodes {
        comments { totalCount }
        timelineItems { totalCount }
      }
    }
  }
}
"#;

pub const REPO_PULL_REQUESTS_PAGE_QUERY: &str = r#"
query ($owner: String!, $name: String!, $page_size: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(first: $page_size, after: $after) {
      totalCount
      pageInfo { hasNextPage endCursor }
      nodes {
        number
        comments { totalCount }
        commits { totalCount }
        timelineItems { totalCount }
        reviews(first: 50) {
          totalCount
          nodes { comments { totalCount } }
        }
      }
    }
  }
}
"#;
