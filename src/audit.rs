//! Missing-repo auditor (C7): diffs an org's live repository names against
//! what a previous harvest run actually emitted. Independent of the harvest
//! engine and its state store.

use std::collections::BTreeSet;

use crate::client::GithubClient;
use crate::config::AuditConfig;
use crate::error::HarvestError;
use crate::sink::read_emitted_repo_names;

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub live_count: usize,
    pub emitted_count: usize,
    pub missing: BTreeSet<String>,
}

pub async fn run_audit(client: &GithubClient, cfg: &AuditConfig) -> Result<AuditReport, HarvestError> {
    let emitted = read_emitted_repo_names(&cfg.output_file_name)?;
    let live = client.list_org_repo_names(&cfg.org, cfg.page_size).await?;

    let missing: BTreeSet<String> = live.difference(&emitted).cloned().collect();

    tracing::info!(
        org = %cfg.org,
        live_count = live.len(),
        emitted_count = emitted.len(),
        missing_count = missing.len(),
        "missing-repo audit complete"
    );

    Ok(AuditReport {
        live_count: live.len(),
        emitted_count: emitted.len(),
        missing,
    })
}
