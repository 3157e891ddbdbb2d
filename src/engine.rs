//! Harvest engine (C5): drives the client facade, retry envelope, rate-limit
//! governor, state store, aggregation, row shaper, and row sink into a single
//! resumable traversal.
//!
//! The state machine from the design note is expressed as a single async
//! function with explicit phases rather than an enum-dispatched loop — the
//! phases are sequential within one repo and the "state" that actually needs
//! representing across restarts already lives in [`ProcessedState`].

use chrono::Utc;

use crate::aggregate::{aggregate_issues, aggregate_pull_requests};
use crate::client::GithubClient;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::ratelimit::{GovernorDirective, RateLimitGovernor};
use crate::row::shape_row;
use crate::sink::{default_output_file_name, RowSink};
use crate::state::{self, ProcessedState, StateUpdate};

#[derive(Debug, Clone, Default)]
pub struct HarvestSummary {
    pub rows_written: usize,
    pub skipped_already_processed: usize,
}

/// Runs one full (or resumed) harvest pass. On success, the state file's
/// `completed_successfully` flag is set. On any remote/aggregation error, the
/// state's `current_cursor` is rewound to `last_successful_cursor` before the
/// error propagates, so the caller's retry envelope resumes cleanly.
pub async fn run(client: &GithubClient, cfg: &HarvestConfig) -> Result<HarvestSummary, HarvestError> {
    let state_path = cfg.state_file.clone();
    let (mut processed, _resumed) = state::load(&state_path, cfg.resume);

    let output_file_name = match &processed.output_file_name {
        Some(name) => name.clone(),
        None => {
            let name = default_output_file_name(&cfg.org, Utc::now());
            processed.output_file_name = Some(name.clone());
            name
        }
    };
    let output_path = cfg.output_dir.join(&output_file_name);
    let sink = RowSink::new(&output_path);

    let mut governor = RateLimitGovernor::new();
    let mut summary = HarvestSummary::default();

    let result = run_inner(
        client,
        cfg,
        &mut processed,
        &state_path,
        &sink,
        &mut governor,
        &mut summary,
    )
    .await;

    match result {
        Ok(()) => {
            if summary.rows_written > 0 && processed.current_cursor.is_none() {
                processed.completed_successfully = true;
            }
            if let Err(save_err) = state::save(&processed, &state_path) {
                tracing::error!(error = %save_err, "failed to persist final state; continuing in-memory");
            }
            Ok(summary)
        }
        Err(err) => {
            processed.current_cursor = processed.last_successful_cursor.clone();
            if let Err(save_err) = state::save(&processed, &state_path) {
                tracing::error!(error = %save_err, "failed to persist rewound cursor after failure");
            }
            Err(err)
        }
    }
}

async fn run_inner(
    client: &GithubClient,
    cfg: &HarvestConfig,
    processed: &mut ProcessedState,
    state_path: &std::path::Path,
    sink: &RowSink,
    governor: &mut RateLimitGovernor,
    summary: &mut HarvestSummary,
) -> Result<(), HarvestError> {
    let start_cursor = processed
        .current_cursor
        .clone()
        .or_else(|| processed.last_successful_cursor.clone());

    let mut pager = client.iterate_org_repositories(&cfg.org, cfg.org_page_size, start_cursor);

    loop {
        let Some(snapshot) = pager.next().await? else {
            break;
        };

        if snapshot.page_cursor != processed.current_cursor {
            state::update(
                processed,
                state_path,
                StateUpdate {
                    new_cursor: snapshot.page_cursor.clone(),
                    ..Default::default()
                },
            );
        }

        if processed.has_processed(&snapshot.name) {
            summary.skipped_already_processed += 1;
            continue;
        }

        let (issues, pull_requests) = tokio::join!(
            aggregate_issues(client, &cfg.org, &snapshot.name, &snapshot, cfg.sub_page_size),
            aggregate_pull_requests(client, &cfg.org, &snapshot.name, &snapshot, cfg.sub_page_size),
        );
        let issues = issues?;
        let pull_requests = pull_requests?;

        let row = shape_row(&cfg.org, &snapshot, &issues, &pull_requests);
        sink.append(&row)?;

        state::update(
            processed,
            state_path,
            StateUpdate {
                repo_name: Some(snapshot.name.clone()),
                last_successful_cursor: processed.current_cursor.clone(),
                ..Default::default()
            },
        );
        summary.rows_written += 1;

        if summary.rows_written as u32 % cfg.rate_limit_check_interval == 0 {
            let probe = client.probe_rate_limits().await?;
            match governor.evaluate(&cfg.governor, &probe) {
                GovernorDirective::Continue => {}
                GovernorDirective::Pause { retry_after } => {
                    tracing::info!(pause_seconds = retry_after.as_secs(), "pausing for rate limit recovery");
                    return Err(HarvestError::RateLimit(probe.message));
                }
                GovernorDirective::Fatal(message) => {
                    return Err(HarvestError::RateLimit(message));
                }
            }
        }
    }

    Ok(())
}
