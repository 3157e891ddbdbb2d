use clap::Parser;
use eyre::{eyre, Result};

use repo_stats::cli::{Cli, Command};
use repo_stats::client::GithubClient;
use repo_stats::config::{AuditConfig, HarvestConfig};
use repo_stats::retry::{with_retry, RetryState};
use repo_stats::{audit, engine, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::RepoStats(args) => {
            let _log_guard = logging::init(
                &args.org_name,
                args.logging.verbose,
                args.logging.log_dir.as_deref(),
            );
            let cfg = HarvestConfig::from_args(&args)?;
            run_repo_stats(cfg).await
        }
        Command::MissingRepos(args) => {
            let _log_guard = logging::init(
                &args.org_name,
                args.logging.verbose,
                args.logging.log_dir.as_deref(),
            );
            let cfg = AuditConfig::from_args(&args)?;
            run_missing_repos(cfg).await
        }
    }
}

async fn run_repo_stats(cfg: HarvestConfig) -> Result<()> {
    let client = GithubClient::new(cfg.auth.clone(), &cfg.base_url, cfg.proxy_url.as_deref())
        .await
        .map_err(|e| eyre!("failed to build GitHub client: {e}"))?;

    let retry_cfg = cfg.retry;
    let mut retry_state = RetryState::default();

    let summary = with_retry(
        &retry_cfg,
        &mut retry_state,
        |state| {
            tracing::warn!(
                attempt = state.attempt,
                lifetime_retries = state.lifetime_retries,
                "harvest attempt failed; retrying"
            );
        },
        || engine::run(&client, &cfg),
    )
    .await
    .map_err(|e| eyre!("harvest failed: {e}"))?;

    tracing::info!(
        org = %cfg.org,
        rows_written = summary.rows_written,
        skipped = summary.skipped_already_processed,
        "harvest complete"
    );
    println!(
        "wrote {} row(s) for org '{}' ({} already-processed repos skipped)",
        summary.rows_written, cfg.org, summary.skipped_already_processed
    );
    Ok(())
}

async fn run_missing_repos(cfg: AuditConfig) -> Result<()> {
    let client = GithubClient::new(cfg.auth.clone(), &cfg.base_url, cfg.proxy_url.as_deref())
        .await
        .map_err(|e| eyre!("failed to build GitHub client: {e}"))?;

    let report = audit::run_audit(&client, &cfg)
        .await
        .map_err(|e| eyre!("missing-repo audit failed: {e}"))?;

    println!(
        "org '{}': {} live repositories, {} emitted, {} missing",
        cfg.org,
        report.live_count,
        report.emitted_count,
        report.missing.len()
    );
    for name in &report.missing {
        println!("{name}");
    }
    Ok(())
}
