//! Invocation layer (C8): `clap`-derived CLI with two subcommands, every
//! option carrying an `env` fallback and shared flag groups pulled in with
//! `#[command(flatten)]`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "repo-stats", version, about = "Per-repository GitHub organization stats harvester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Harvest per-repository stats for an organization into a CSV file.
    RepoStats(RepoStatsArgs),
    /// Diff an org's live repository names against a previously emitted file.
    MissingRepos(MissingReposArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AuthArgs {
    /// Personal access token. If omitted, GitHub App flags must be set instead.
    #[arg(long, env = "GITHUB_TOKEN")]
    pub access_token: Option<String>,

    /// GitHub App id, for App-based auth.
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app_id: Option<u64>,

    /// Path to the GitHub App's PEM private key file.
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_FILE")]
    pub app_private_key_file: Option<PathBuf>,

    /// GitHub App installation id to mint an installation token for.
    #[arg(long, env = "GITHUB_APP_INSTALLATION_ID")]
    pub app_installation_id: Option<u64>,

    /// Base URL of the GitHub API (override for GitHub Enterprise).
    #[arg(long, env = "GITHUB_BASE_URL", default_value = "https://api.github.com")]
    pub base_url: String,

    /// Optional HTTP(S) proxy URL.
    #[arg(long, env = "HTTPS_PROXY")]
    pub proxy_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Enable debug-level console logging.
    #[arg(long, env = "REPO_STATS_VERBOSE", default_value_t = false)]
    pub verbose: bool,

    /// Directory for the rotating daily log file. Omit to log to console only.
    #[arg(long, env = "REPO_STATS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RepoStatsArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,

    /// GitHub organization (login) to harvest.
    #[arg(long, env = "ORG_NAME")]
    pub org_name: String,

    /// Directory the CSV output and state files are written to.
    #[arg(long, env = "REPO_STATS_OUTPUT_DIR", default_value = "output")]
    pub output_dir: PathBuf,

    /// Path to the durable progress-state JSON file.
    #[arg(long, env = "REPO_STATS_STATE_FILE", default_value = "last_known_state.json")]
    pub state_file: PathBuf,

    /// Resume from a previous incomplete run's state, if present.
    #[arg(long, env = "REPO_STATS_RESUME", default_value_t = false)]
    pub resume_from_last_save: bool,

    /// Repositories fetched per organization page.
    #[arg(long, env = "REPO_STATS_PAGE_SIZE", default_value_t = 10)]
    pub page_size: u32,

    /// Issues/pull-requests fetched per sub-pagination page.
    #[arg(long, env = "REPO_STATS_EXTRA_PAGE_SIZE", default_value_t = 50)]
    pub extra_page_size: u32,

    /// Maximum attempts before a retryable action gives up.
    #[arg(long, env = "REPO_STATS_RETRY_MAX_ATTEMPTS", default_value_t = 3)]
    pub retry_max_attempts: u32,

    /// Initial backoff delay in milliseconds.
    #[arg(long, env = "REPO_STATS_RETRY_INITIAL_DELAY_MS", default_value_t = 1000)]
    pub retry_initial_delay_ms: u64,

    /// Maximum backoff delay in milliseconds.
    #[arg(long, env = "REPO_STATS_RETRY_MAX_DELAY_MS", default_value_t = 30_000)]
    pub retry_max_delay_ms: u64,

    /// Backoff multiplier applied per failed attempt.
    #[arg(long, env = "REPO_STATS_RETRY_BACKOFF_FACTOR", default_value_t = 2.0)]
    pub retry_backoff_factor: f64,

    /// Consecutive successes required to reset the retry counter.
    #[arg(long, env = "REPO_STATS_RETRY_SUCCESS_THRESHOLD", default_value_t = 5)]
    pub retry_success_threshold: u32,

    /// Probe remaining rate-limit quota every N processed repos.
    #[arg(long, env = "REPO_STATS_RATE_LIMIT_CHECK_INTERVAL", default_value_t = 60)]
    pub rate_limit_check_interval: u32,
}

#[derive(Args, Debug, Clone)]
pub struct MissingReposArgs {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(flatten)]
    pub logging: LoggingArgs,

    /// GitHub organization (login) to audit.
    #[arg(long, env = "ORG_NAME")]
    pub org_name: String,

    /// Repositories fetched per organization page, for the live-name listing.
    #[arg(long, env = "REPO_STATS_PAGE_SIZE", default_value_t = 10)]
    pub page_size: u32,

    /// Previously emitted CSV file to diff the live repository set against.
    #[arg(long, env = "REPO_STATS_OUTPUT_FILE_NAME")]
    pub output_file_name: PathBuf,
}
