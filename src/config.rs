//! Resolved configuration (ambient addition to C8): validates CLI args +
//! environment variables into explicit option structs, one per subcommand.
//! Fails fast with a descriptive `eyre!` on hard violations, warns rather
//! than fails on merely suspicious input.

use std::path::PathBuf;
use std::time::Duration;

use eyre::{eyre, Result};

use crate::cli::{AuthArgs, MissingReposArgs, RepoStatsArgs};
use crate::client::AuthMethod;
use crate::ratelimit::GovernorConfig;
use crate::retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub org: String,
    pub auth: AuthMethod,
    pub base_url: String,
    pub proxy_url: Option<String>,
    pub output_dir: PathBuf,
    pub state_file: PathBuf,
    pub resume: bool,
    pub org_page_size: u32,
    pub sub_page_size: u32,
    pub retry: RetryConfig,
    pub governor: GovernorConfig,
    pub rate_limit_check_interval: u32,
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub org: String,
    pub auth: AuthMethod,
    pub base_url: String,
    pub proxy_url: Option<String>,
    pub page_size: u32,
    pub output_file_name: PathBuf,
}

fn resolve_auth(auth: &AuthArgs) -> Result<AuthMethod> {
    if let Some(token) = &auth.access_token {
        return Ok(AuthMethod::Token(token.clone()));
    }

    match (&auth.app_id, &auth.app_private_key_file, &auth.app_installation_id) {
        (Some(app_id), Some(key_path), Some(installation_id)) => {
            let private_key_pem = std::fs::read_to_string(key_path).map_err(|e| {
                eyre!(
                    "failed to read GitHub App private key at {}: {e}",
                    key_path.display()
                )
            })?;
            Ok(AuthMethod::App {
                app_id: *app_id,
                private_key_pem,
                installation_id: *installation_id,
            })
        }
        _ => Err(eyre!(
            "no credentials provided: pass --access-token, or all of --app-id/--app-private-key-file/--app-installation-id"
        )),
    }
}

impl HarvestConfig {
    pub fn from_args(args: &RepoStatsArgs) -> Result<Self> {
        if args.org_name.trim().is_empty() {
            return Err(eyre!("--org-name must not be empty"));
        }
        if args.page_size == 0 {
            return Err(eyre!("--page-size must be > 0"));
        }
        if args.extra_page_size == 0 {
            return Err(eyre!("--extra-page-size must be > 0"));
        }
        if args.retry_max_attempts == 0 {
            return Err(eyre!("--retry-max-attempts must be > 0"));
        }
        if args.retry_backoff_factor <= 1.0 {
            return Err(eyre!("--retry-backoff-factor must be > 1.0"));
        }
        if args.retry_initial_delay_ms > args.retry_max_delay_ms {
            tracing::warn!(
                initial = args.retry_initial_delay_ms,
                max = args.retry_max_delay_ms,
                "initial backoff delay exceeds max delay; clamping initial to max"
            );
        }

        let auth = resolve_auth(&args.auth)?;

        Ok(Self {
            org: args.org_name.clone(),
            auth,
            base_url: args.auth.base_url.clone(),
            proxy_url: args.auth.proxy_url.clone(),
            output_dir: args.output_dir.clone(),
            state_file: args.state_file.clone(),
            resume: args.resume_from_last_save,
            org_page_size: args.page_size,
            sub_page_size: args.extra_page_size,
            retry: RetryConfig {
                max_attempts: args.retry_max_attempts,
                initial_delay: Duration::from_millis(
                    args.retry_initial_delay_ms.min(args.retry_max_delay_ms),
                ),
                max_delay: Duration::from_millis(args.retry_max_delay_ms),
                backoff_factor: args.retry_backoff_factor,
                success_threshold: args.retry_success_threshold.max(1),
            },
            governor: GovernorConfig::default(),
            rate_limit_check_interval: args.rate_limit_check_interval.max(1),
        })
    }
}

impl AuditConfig {
    pub fn from_args(args: &MissingReposArgs) -> Result<Self> {
        if args.org_name.trim().is_empty() {
            return Err(eyre!("--org-name must not be empty"));
        }
        if args.page_size == 0 {
            return Err(eyre!("--page-size must be > 0"));
        }
        let auth = resolve_auth(&args.auth)?;
        Ok(Self {
            org: args.org_name.clone(),
            auth,
            base_url: args.auth.base_url.clone(),
            proxy_url: args.auth.proxy_url.clone(),
            page_size: args.page_size,
            output_file_name: args.output_file_name.clone(),
        })
    }
}
