//! Logger (C10): a layered `tracing_subscriber` registry fanning out to a
//! console `fmt` layer and an optional rotating-file `fmt` layer.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Must be kept alive for the lifetime of the process — dropping it stops the
/// background flush thread for the file layer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// `org` names the organization being harvested/audited, folded into the log
/// filename per the `<org>-repo-stats-<date>.log` convention.
pub fn init(org: &str, verbose: bool, log_dir: Option<&Path>) -> LoggingGuard {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = fmt::layer().with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingBuilder::new()
                .rotation(Rotation::DAILY)
                .filename_prefix(format!("{org}-repo-stats"))
                .filename_suffix("log")
                .build(dir)
                .expect("failed to build rolling log appender");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    LoggingGuard { _file_guard: guard }
}
