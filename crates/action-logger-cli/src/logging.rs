use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use action_logger_core::storage::{today, DAY_FORMAT};
use action_logger_core::AppConfig;

/// Diagnostics go to stderr, or to `<diagnostics_dir>/<YYYY-MM-DD>.log` when configured.
/// Stdout is left alone: it carries `logs` output and the stdio tool protocol.
///
/// A diagnostics file that cannot be opened never stops a command; output
/// falls back to stderr and the failure is reported there.
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
    );

    let diagnostics = config.diagnostics_dir().map(|dir| open_diagnostics(&dir));

    match diagnostics {
        Some(Ok(file)) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        Some(Err(e)) => {
            init_stderr(filter);
            warn!(error = %format!("{:#}", e), "Diagnostics file unavailable, logging to stderr");
        }
        None => init_stderr(filter),
    }
}

fn init_stderr(filter: EnvFilter) {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Open (creating if needed) today's diagnostics file under `dir`
fn open_diagnostics(dir: &Path) -> Result<File> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create diagnostics dir {}", dir.display()))?;
    let path = dir.join(format!("{}.log", today().format(DAY_FORMAT)));
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open diagnostics log {}", path.display()))
}
