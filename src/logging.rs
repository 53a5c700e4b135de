use std::fs;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,flowdeck=debug"))
}

/// Initialize file-backed logging for TUI mode; the terminal belongs to
/// ratatui, so nothing may write to stdout/stderr while it runs.
pub fn init_file() -> Result<()> {
    let path = Config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_target(true)
                .compact(),
        )
        .init();

    tracing::debug!("logging to {}", path.display());
    Ok(())
}

/// Stderr logging for one-shot CLI commands.
pub fn init_stderr() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
