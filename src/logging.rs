//! Logging setup: stderr plus a per-session log file.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` (default `floatwm=debug,info`). When
/// `log_dir` is given, the log file inside it is truncated and receives the
/// same records without ANSI colors.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "floatwm=debug,info".into()),
    );

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).context("Failed to create log directory")?;
            let path = dir.join(format!("{}.log", crate::config::APP_NAME));
            let file = File::create(&path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
