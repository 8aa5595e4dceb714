//! Logging setup for hosts that do not install their own subscriber.
//!
//! The session usually runs on the same terminal it drives, so logs go to a
//! file rather than stderr whenever a path is given.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::FmtSubscriber;

/// Install a global fmt subscriber.
///
/// `default_level` is used when `RUST_LOG` is unset or invalid. Returns
/// `false` if the log file cannot be opened or a subscriber is already set.
pub fn init(default_level: &str, log_path: Option<&Path>) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = match log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => file,
                Err(_) => return false,
            };
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
    };

    if installed {
        tracing::info!("etlink {} logging initialized", env!("CARGO_PKG_VERSION"));
    }
    installed
}
