use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const REGISTRATION_FILE: &str = "worker.json";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("failed to write registration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode registration: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A background service registered once at start-up. Exchanges no data with the bridge.
#[cfg_attr(test, mockall::automock)]
pub trait ServiceWorker {
    fn register(&self) -> Result<(), RegistrationError>;
}

/// Registration that does nothing.
pub struct NoopWorker;

impl ServiceWorker for NoopWorker {
    fn register(&self) -> Result<(), RegistrationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub pid: u32,
    pub version: String,
    pub registered_at: DateTime<Utc>,
}

/// Records the running process in `worker.json` under a directory.
pub struct RegistrationFile {
    dir: PathBuf,
}

impl RegistrationFile {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(REGISTRATION_FILE)
    }

    /// The last registration written, if any can be read.
    pub fn current(&self) -> Option<Registration> {
        let contents = std::fs::read_to_string(self.path()).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

impl ServiceWorker for RegistrationFile {
    fn register(&self) -> Result<(), RegistrationError> {
        std::fs::create_dir_all(&self.dir)?;
        let registration = Registration {
            pid: std::process::id(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registered_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&registration)?;
        std::fs::write(self.path(), contents)?;
        tracing::info!("worker registered with PID {}", registration.pid);
        Ok(())
    }
}
