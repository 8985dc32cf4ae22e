use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "statebridge.log";

/// Initialize the tracing/logging subsystem.
///
/// When `to_file` is true, logs are appended to a file in the OS temp directory.
/// Otherwise, logs go nowhere (useful for tests).
pub fn initialize(to_file: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    if to_file
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path())
    {
        let _ = builder.with_writer(file).with_ansi(false).try_init();
        return;
    }

    // Test mode or the log file could not be opened
    let _ = builder
        .with_writer(std::io::sink)
        .with_ansi(false)
        .try_init();
}

/// Return the log file path: {temp_dir}/statebridge.log
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir().join(LOG_FILE_NAME)
}
