mod app;
mod bridge;
mod config;
mod log;
#[allow(dead_code)]
mod runtime;
#[allow(dead_code)]
mod store;
mod worker;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use bridge::{PERSIST_PORT, StateBridge};
use config::Config;
use runtime::{AppHandle, PersistedState, ScriptRuntime};
use store::{FileStore, KeyValueStore};
use worker::{NoopWorker, RegistrationFile, ServiceWorker};

#[derive(Parser)]
#[command(
    name = "statebridge",
    about = "Keep an application's state in a storage slot across restarts",
    version
)]
struct Cli {
    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the saved state (null when there is none)
    Show,
    /// Save a JSON document as the current state
    Persist {
        /// The state as JSON text
        state: String,
    },
    /// Start a line-driven runtime on stdin/stdout, saving every state it emits
    Run,
    /// Remove the saved state
    Reset,
    /// Show debug information
    Debug,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::initialize(true);
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => config::get_config_dir()?,
    };
    let config = Config::load(&config_dir)
        .with_context(|| format!("failed to load config from {}", config_dir.display()))?;

    match cli.command {
        Commands::Show => {
            let flags = make_bridge(&config, &config_dir).load_initial_state()?;
            println!("{}", bridge::encode(&flags)?);
            Ok(())
        }
        Commands::Persist { state } => {
            let state: PersistedState =
                serde_json::from_str(&state).context("state is not valid JSON")?;
            make_bridge(&config, &config_dir).persist_state(&state)?;
            println!("State saved to '{}'.", config.storage_key);
            Ok(())
        }
        Commands::Run => {
            let worker: Box<dyn ServiceWorker> = if config.register_worker {
                Box::new(RegistrationFile::new(&config_dir))
            } else {
                Box::new(NoopWorker)
            };
            let runtime = ScriptRuntime::new(std::io::stdin().lock(), std::io::stdout())
                .with_port(PERSIST_PORT);
            let handle = app::bootstrap(make_bridge(&config, &config_dir), runtime, &*worker)?;
            handle.run()?;
            Ok(())
        }
        Commands::Reset => {
            make_store(&config, &config_dir).remove(&config.storage_key)?;
            println!("Saved state reset.");
            Ok(())
        }
        Commands::Debug => {
            let storage_dir = config.storage_dir(&config_dir);
            println!("Debug information:");
            println!("  Config directory: {}", config_dir.display());
            println!("  Storage directory: {}", storage_dir.display());
            println!("  Storage key: {}", config.storage_key);
            println!("  Load policy: {:?}", config.load_policy);
            println!("  Quota: {} bytes", config.quota_bytes);
            println!("  Register worker: {}", config.register_worker);
            println!("  Log file: {}", log::log_file_path().display());
            match RegistrationFile::new(&config_dir).current() {
                Some(reg) => println!(
                    "  Worker: PID {} (v{}) registered {}",
                    reg.pid, reg.version, reg.registered_at
                ),
                None => println!("  Worker: not registered"),
            }
            Ok(())
        }
    }
}

fn make_store(config: &Config, config_dir: &Path) -> FileStore {
    FileStore::new(&config.storage_dir(config_dir)).with_quota(config.quota_bytes)
}

fn make_bridge(config: &Config, config_dir: &Path) -> StateBridge<FileStore> {
    StateBridge::new(make_store(config, config_dir))
        .with_key(config.storage_key.clone())
        .with_policy(config.load_policy)
}
