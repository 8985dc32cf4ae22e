use thiserror::Error;

use crate::bridge::{BridgeError, PERSIST_PORT, StateBridge};
use crate::runtime::{AppHandle, RuntimeError, UiRuntime};
use crate::store::KeyValueStore;
use crate::worker::ServiceWorker;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("runtime has no '{0}' port")]
    MissingPort(String),
}

/// Start `runtime` from saved state and keep the slot updated from then on.
///
/// Loads the initial state (the bridge's load policy decides whether a bad
/// slot is fatal), starts the runtime with it, connects the bridge to the
/// persist port, then registers `worker`. A registration failure is logged
/// and otherwise ignored.
pub fn bootstrap<S, R, W>(
    bridge: StateBridge<S>,
    runtime: R,
    worker: &W,
) -> Result<R::Handle, BootstrapError>
where
    S: KeyValueStore + 'static,
    R: UiRuntime,
    W: ServiceWorker + ?Sized,
{
    let flags = bridge.load_initial_state()?;
    let mut handle = runtime.init(flags)?;

    let port = handle
        .port_mut(PERSIST_PORT)
        .ok_or_else(|| BootstrapError::MissingPort(PERSIST_PORT.to_string()))?;
    bridge.connect(port);

    if let Err(e) = worker.register() {
        tracing::warn!("worker registration failed: {}", e);
    }

    Ok(handle)
}
