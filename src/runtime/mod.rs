pub mod port;
pub mod script;

pub use port::Port;
pub use script::{ScriptHandle, ScriptRuntime};

use thiserror::Error;

/// The UI runtime's full application state at a point in time.
pub type PersistedState = serde_json::Value;

/// Initial flags handed to the runtime. `None` means there is no prior state.
pub type Flags = Option<PersistedState>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid message on line {line}: {source}")]
    InvalidMessage {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode flags: {0}")]
    Flags(#[source] serde_json::Error),
}

/// A UI runtime that can be started once with initial flags.
pub trait UiRuntime {
    type Handle: AppHandle;

    fn init(self, flags: Flags) -> Result<Self::Handle, RuntimeError>;
}

/// The owned handle of a started runtime.
pub trait AppHandle {
    /// Look up an outbound port by name.
    fn port_mut(&mut self, name: &str) -> Option<&mut Port>;

    /// Drive the runtime until it has no more events.
    fn run(self) -> Result<(), RuntimeError>;
}
