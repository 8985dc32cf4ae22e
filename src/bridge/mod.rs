//! Persist the runtime's application state to one storage slot and restore it
//! at start-up.
//!
//! The slot holds the state as compact JSON text. Reading happens once, before
//! the runtime starts; every notification on the runtime's persist port then
//! overwrites the slot with the full new state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::{Flags, PersistedState, Port};
use crate::store::{KeyValueStore, StoreError};

/// Key of the storage slot. Changing it orphans every existing saved state.
pub const STORAGE_KEY: &str = "elm-todo-save";

/// Name of the outbound port the runtime announces state changes on.
pub const PERSIST_PORT: &str = "setStorage";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to read saved state: {0}")]
    StoreRead(#[source] StoreError),
    #[error("failed to write state: {0}")]
    StoreWrite(#[source] StoreError),
    #[error("saved state is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
}

/// What to do when the saved state cannot be read or decoded at start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Report the failure to the caller.
    #[default]
    Strict,
    /// Log the failure and start without prior state.
    Permissive,
}

/// Decode slot text into initial flags.
///
/// Empty text and a JSON `null` both mean "no state".
pub fn decode(text: &str) -> Result<Flags, serde_json::Error> {
    if text.is_empty() {
        return Ok(None);
    }
    let value: PersistedState = serde_json::from_str(text)?;
    Ok(match value {
        PersistedState::Null => None,
        other => Some(other),
    })
}

/// Encode a state as compact JSON.
pub fn encode<T: Serialize + ?Sized>(state: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(state)
}

pub struct StateBridge<S> {
    store: S,
    key: String,
    policy: LoadPolicy,
}

impl<S: KeyValueStore> StateBridge<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: STORAGE_KEY.to_string(),
            policy: LoadPolicy::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read and decode the slot. Never writes to the store.
    pub fn load_initial_state(&self) -> Result<Flags, BridgeError> {
        let text = match self.store.get(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no saved state");
                return Ok(None);
            }
            Err(e) => return self.degrade(BridgeError::StoreRead(e)),
        };

        match decode(&text) {
            Ok(flags) => {
                tracing::info!(key = %self.key, bytes = text.len(), "loaded saved state");
                Ok(flags)
            }
            Err(e) => self.degrade(BridgeError::Decode(e)),
        }
    }

    fn degrade(&self, err: BridgeError) -> Result<Flags, BridgeError> {
        match self.policy {
            LoadPolicy::Strict => Err(err),
            LoadPolicy::Permissive => {
                tracing::warn!(key = %self.key, "starting without saved state: {}", err);
                Ok(None)
            }
        }
    }

    /// Encode `state` and overwrite the slot with it.
    pub fn persist_state<T: Serialize + ?Sized>(&self, state: &T) -> Result<(), BridgeError> {
        let text = encode(state).map_err(BridgeError::Encode)?;
        self.store
            .set(&self.key, &text)
            .map_err(BridgeError::StoreWrite)?;
        tracing::debug!(key = %self.key, bytes = text.len(), "persisted state");
        Ok(())
    }
}

impl<S: KeyValueStore + 'static> StateBridge<S> {
    /// Persist every value sent on `port` for as long as the port lives.
    ///
    /// A failed write is logged and dropped; the runtime keeps its in-memory state.
    pub fn connect(self, port: &mut Port) {
        tracing::debug!(port = %port.name(), key = %self.key, "bridge connected");
        port.subscribe(move |state| {
            if let Err(e) = self.persist_state(state) {
                tracing::warn!(key = %self.key, "state change not persisted: {}", e);
            }
        });
    }
}
