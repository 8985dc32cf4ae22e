use std::io::{BufRead, Write};

use super::{AppHandle, Flags, PersistedState, Port, RuntimeError, UiRuntime};

/// A headless runtime driven by one JSON document per input line.
///
/// On `init` the flags are written to the mount as a single JSON line
/// (`null` for no prior state). Each subsequent input line is treated as the
/// application's new state and sent on every port the runtime exposes.
pub struct ScriptRuntime<R, W> {
    input: R,
    mount: W,
    ports: Vec<String>,
}

impl<R: BufRead, W: Write> ScriptRuntime<R, W> {
    pub fn new(input: R, mount: W) -> Self {
        Self {
            input,
            mount,
            ports: Vec::new(),
        }
    }

    /// Declare an outbound port.
    pub fn with_port(mut self, name: impl Into<String>) -> Self {
        self.ports.push(name.into());
        self
    }
}

impl<R: BufRead, W: Write> UiRuntime for ScriptRuntime<R, W> {
    type Handle = ScriptHandle<R, W>;

    fn init(mut self, flags: Flags) -> Result<Self::Handle, RuntimeError> {
        let line = serde_json::to_string(&flags).map_err(RuntimeError::Flags)?;
        writeln!(self.mount, "{}", line)?;
        self.mount.flush()?;

        Ok(ScriptHandle {
            input: self.input,
            mount: self.mount,
            flags,
            ports: self.ports.into_iter().map(Port::new).collect(),
        })
    }
}

pub struct ScriptHandle<R, W> {
    input: R,
    mount: W,
    flags: Flags,
    ports: Vec<Port>,
}

impl<R, W> ScriptHandle<R, W> {
    /// The flags the runtime was started with.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn into_mount(self) -> W {
        self.mount
    }
}

impl<R: BufRead, W: Write> ScriptHandle<R, W> {
    fn dispatch(&mut self, state: &PersistedState) {
        for port in self.ports.iter_mut() {
            port.send(state);
        }
    }

    /// Process input until EOF; returns the number of states dispatched.
    pub fn run_to_end(&mut self) -> Result<usize, RuntimeError> {
        let mut dispatched = 0;
        let mut line_no = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let state: PersistedState = serde_json::from_str(trimmed)
                .map_err(|source| RuntimeError::InvalidMessage { line: line_no, source })?;
            self.dispatch(&state);
            dispatched += 1;
        }
        tracing::info!("runtime finished after {} state changes", dispatched);
        Ok(dispatched)
    }
}

impl<R: BufRead, W: Write> AppHandle for ScriptHandle<R, W> {
    fn port_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.name() == name)
    }

    fn run(mut self) -> Result<(), RuntimeError> {
        self.run_to_end().map(|_| ())
    }
}
