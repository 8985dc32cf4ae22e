use super::PersistedState;

type Subscriber = Box<dyn FnMut(&PersistedState)>;

/// A named outbound channel. Delivery is synchronous and in subscription order.
pub struct Port {
    name: String,
    subscribers: Vec<Subscriber>,
}

impl Port {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a handler for every value sent on this port.
    pub fn subscribe(&mut self, handler: impl FnMut(&PersistedState) + 'static) {
        self.subscribers.push(Box::new(handler));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `value` to each subscriber, each running to completion.
    pub fn send(&mut self, value: &PersistedState) {
        tracing::trace!(port = %self.name, "sending to {} subscribers", self.subscribers.len());
        for subscriber in self.subscribers.iter_mut() {
            subscriber(value);
        }
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
