use std::collections::HashMap;
use std::fmt;

use rosc::OscMessage;

/// Pattern that matches every inbound message.
pub const WILDCARD: &str = "*";

type Handler = Box<dyn Fn(&OscMessage) + Send + Sync>;

/// Routes decoded inbound messages to handlers.
///
/// A literal pattern matches only that exact address. The wildcard handler, if
/// any, fires for every message in addition to the literal match. Handlers run
/// synchronously on the caller's thread.
#[derive(Default)]
pub struct Dispatcher {
    exact: HashMap<String, Handler>,
    wildcard: Option<Handler>,
}

impl Dispatcher {
    /// Creates a dispatcher with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `pattern`, replacing any earlier registration
    /// for the same pattern.
    pub fn register<F>(&mut self, pattern: &str, handler: F)
    where
        F: Fn(&OscMessage) + Send + Sync + 'static,
    {
        let replaced = if pattern == WILDCARD {
            self.wildcard.replace(Box::new(handler)).is_some()
        } else {
            self.exact
                .insert(pattern.to_string(), Box::new(handler))
                .is_some()
        };
        if replaced {
            tracing::warn!(pattern, "replaced existing handler");
        }
    }

    /// Invokes every handler that applies to `message` and returns how many ran.
    pub fn dispatch(&self, message: &OscMessage) -> usize {
        let mut invoked = 0;
        if let Some(handler) = self.exact.get(&message.addr) {
            handler(message);
            invoked += 1;
        }
        if let Some(handler) = &self.wildcard {
            handler(message);
            invoked += 1;
        }
        invoked
    }

    /// Number of registered patterns, the wildcard included.
    pub fn len(&self) -> usize {
        self.exact.len() + usize::from(self.wildcard.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("patterns", &self.exact.keys().collect::<Vec<_>>())
            .field("wildcard", &self.wildcard.is_some())
            .finish()
    }
}
