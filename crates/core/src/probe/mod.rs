use crate::OscSink;

/// Status query sent ahead of every cycle.
pub const STATUS_ADDRESS: &str = "/status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The query left the socket. No reply is awaited.
    Sent,
    /// The query could not be sent; the cycle should back off.
    SendFailed,
}

/// Advisory connectivity check. It never waits for the console's reply, so
/// the only failure it can see is a local send error.
#[derive(Debug, Clone)]
pub struct LivenessProbe {
    address: String,
}

impl Default for LivenessProbe {
    fn default() -> Self {
        Self::new(STATUS_ADDRESS)
    }
}

impl LivenessProbe {
    /// Creates a probe that queries `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Sends the status query without waiting for a reply.
    pub fn probe(&self, sink: &dyn OscSink) -> ProbeOutcome {
        match sink.send(&self.address, None) {
            Ok(()) => ProbeOutcome::Sent,
            Err(err) => {
                tracing::warn!(error = %err, "no connection to mixer");
                ProbeOutcome::SendFailed
            }
        }
    }
}
