/// Result alias that carries the custom [`MixerGuardError`] type.
pub type Result<T> = std::result::Result<T, MixerGuardError>;

/// Common error type for the core crate.
///
/// Startup failures (`Io` on bind, `Yaml`, `InvalidConfig`) are fatal and
/// propagate out of the binary. Everything raised while the agent is running
/// is reported to the caller, logged and then dropped.
#[derive(Debug, thiserror::Error)]
pub enum MixerGuardError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors (socket bind, send, receive, file reads).
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration document is not valid YAML or misses required fields.
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The configuration parsed but describes something the agent cannot run.
    #[error("invalid configuration at {location}: {reason}")]
    InvalidConfig { location: String, reason: String },
    /// An outbound message could not be encoded.
    #[error("failed to encode OSC message for {address}: {reason}")]
    Encode { address: String, reason: String },
    /// An inbound datagram could not be decoded.
    #[error("failed to decode OSC packet: {0}")]
    Decode(String),
    /// A shared lock was poisoned by a panicking thread.
    #[error("{0} has been poisoned")]
    Poisoned(&'static str),
}

impl MixerGuardError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates an [`MixerGuardError::InvalidConfig`] for the entry at `location`.
    pub fn invalid_config(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for MixerGuardError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MixerGuardError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
