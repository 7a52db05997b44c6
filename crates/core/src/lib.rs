//! Core library for the Mixer Guard agent.
//!
//! The agent keeps a remote mixing console in line with a declarative rule
//! set over OSC/UDP. It polls watched parameters, reacts to value changes
//! with ordered cascades of writes, and re-asserts a fixed baseline every
//! cycle. Each module owns one piece of that loop: the wire codec, the UDP
//! transport, the dispatcher, the parameter state store, the watch engine,
//! the enforcer, the liveness probe and the control cycle tying them
//! together.

pub mod agent;
pub mod codec;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod enforce;
pub mod engine;
pub mod error;
pub mod probe;
pub mod state;
pub mod transport;
pub mod value;

#[cfg(test)]
mod testing;

pub use agent::Agent;
pub use config::{
    MatchRule, PipelineConfig, PipelineDocument, PipelineSummary, SetCommand, Settings, Verbosity,
    WatchedParameter,
};
pub use control::{ControlLoop, CycleOutcome};
pub use dispatch::Dispatcher;
pub use enforce::Enforcer;
pub use engine::{Reaction, WatchEngine};
pub use error::{MixerGuardError, Result};
pub use probe::{LivenessProbe, ProbeOutcome};
pub use state::{Observation, ParameterStore};
pub use transport::{OscSink, SendReport, UdpTransport};
pub use value::{ParamType, ParamValue};
