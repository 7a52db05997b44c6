use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rosc::OscMessage;

use crate::{
    Dispatcher, Observation, OscSink, ParamValue, ParameterStore, SendReport, SetCommand,
    WatchedParameter,
};

/// What the engine did with one inbound message for a watched address.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// The message carried no argument to compare.
    NoArguments,
    /// The argument could not be read as the declared type.
    TypeMismatch,
    /// The state store could not be accessed.
    StoreUnavailable,
    /// Same value as last observed; deduplicated.
    Unchanged,
    /// Value changed and was stored, but no rule matched it.
    NoMatch { value: ParamValue },
    /// Value changed and the rule at `rule` ran its cascade.
    Fired {
        value: ParamValue,
        rule: usize,
        report: SendReport,
    },
}

/// Reacts to value reports from the console: change detection against the
/// [`ParameterStore`] followed by first-match rule evaluation.
pub struct WatchEngine {
    sink: Arc<dyn OscSink>,
    store: ParameterStore,
    cascade_delay: Duration,
}

impl WatchEngine {
    /// Creates an engine that sends cascades through `sink`, pausing
    /// `cascade_delay` after each command.
    pub fn new(sink: Arc<dyn OscSink>, store: ParameterStore, cascade_delay: Duration) -> Self {
        Self {
            sink,
            store,
            cascade_delay,
        }
    }

    /// State store holding the last value seen per watched address.
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// Registers one handler per watched parameter on `dispatcher`.
    pub fn install(self: &Arc<Self>, dispatcher: &mut Dispatcher, watched: &[WatchedParameter]) {
        for watch in watched {
            let engine = Arc::clone(self);
            let watch = watch.clone();
            let pattern = watch.address.clone();
            dispatcher.register(&pattern, move |message| {
                engine.handle(&watch, message);
            });
        }
    }

    /// Processes one inbound message addressed to `watch`.
    ///
    /// The whole cascade, including its pacing delays, runs before this
    /// returns, so cascades for the same address never interleave.
    pub fn handle(&self, watch: &WatchedParameter, message: &OscMessage) -> Reaction {
        let Some(arg) = message.args.first() else {
            tracing::trace!(address = %message.addr, "no arguments in OSC message");
            return Reaction::NoArguments;
        };

        let Some(value) = ParamValue::from_wire(watch.declared_type, arg) else {
            tracing::debug!(
                address = %message.addr,
                declared = %watch.declared_type,
                arg = ?arg,
                "argument does not match declared type"
            );
            return Reaction::TypeMismatch;
        };

        match self.store.observe(&watch.address, value.clone()) {
            Ok(Observation::Unchanged) => return Reaction::Unchanged,
            Ok(Observation::Changed { previous }) => {
                tracing::info!(
                    address = %message.addr,
                    args = ?message.args,
                    previous = ?previous,
                    "parameter changed"
                );
            }
            Err(err) => {
                tracing::error!(address = %watch.address, error = %err, "cannot record value");
                return Reaction::StoreUnavailable;
            }
        }

        match watch.matching_rule(&value) {
            Some((rule, matched)) => {
                tracing::info!(
                    address = %watch.address,
                    value = %value,
                    rule,
                    commands = matched.actions.len(),
                    "running cascade"
                );
                let report = self.run_cascade(&matched.actions);
                Reaction::Fired {
                    value,
                    rule,
                    report,
                }
            }
            None => Reaction::NoMatch { value },
        }
    }

    /// Sends each command in order, pausing after every send so the console
    /// has time to apply it.
    pub fn run_cascade(&self, commands: &[SetCommand]) -> SendReport {
        let mut report = SendReport::default();
        for command in commands {
            report.send(self.sink.as_ref(), &command.address, Some(&command.value));
            thread::sleep(self.cascade_delay);
        }
        report
    }
}

impl std::fmt::Debug for WatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchEngine")
            .field("cascade_delay", &self.cascade_delay)
            .finish()
    }
}
