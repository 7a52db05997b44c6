use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::{Enforcer, LivenessProbe, OscSink, ProbeOutcome, SendReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The probe could not be sent; polling and enforcement were skipped.
    BackedOff,
    /// Probe, polls and enforcement all went out (individual sends may have failed).
    Completed {
        polls: SendReport,
        enforced: SendReport,
    },
}

/// The main cycle: probe, poll every watched parameter, enforce the baseline,
/// sleep, repeat. Replies to the polls arrive on the receive thread.
pub struct ControlLoop {
    sink: Arc<dyn OscSink>,
    probe: LivenessProbe,
    polled: Vec<String>,
    enforcer: Enforcer,
    poll_interval: Duration,
    probe_backoff: Duration,
}

impl ControlLoop {
    /// Creates a loop with the default 500 ms cadence and 2 s probe backoff.
    pub fn new(
        sink: Arc<dyn OscSink>,
        probe: LivenessProbe,
        polled: Vec<String>,
        enforcer: Enforcer,
    ) -> Self {
        Self {
            sink,
            probe,
            polled,
            enforcer,
            poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
            probe_backoff: crate::config::DEFAULT_PROBE_BACKOFF,
        }
    }

    /// Overrides the pause after a completed cycle and after a failed probe.
    pub fn with_timing(mut self, poll_interval: Duration, probe_backoff: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.probe_backoff = probe_backoff;
        self
    }

    /// One pass without the trailing sleep.
    pub fn run_cycle(&self) -> CycleOutcome {
        let sink = self.sink.as_ref();
        if self.probe.probe(sink) == ProbeOutcome::SendFailed {
            return CycleOutcome::BackedOff;
        }

        let mut polls = SendReport::default();
        for address in &self.polled {
            polls.send(sink, address, None);
        }

        let enforced = self.enforcer.enforce(sink);
        CycleOutcome::Completed { polls, enforced }
    }

    /// Runs `cycles` passes including the pause after each one.
    pub fn run_for(&self, cycles: usize) -> Vec<CycleOutcome> {
        (0..cycles).map(|_| self.step()).collect()
    }

    /// Runs until the process is terminated.
    pub fn run(&self) -> ! {
        tracing::info!(
            polled = self.polled.len(),
            enforced = self.enforcer.commands().len(),
            interval = ?self.poll_interval,
            "control loop started"
        );
        loop {
            self.step();
        }
    }

    fn step(&self) -> CycleOutcome {
        let outcome = self.run_cycle();
        match outcome {
            CycleOutcome::BackedOff => {
                tracing::info!(backoff = ?self.probe_backoff, "retrying cycle after backoff");
                thread::sleep(self.probe_backoff);
            }
            CycleOutcome::Completed { .. } => thread::sleep(self.poll_interval),
        }
        outcome
    }
}

impl std::fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("probe", &self.probe)
            .field("polled", &self.polled)
            .field("enforcer", &self.enforcer)
            .field("poll_interval", &self.poll_interval)
            .field("probe_backoff", &self.probe_backoff)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::STATUS_ADDRESS;
    use crate::testing::RecordingSink;
    use crate::{ParamValue, SetCommand};

    fn control(sink: &Arc<RecordingSink>) -> ControlLoop {
        ControlLoop::new(
            sink.clone(),
            LivenessProbe::default(),
            vec!["/config/mute/2".to_string(), "/ch/01/mix/on".to_string()],
            Enforcer::new(vec![
                SetCommand::new("/ch/01/mix/fader", ParamValue::Float32(0.75)),
                SetCommand::new("/ch/02/mix/on", ParamValue::Int32(1)),
                SetCommand::new("/ch/03/mix/on", ParamValue::Int32(0)),
            ]),
        )
        .with_timing(Duration::from_millis(1), Duration::from_millis(1))
    }

    #[test]
    fn cycle_probes_then_polls_then_enforces() {
        let sink = Arc::new(RecordingSink::new());
        let outcome = control(&sink).run_cycle();

        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                polls: SendReport { attempted: 2, failed: 0 },
                enforced: SendReport { attempted: 3, failed: 0 },
            }
        );
        assert_eq!(
            sink.addresses(),
            vec![
                STATUS_ADDRESS,
                "/config/mute/2",
                "/ch/01/mix/on",
                "/ch/01/mix/fader",
                "/ch/02/mix/on",
                "/ch/03/mix/on",
            ]
        );
        let sent = sink.sent();
        assert!(sent[1].arg.is_none() && sent[2].arg.is_none());
    }

    #[test]
    fn enforcement_repeats_every_cycle() {
        let sink = Arc::new(RecordingSink::new());
        let cycles = 5;
        control(&sink).run_for(cycles);

        let enforced = sink
            .addresses()
            .into_iter()
            .filter(|a| a.starts_with("/ch/0") && a != "/ch/01/mix/on")
            .count();
        assert_eq!(enforced, 3 * cycles);
    }

    #[test]
    fn failed_probe_skips_polling_and_enforcement() {
        let sink = Arc::new(RecordingSink::failing());
        let outcomes = control(&sink).run_for(2);

        assert_eq!(outcomes, vec![CycleOutcome::BackedOff, CycleOutcome::BackedOff]);
        assert_eq!(sink.addresses(), vec![STATUS_ADDRESS, STATUS_ADDRESS]);
    }
}
