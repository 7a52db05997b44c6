use crate::{OscSink, SendReport, SetCommand};

/// Holds the baseline writes that are re-sent on every cycle, whatever the
/// console currently reports.
#[derive(Debug, Clone, Default)]
pub struct Enforcer {
    commands: Vec<SetCommand>,
}

impl Enforcer {
    /// Creates an enforcer for the given baseline, sent in this order.
    pub fn new(commands: Vec<SetCommand>) -> Self {
        Self { commands }
    }

    /// The baseline writes.
    pub fn commands(&self) -> &[SetCommand] {
        &self.commands
    }

    /// Sends every command once. A failed send is counted and the rest of
    /// the list still goes out.
    pub fn enforce(&self, sink: &dyn OscSink) -> SendReport {
        let mut report = SendReport::default();
        for command in &self.commands {
            report.send(sink, &command.address, Some(&command.value));
        }
        if report.failed > 0 {
            tracing::debug!(
                attempted = report.attempted,
                failed = report.failed,
                "enforcement pass had failures"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use crate::ParamValue;

    fn baseline() -> Enforcer {
        Enforcer::new(vec![
            SetCommand::new("/ch/01/mix/fader", ParamValue::Float32(0.75)),
            SetCommand::new("/ch/02/mix/on", ParamValue::Int32(1)),
            SetCommand::new("/ch/03/mix/on", ParamValue::Int32(0)),
        ])
    }

    #[test]
    fn resends_every_command_every_pass() {
        let sink = RecordingSink::new();
        let enforcer = baseline();

        for _ in 0..4 {
            let report = enforcer.enforce(&sink);
            assert_eq!(report, SendReport { attempted: 3, failed: 0 });
        }

        assert_eq!(sink.sent().len(), 12);
        assert_eq!(sink.sent()[3].address, "/ch/01/mix/fader");
    }

    #[test]
    fn failures_do_not_cut_the_list_short() {
        let sink = RecordingSink::failing();
        let report = baseline().enforce(&sink);

        assert_eq!(report, SendReport { attempted: 3, failed: 3 });
        assert_eq!(
            sink.addresses(),
            vec!["/ch/01/mix/fader", "/ch/02/mix/on", "/ch/03/mix/on"]
        );
    }
}
