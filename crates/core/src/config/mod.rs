use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rosc::OscType;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::{MixerGuardError, ParamType, ParamValue, Result};

/// Default OSC port of the console.
pub const DEFAULT_MIXER_PORT: u16 = 10023;
/// Default cadence of the main control cycle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Pause between consecutive commands of one cascade.
pub const DEFAULT_CASCADE_DELAY: Duration = Duration::from_millis(10);
/// Pause before retrying a cycle whose liveness probe could not be sent.
pub const DEFAULT_PROBE_BACKOFF: Duration = Duration::from_secs(2);

/// Process-level settings, gathered from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mixer_ip: IpAddr,
    pub mixer_port: u16,
    pub local_ip: IpAddr,
    pub verbosity: Verbosity,
    pub config_path: PathBuf,
    pub poll_interval: Duration,
    pub cascade_delay: Duration,
    pub probe_backoff: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mixer_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 56, 3)),
            mixer_port: DEFAULT_MIXER_PORT,
            local_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 56, 1)),
            verbosity: Verbosity::Silent,
            config_path: PathBuf::from("pipeline.yaml"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cascade_delay: DEFAULT_CASCADE_DELAY,
            probe_backoff: DEFAULT_PROBE_BACKOFF,
        }
    }
}

impl Settings {
    /// Address every outbound datagram is sent to.
    pub fn mixer_addr(&self) -> SocketAddr {
        SocketAddr::new(self.mixer_ip, self.mixer_port)
    }

    /// Local address to bind; the port is chosen by the OS.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.local_ip, 0)
    }
}

/// How much diagnostic output the agent produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Fatal errors only.
    Silent,
    /// Value changes and the cascades they dispatch.
    Changes,
    /// Everything, including raw wire bytes.
    Full,
}

impl Verbosity {
    /// Maps the numeric command line level; anything above 2 is `Full`.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Silent,
            1 => Verbosity::Changes,
            _ => Verbosity::Full,
        }
    }

    /// Log filter directive used when `RUST_LOG` is not set.
    pub fn filter_directive(self) -> &'static str {
        match self {
            Verbosity::Silent => "error",
            Verbosity::Changes => "info",
            Verbosity::Full => "trace",
        }
    }
}

/// Raw YAML document as written by the operator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineDocument {
    #[serde(default)]
    pub watch_on: Vec<WatchEntry>,
    #[serde(default)]
    pub set: Vec<SetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchEntry {
    pub parameter: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionEntry {
    pub value: Value,
    #[serde(default)]
    pub set: Vec<SetEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub value: Value,
}

/// One outbound write: an address and the typed value to send there.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCommand {
    pub address: String,
    pub value: ParamValue,
}

impl SetCommand {
    pub fn new(address: impl Into<String>, value: ParamValue) -> Self {
        Self {
            address: address.into(),
            value,
        }
    }

    pub fn param_type(&self) -> ParamType {
        self.value.param_type()
    }
}

/// A trigger value and the cascade executed when it is observed.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRule {
    pub trigger: ParamValue,
    pub actions: Vec<SetCommand>,
}

/// A device parameter that is polled every cycle and reacted to on change.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchedParameter {
    pub address: String,
    pub declared_type: ParamType,
    pub rules: Vec<MatchRule>,
}

impl WatchedParameter {
    /// First rule whose trigger equals `value`, in declaration order.
    pub fn matching_rule(&self, value: &ParamValue) -> Option<(usize, &MatchRule)> {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| &rule.trigger == value)
    }
}

/// Validated, immutable rule set the agent runs with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub watched: Vec<WatchedParameter>,
    pub enforced: Vec<SetCommand>,
}

/// Counts reported by `mixer-guard check`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineSummary {
    pub watched_parameters: usize,
    pub rules: usize,
    pub cascade_commands: usize,
    pub enforced_commands: usize,
}

impl PipelineConfig {
    /// Reads and validates the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: PipelineDocument = serde_yaml::from_str(content)?;
        Self::from_document(&document)
    }

    /// Validates a raw document. Either every entry is valid or an error is
    /// returned; nothing is partially accepted.
    pub fn from_document(document: &PipelineDocument) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut watched = Vec::with_capacity(document.watch_on.len());

        for (index, entry) in document.watch_on.iter().enumerate() {
            let location = format!("watch_on[{index}]");
            validate_address(&location, &entry.parameter)?;
            if !seen.insert(entry.parameter.as_str()) {
                return Err(MixerGuardError::invalid_config(
                    location,
                    format!("parameter {} is watched more than once", entry.parameter),
                ));
            }

            let rules = entry
                .actions
                .iter()
                .enumerate()
                .map(|(rule_index, action)| -> Result<MatchRule> {
                    let location = format!("{location}.actions[{rule_index}]");
                    Ok(MatchRule {
                        trigger: literal_value(&location, entry.param_type, &action.value)?,
                        actions: set_commands(&format!("{location}.set"), &action.set)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            watched.push(WatchedParameter {
                address: entry.parameter.clone(),
                declared_type: entry.param_type,
                rules,
            });
        }

        Ok(Self {
            watched,
            enforced: set_commands("set", &document.set)?,
        })
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            watched_parameters: self.watched.len(),
            rules: self.watched.iter().map(|w| w.rules.len()).sum(),
            cascade_commands: self
                .watched
                .iter()
                .flat_map(|w| &w.rules)
                .map(|r| r.actions.len())
                .sum(),
            enforced_commands: self.enforced.len(),
        }
    }
}

fn set_commands(location: &str, entries: &[SetEntry]) -> Result<Vec<SetCommand>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<SetCommand> {
            let location = format!("{location}[{index}]");
            validate_address(&location, &entry.path)?;
            let value = literal_value(&location, entry.param_type, &entry.value)?;
            Ok(SetCommand::new(entry.path.clone(), value))
        })
        .collect()
}

fn validate_address(location: &str, address: &str) -> Result<()> {
    if !address.starts_with('/') {
        return Err(MixerGuardError::invalid_config(
            location,
            format!("address {address:?} must start with '/'"),
        ));
    }
    Ok(())
}

/// Converts a YAML literal into a value of the declared type.
fn literal_value(location: &str, declared: ParamType, literal: &Value) -> Result<ParamValue> {
    let mismatch = || {
        MixerGuardError::invalid_config(
            location,
            format!("value {literal:?} is not a valid {declared}"),
        )
    };

    match declared {
        ParamType::Int32 => match literal {
            Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    i32::try_from(v).map(ParamValue::Int32).map_err(|_| mismatch())
                } else {
                    n.as_f64()
                        .filter(|v| {
                            v.is_finite() && (i32::MIN as f64..=i32::MAX as f64).contains(v)
                        })
                        .map(|v| ParamValue::Int32(v as i32))
                        .ok_or_else(mismatch)
                }
            }
            _ => Err(mismatch()),
        },
        ParamType::Float32 => match literal {
            Value::Number(n) => n
                .as_f64()
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .map(ParamValue::Float32)
                .ok_or_else(mismatch),
            _ => Err(mismatch()),
        },
        ParamType::Opaque => {
            let arg = match literal {
                Value::String(s) => OscType::String(s.clone()),
                Value::Bool(b) => OscType::Bool(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(v) => match i32::try_from(v) {
                        Ok(small) => OscType::Int(small),
                        Err(_) => OscType::Long(v),
                    },
                    None => OscType::Float(n.as_f64().ok_or_else(mismatch)? as f32),
                },
                _ => return Err(mismatch()),
            };
            Ok(ParamValue::Opaque(arg))
        }
    }
}
