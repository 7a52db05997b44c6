//! Test doubles shared by the unit tests of several modules.

use std::sync::Mutex;
use std::time::Instant;

use crate::{MixerGuardError, OscSink, ParamValue, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub address: String,
    pub arg: Option<ParamValue>,
    pub at: Instant,
}

/// Records every attempted send. When built with [`RecordingSink::failing`]
/// each send is still recorded but reported as an error.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.address).collect()
    }
}

impl OscSink for RecordingSink {
    fn send(&self, address: &str, arg: Option<&ParamValue>) -> Result<()> {
        self.sent.lock().unwrap().push(Sent {
            address: address.to_string(),
            arg: arg.cloned(),
            at: Instant::now(),
        });
        if self.fail {
            return Err(MixerGuardError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "console unreachable",
            )));
        }
        Ok(())
    }
}
