use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{MixerGuardError, ParamValue, Result};

/// Outcome of recording an observed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Same value as last time; nothing was written.
    Unchanged,
    /// The value differs from the stored one (or none was stored yet).
    Changed { previous: Option<ParamValue> },
}

impl Observation {
    pub fn is_changed(&self) -> bool {
        matches!(self, Observation::Changed { .. })
    }
}

/// Last observed value per watched address, shared between the receive
/// thread and anything else that wants to read it.
///
/// One coarse lock guards the whole map. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    values: Arc<Mutex<HashMap<String, ParamValue>>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `value` with the stored one and stores it when it differs.
    /// The comparison and the write happen under one lock acquisition.
    pub fn observe(&self, address: &str, value: ParamValue) -> Result<Observation> {
        let mut values = self.lock()?;
        match values.get_mut(address) {
            Some(current) if *current == value => Ok(Observation::Unchanged),
            Some(current) => {
                let previous = std::mem::replace(current, value);
                Ok(Observation::Changed {
                    previous: Some(previous),
                })
            }
            None => {
                values.insert(address.to_string(), value);
                Ok(Observation::Changed { previous: None })
            }
        }
    }

    pub fn get(&self, address: &str) -> Result<Option<ParamValue>> {
        Ok(self.lock()?.get(address).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, ParamValue>>> {
        self.values
            .lock()
            .map_err(|_| MixerGuardError::Poisoned("parameter state store"))
    }
}
