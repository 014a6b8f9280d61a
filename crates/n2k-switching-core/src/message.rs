//! Typed views of the two bank messages.
//!
//! Outbound reports and inbound control commands travel through the host as
//! JSON field maps. They are converted to these structures at the boundary so
//! the rest of the crate never touches untyped fields.

use serde_json::{Map, Value};

use crate::codec::SwitchState;
use crate::constants::{fields, MAX_INDICATORS, PGN_SWITCH_BANK_CONTROL, PGN_SWITCH_BANK_STATUS};
use crate::error::{Error, Result};

/// PGN 127501 Binary Switch Bank Status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub instance: u8,
    /// Indicator 1 is at index 0; `None` means the value is unknown and the
    /// field is left out.
    pub indicators: [Option<SwitchState>; MAX_INDICATORS],
}

impl StatusReport {
    pub fn new(instance: u8) -> Self {
        Self {
            instance,
            indicators: [None; MAX_INDICATORS],
        }
    }

    /// Set indicator `index` (1-based). Out-of-range indices are ignored.
    pub fn set_indicator(&mut self, index: usize, state: SwitchState) {
        if let Some(slot) = index
            .checked_sub(1)
            .and_then(|i| self.indicators.get_mut(i))
        {
            *slot = Some(state);
        }
    }

    /// Indicator `index` (1-based).
    pub fn indicator(&self, index: usize) -> Option<SwitchState> {
        index
            .checked_sub(1)
            .and_then(|i| self.indicators.get(i))
            .copied()
            .flatten()
    }

    /// Number of indicators carried by this report.
    pub fn known_count(&self) -> usize {
        self.indicators.iter().filter(|s| s.is_some()).count()
    }

    /// Field map handed to the host's N2K output.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(fields::PGN.to_string(), Value::from(PGN_SWITCH_BANK_STATUS));
        map.insert(
            fields::SWITCH_BANK_INSTANCE.to_string(),
            Value::from(self.instance),
        );
        map.insert(fields::INSTANCE.to_string(), Value::from(self.instance));
        for (i, state) in self.indicators.iter().enumerate() {
            if let Some(state) = state {
                map.insert(fields::indicator(i + 1), Value::from(state.as_str()));
            }
        }
        Value::Object(map)
    }
}

/// PGN 127502 Switch Bank Control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    pub instance: u8,
    /// Switch 1 is at index 0; `None` means the field was absent.
    pub switches: [Option<SwitchState>; MAX_INDICATORS],
}

impl ControlMessage {
    pub fn new(instance: u8) -> Self {
        Self {
            instance,
            switches: [None; MAX_INDICATORS],
        }
    }

    pub fn with_switch(mut self, index: usize, state: SwitchState) -> Self {
        if let Some(slot) = index.checked_sub(1).and_then(|i| self.switches.get_mut(i)) {
            *slot = Some(state);
        }
        self
    }

    /// Present switch fields as `(index, state)`, 1-based, ascending.
    pub fn present(&self) -> impl Iterator<Item = (usize, SwitchState)> + '_ {
        self.switches
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|state| (i + 1, state)))
    }

    /// Parse an inbound analyzer message.
    ///
    /// Returns `Ok(None)` for any PGN other than 127502. A 127502 message
    /// without a usable bank instance is an error.
    pub fn from_json(message: &Value) -> Result<Option<Self>> {
        let pgn = message.get(fields::PGN).and_then(as_u64);
        if pgn != Some(u64::from(PGN_SWITCH_BANK_CONTROL)) {
            return Ok(None);
        }

        let body = message
            .get(fields::FIELDS)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::MalformedMessage("PGN 127502 without fields".to_string()))?;

        let raw_instance = body.get(fields::SWITCH_BANK_INSTANCE).ok_or_else(|| {
            Error::MalformedMessage(format!("missing '{}'", fields::SWITCH_BANK_INSTANCE))
        })?;
        let instance = as_u64(raw_instance)
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| {
                Error::MalformedMessage(format!("invalid bank instance {}", raw_instance))
            })?;

        let mut control = Self::new(instance);
        for (i, slot) in control.switches.iter_mut().enumerate() {
            if let Some(field) = body.get(&fields::switch(i + 1)) {
                *slot = Some(SwitchState::from_field(field));
            }
        }
        Ok(Some(control))
    }
}

/// Analyzer output is not strict about numbers: accept `127502` and `"127502"`.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
