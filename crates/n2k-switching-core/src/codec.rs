//! On/Off value codec.
//!
//! Internal switch state is a loose JSON value (`1`, `0`, `true`, `false`),
//! while the bus only knows the `"On"`/`"Off"` enumeration. All conversions
//! between the two go through [`to_wire`] and [`from_wire`].

use serde_json::Value;

/// Wire state of a single indicator or switch field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchState::On => "On",
            SwitchState::Off => "Off",
        }
    }

    /// Read a wire field. Only the exact string `"On"` is on; any other
    /// present value is off.
    pub fn from_field(field: &Value) -> Self {
        match field.as_str() {
            Some("On") => SwitchState::On,
            _ => SwitchState::Off,
        }
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encode an internal switch value: `1` or `true` is on, anything else off.
pub fn to_wire(value: &Value) -> SwitchState {
    let on = match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    };
    if on {
        SwitchState::On
    } else {
        SwitchState::Off
    }
}

/// Decode a wire state to the numeric value written to internal state.
pub fn from_wire(state: SwitchState) -> u8 {
    match state {
        SwitchState::On => 1,
        SwitchState::Off => 0,
    }
}
