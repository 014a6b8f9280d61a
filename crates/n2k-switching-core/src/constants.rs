//! Protocol and plugin constants.

/// Binary Switch Bank Status.
pub const PGN_SWITCH_BANK_STATUS: u32 = 127501;

/// Switch Bank Control.
pub const PGN_SWITCH_BANK_CONTROL: u32 = 127502;

/// Number of indicator/switch fields a single bank message can carry.
pub const MAX_INDICATORS: usize = 28;

/// Context used for every state subscription.
pub const SELF_CONTEXT: &str = "vessels.self";

/// Field names used on the wire.
pub mod fields {
    pub const PGN: &str = "pgn";
    pub const FIELDS: &str = "fields";
    pub const SWITCH_BANK_INSTANCE: &str = "Switch Bank Instance";
    /// Older consumers read the bank instance from this field.
    pub const INSTANCE: &str = "Instance";
    pub const INDICATOR_PREFIX: &str = "Indicator";
    pub const SWITCH_PREFIX: &str = "Switch";

    /// `Indicator{index}`, 1-based.
    pub fn indicator(index: usize) -> String {
        format!("{}{}", INDICATOR_PREFIX, index)
    }

    /// `Switch{index}`, 1-based.
    pub fn switch(index: usize) -> String {
        format!("{}{}", SWITCH_PREFIX, index)
    }
}

/// Plugin identity reported to the host.
pub mod plugin {
    pub const ID: &str = "signalk-n2k-switching-emulator";
    pub const NAME: &str = "NMEA 2000 Switching Emulator";
    pub const DESCRIPTION: &str =
        "Makes existing switches in Signal K available as N2K switches";
}

/// Paths offered as switch candidates in the configuration schema.
pub mod paths {
    pub const SWITCH_PREFIX: &str = "electrical.switches.";
    pub const STATE_SUFFIX: &str = ".state";
}

/// Default resend interval offered by the configuration schema, in seconds.
pub const DEFAULT_SEND_RATE_SECS: f64 = 15.0;

/// Longest accepted resend interval (one day), in seconds.
pub const MAX_SEND_RATE_SECS: f64 = 86_400.0;
