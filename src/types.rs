//! This module contains small types shared across the driver.

/// Two digit bus address of a PSU, `01` to `99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address(u8);

impl Address {
    /// Address used by the PSU out of the box, and the fallback for anything out of range.
    pub const DEFAULT: Address = Address(1);

    /// Create an address. Values outside of `1..=99` fall back to [`Address::DEFAULT`].
    pub const fn new(value: u8) -> Self {
        if value >= 1 && value <= 99 {
            Self(value)
        } else {
            Self::DEFAULT
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// The address rendered as two ASCII digits, zero padded.
    pub const fn digits(self) -> [u8; 2] {
        [b'0' + self.0 / 10, b'0' + self.0 % 10]
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for Address {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Represents the two possible power supply control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Constant voltage regulation mode.
    Cv,
    /// Constant current regulation mode.
    Cc,
}

impl From<u16> for ControlMode {
    fn from(value: u16) -> Self {
        if value != 0 { Self::Cc } else { Self::Cv }
    }
}

impl From<ControlMode> for u16 {
    fn from(value: ControlMode) -> Self {
        match value {
            ControlMode::Cv => 0x00,
            ControlMode::Cc => 0x01,
        }
    }
}

/// Used to be less ambiguous and whether something is on or off.
#[repr(u16)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off = 0x00,
    /// Enabled.
    On = 0x01,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Line terminator appended to every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }
}
