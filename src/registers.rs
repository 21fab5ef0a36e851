//! Storage of the last values read from the PSU.
//!
//! One slot per readable [`Function`]. A slot only changes when a read of that function succeeds,
//! so after a failed read the previous value is still there. Check the result of the read rather
//! than assuming a value is fresh.

use crate::{function::Function, scaling::Scale, types::ControlMode};

/// Last known raw values, one per readable function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterStore {
    max_voltage: Option<u16>,
    max_current: Option<u16>,
    measured_voltage: Option<u16>,
    measured_current: Option<u16>,
    constant_output: Option<u16>,
    temperature: Option<u16>,
}

impl RegisterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, function: Function) -> Option<&mut Option<u16>> {
        match function {
            Function::MaxVoltage => Some(&mut self.max_voltage),
            Function::MaxCurrent => Some(&mut self.max_current),
            Function::MeasuredVoltage => Some(&mut self.measured_voltage),
            Function::MeasuredCurrent => Some(&mut self.measured_current),
            Function::ConstantOutput => Some(&mut self.constant_output),
            Function::Temperature => Some(&mut self.temperature),
            _ => None,
        }
    }

    /// Store a freshly decoded raw value. Returns false, storing nothing, for functions
    /// without a slot.
    pub fn update(&mut self, function: Function, raw: u16) -> bool {
        match self.slot_mut(function) {
            Some(slot) => {
                *slot = Some(raw);
                true
            }
            None => false,
        }
    }

    /// Raw value of `function`, if it has been read successfully before.
    pub fn raw(&self, function: Function) -> Option<u16> {
        match function {
            Function::MaxVoltage => self.max_voltage,
            Function::MaxCurrent => self.max_current,
            Function::MeasuredVoltage => self.measured_voltage,
            Function::MeasuredCurrent => self.measured_current,
            Function::ConstantOutput => self.constant_output,
            Function::Temperature => self.temperature,
            _ => None,
        }
    }

    fn scaled(&self, function: Function) -> Option<f32> {
        self.raw(function).map(|raw| function.scale().to_physical(raw))
    }

    /// Maximum output voltage in volts.
    pub fn max_voltage(&self) -> Option<f32> {
        self.scaled(Function::MaxVoltage)
    }

    /// Maximum output current in amps.
    pub fn max_current(&self) -> Option<f32> {
        self.scaled(Function::MaxCurrent)
    }

    /// Measured output voltage in volts.
    pub fn measured_voltage(&self) -> Option<f32> {
        self.scaled(Function::MeasuredVoltage)
    }

    /// Measured output current in amps.
    pub fn measured_current(&self) -> Option<f32> {
        self.scaled(Function::MeasuredCurrent)
    }

    /// Internal temperature in degrees.
    pub fn temperature(&self) -> Option<f32> {
        self.scaled(Function::Temperature)
    }

    /// Maximum output voltage in millivolts.
    pub fn max_voltage_mv(&self) -> Option<u32> {
        self.max_voltage.map(|raw| Scale::CENTI.raw_to_milli(raw))
    }

    /// Maximum output current in milliamps.
    pub fn max_current_ma(&self) -> Option<u32> {
        self.max_current.map(|raw| Scale::MILLI.raw_to_milli(raw))
    }

    pub fn control_mode(&self) -> Option<ControlMode> {
        self.constant_output.map(ControlMode::from)
    }

    /// True when the PSU last reported constant current regulation.
    pub fn constant_output_is_current(&self) -> bool {
        self.control_mode() == Some(ControlMode::Cc)
    }

    /// True when the PSU last reported constant voltage regulation, or nothing yet.
    ///
    /// Always the complement of [`Self::constant_output_is_current`].
    pub fn constant_output_is_voltage(&self) -> bool {
        !self.constant_output_is_current()
    }
}
