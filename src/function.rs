//! This module is used to define the functions (commands) supported by the DPM86xx PSUs, and
//! the catalog used to recognise them in responses.

use strum_macros::{EnumCount, EnumIter, FromRepr};

use crate::{scaling::Scale, types::Address};

/// Logical functions of the PSU.
///
/// The discriminant is the two digit command code used on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumIter, EnumCount, FromRepr)]
#[repr(u8)]
pub enum Function {
    /// __R__ - Maximum output voltage of the PSU.
    ///
    /// Value is in centi-volts. E.g. 60.00V => `6000`.
    MaxVoltage = 0,
    /// __R__ - Maximum output current of the PSU. This also identifies the model.
    ///
    /// Value is in milli-amps. E.g. 5.000A => `5000`.
    MaxCurrent = 1,
    /// __W__ - Output voltage setpoint, in centi-volts.
    SetVoltage = 10,
    /// __W__ - Output current setpoint, in milli-amps.
    SetCurrent = 11,
    /// __W__ - Switched output.
    /// * `0` - Off.
    /// * `1` - On.
    OutputStatus = 12,
    /// __W__ - Voltage and current setpoints written in one frame.
    SetVoltageAndCurrent = 20,
    /// __R__ - Measured output voltage.
    MeasuredVoltage = 30,
    /// __R__ - Measured output current.
    MeasuredCurrent = 31,
    /// __R__ - Constant voltage constant current state.
    /// * `0` - CV.
    /// * `1` - CC.
    ///
    /// See [`ControlMode`](crate::types::ControlMode).
    ConstantOutput = 32,
    /// __R__ - Internal temperature, whole degrees.
    Temperature = 33,
    /// Returned by the parser for a write acknowledgement. Never sent.
    WriteOk = 254,
    /// Returned by the parser for anything it couldn't make sense of. Never sent.
    Invalid = 255,
}

impl Function {
    /// The functions that hold a value which can be read back.
    pub const READABLE: [Function; 6] = [
        Function::MaxVoltage,
        Function::MaxCurrent,
        Function::MeasuredVoltage,
        Function::MeasuredCurrent,
        Function::ConstantOutput,
        Function::Temperature,
    ];

    /// The wire command code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// The command code rendered as two ASCII digits.
    pub const fn code_digits(self) -> [u8; 2] {
        let code = self.code() % 100;
        [b'0' + code / 10, b'0' + code % 10]
    }

    pub const fn is_readable(self) -> bool {
        matches!(
            self,
            Function::MaxVoltage
                | Function::MaxCurrent
                | Function::MeasuredVoltage
                | Function::MeasuredCurrent
                | Function::ConstantOutput
                | Function::Temperature
        )
    }

    pub const fn is_writable(self) -> bool {
        matches!(
            self,
            Function::SetVoltage
                | Function::SetCurrent
                | Function::OutputStatus
                | Function::SetVoltageAndCurrent
        )
    }

    /// Whether a write of this function carries two operands.
    pub const fn is_compound(self) -> bool {
        matches!(self, Function::SetVoltageAndCurrent)
    }

    /// Fixed point scale of the raw value.
    ///
    /// For the compound setpoint this is the scale of the first (voltage) operand.
    pub const fn scale(self) -> Scale {
        match self {
            Function::MaxVoltage
            | Function::MeasuredVoltage
            | Function::SetVoltage
            | Function::SetVoltageAndCurrent => Scale::CENTI,
            Function::MaxCurrent | Function::MeasuredCurrent | Function::SetCurrent => {
                Scale::MILLI
            }
            _ => Scale::UNIT,
        }
    }
}

/// Length of a response key, `<address>r<code>`.
const KEY_LEN: usize = 5;

/// Lookup table of response keys for one device address.
///
/// Built once for a driver instance; responses are matched against it byte for byte.
#[derive(Debug, Clone)]
pub struct FunctionCatalog {
    entries: [([u8; KEY_LEN], Function); Function::READABLE.len()],
}

impl FunctionCatalog {
    pub fn new(address: Address) -> Self {
        let digits = address.digits();
        let entries = Function::READABLE.map(|function| {
            let code = function.code_digits();
            ([digits[0], digits[1], b'r', code[0], code[1]], function)
        });
        Self { entries }
    }

    /// Find the function whose key is exactly `key`.
    pub fn lookup(&self, key: &[u8]) -> Option<Function> {
        self.entries
            .iter()
            .find(|(entry, _)| entry.as_slice() == key)
            .map(|(_, function)| *function)
    }
}
