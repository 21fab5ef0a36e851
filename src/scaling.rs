//! Fixed point scaling of PSU values.
//!
//! The PSU transfers every value as an unsigned integer with an implied number of decimal
//! places: voltages in centi-volts, currents in milli-amps, temperature and flags as-is.

/// Scaling factor for converting raw values to physical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    /// Raw counts per physical unit, e.g. `100` means the raw value is in hundredths.
    divisor: u32,
}

impl Scale {
    /// Two decimal places, used for voltages.
    pub const CENTI: Scale = Scale::new(100);
    /// Three decimal places, used for currents.
    pub const MILLI: Scale = Scale::new(1000);
    /// No scaling.
    pub const UNIT: Scale = Scale::new(1);

    pub const fn new(divisor: u32) -> Self {
        Self { divisor }
    }

    /// Convert a raw register value into physical units.
    #[inline]
    pub fn to_physical(&self, raw: u16) -> f32 {
        raw as f32 / self.divisor as f32
    }

    /// Convert a raw register value into thousandths of the unit, e.g. mV or mA.
    #[inline]
    pub const fn raw_to_milli(&self, raw: u16) -> u32 {
        (raw as u32 * 1000) / self.divisor
    }

    /// Convert thousandths of the unit into a raw register value.
    ///
    /// Saturates at `u16::MAX`.
    #[inline]
    pub const fn milli_to_raw(&self, milli: u32) -> u16 {
        let raw = (milli as u64 * self.divisor as u64) / 1000;
        if raw > u16::MAX as u64 {
            u16::MAX
        } else {
            raw as u16
        }
    }
}
