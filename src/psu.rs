use crate::{
    config::DpmConfig,
    error::{Error, Result},
    frame::{RequestFrame, build_read_frame, build_write_frame},
    function::{Function, FunctionCatalog},
    parser::{Response, parse},
    registers::RegisterStore,
    scaling::Scale,
    timing::{Clock, ResponseTiming},
    transport::{Channel, Transport},
    types::{Address, ControlMode, State},
};

/// You can create a Dpm86xx using any interface which implements [`Channel`], plus a [`Clock`].
///
/// `L` is the capacity of the receive buffer, one byte of which is reserved, so the longest
/// response line accepted is `L - 1` bytes.
///
/// For its methods, we generally use the nomenclature that "set" means to write a setpoint,
/// whereas "read" means to get a value from the PSU. Accessors without a prefix, like
/// [`Self::measured_voltage`], return the last value read without talking to the PSU.
pub struct Dpm86xx<S: Channel, C: Clock, const L: usize = 24> {
    transport: Transport<S, C>,
    config: DpmConfig,
    catalog: FunctionCatalog,
    registers: RegisterStore,
    receive_buffer: heapless::Vec<u8, L>,
}

impl<S: Channel, C: Clock, const L: usize> Dpm86xx<S, C, L> {
    /// Create a new Dpm86xx instance on an already opened channel.
    pub fn new(interface: S, clock: C, config: DpmConfig) -> Self {
        Self {
            transport: Transport::new(interface, clock, config),
            catalog: FunctionCatalog::new(config.address),
            config,
            registers: RegisterStore::new(),
            receive_buffer: heapless::Vec::new(),
        }
    }

    /// Create a new Dpm86xx instance with the default configuration, talking to `address`.
    pub fn with_address(interface: S, clock: C, address: impl Into<Address>) -> Self {
        let config = DpmConfig::builder().with_address(address).build();
        Self::new(interface, clock, config)
    }

    /// Give back the channel and clock.
    pub fn release(self) -> (S, C) {
        self.transport.release()
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn config(&self) -> &DpmConfig {
        &self.config
    }

    /// Response timing in use.
    pub fn timing(&self) -> ResponseTiming {
        self.transport.timing()
    }

    /// Recompute the response timing, e.g. after the channel's baud rate was changed.
    ///
    /// A changed baud rate is also picked up at the start of every exchange.
    pub fn refresh_timing(&mut self) {
        self.transport.refresh_timing();
    }

    /// Last values read from the PSU.
    pub fn registers(&self) -> &RegisterStore {
        &self.registers
    }

    /// Bytes captured during the last exchange.
    pub fn last_response(&self) -> &[u8] {
        &self.receive_buffer
    }

    /// Read a value from the PSU.
    ///
    /// Returns the raw value, with the fixed number of decimal places used by the PSU (see
    /// [`Function::scale`]). On success the value is also kept in the register store; on failure
    /// the register store is left as it was.
    pub fn read_function(&mut self, function: Function) -> Result<u16, S::Error> {
        if !function.is_readable() {
            return Err(Error::InvalidFunction(function));
        }
        let frame = build_read_frame(self.config.address, function)
            .map_err(|_| Error::BufferOverflow)?;

        let value = self.with_retry(&frame, |response| match response {
            Response::Value(parsed, value) if parsed == function => Some(value),
            _ => None,
        })?;
        self.registers.update(function, value);
        Ok(value)
    }

    /// Write a value to the PSU.
    ///
    /// `value2` is only sent for [`Function::SetVoltageAndCurrent`]. Values are passed through as
    /// given. Success means the PSU acknowledged the write.
    pub fn write_function(
        &mut self,
        function: Function,
        value1: u16,
        value2: Option<u16>,
    ) -> Result<(), S::Error> {
        if !function.is_writable() {
            return Err(Error::InvalidFunction(function));
        }
        let frame = build_write_frame(self.config.address, function, value1, value2)
            .map_err(|_| Error::BufferOverflow)?;

        self.with_retry(&frame, |response| match response {
            Response::WriteAck => Some(()),
            _ => None,
        })
    }

    /// Run exchanges for `frame` until `accept` takes a response or the retry policy is used up.
    fn with_retry<T>(
        &mut self,
        frame: &RequestFrame,
        accept: impl Fn(Response) -> Option<T>,
    ) -> Result<T, S::Error> {
        let attempts = self.config.retry.attempts();
        let mut attempt = 1;
        loop {
            match self.attempt(frame, &accept) {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    log::trace!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        frame.as_str(),
                        err
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn attempt<T>(
        &mut self,
        frame: &RequestFrame,
        accept: &impl Fn(Response) -> Option<T>,
    ) -> Result<T, S::Error> {
        self.transport.exchange(frame, &mut self.receive_buffer)?;
        let response = parse(&self.receive_buffer, &self.catalog);
        accept(response).ok_or_else(|| {
            log::trace!(
                "Unexpected response to {}: {:?}",
                frame.as_str(),
                response.function()
            );
            Error::FrameMismatch
        })
    }

    /// Read the maximum output voltage and current, which also identify the model.
    ///
    /// Once known, the unit based setters clamp to these limits. Returns `(millivolts, milliamps)`.
    pub fn probe_limits(&mut self) -> Result<(u32, u32), S::Error> {
        let voltage_mv = self.read_max_voltage_mv()?;
        let current_ma = self.read_max_current_ma()?;
        Ok((voltage_mv, current_ma))
    }

    /// Return the maximum output voltage of the PSU in millivolts.
    pub fn read_max_voltage_mv(&mut self) -> Result<u32, S::Error> {
        let centivolts = self.read_function(Function::MaxVoltage)?;
        Ok(Scale::CENTI.raw_to_milli(centivolts))
    }

    /// Return the maximum output current of the PSU in milliamps.
    pub fn read_max_current_ma(&mut self) -> Result<u32, S::Error> {
        let milliamps = self.read_function(Function::MaxCurrent)?;
        Ok(Scale::MILLI.raw_to_milli(milliamps))
    }

    /// Return the measured output voltage in millivolts.
    pub fn read_output_voltage_mv(&mut self) -> Result<u32, S::Error> {
        let centivolts = self.read_function(Function::MeasuredVoltage)?;
        Ok(Scale::CENTI.raw_to_milli(centivolts))
    }

    /// Return the measured output current in milliamps.
    pub fn read_current_ma(&mut self) -> Result<u32, S::Error> {
        let milliamps = self.read_function(Function::MeasuredCurrent)?;
        Ok(Scale::MILLI.raw_to_milli(milliamps))
    }

    /// Return the internal temperature in whole degrees celsius.
    pub fn read_temperature_c(&mut self) -> Result<u16, S::Error> {
        self.read_function(Function::Temperature)
    }

    /// Get the currently active control mode. (CV or CC.)
    pub fn read_control_mode(&mut self) -> Result<ControlMode, S::Error> {
        let value = self.read_function(Function::ConstantOutput)?;
        Ok(ControlMode::from(value))
    }

    fn clamp_voltage_mv(&self, voltage_mv: u32) -> u32 {
        self.registers
            .max_voltage_mv()
            .map_or(voltage_mv, |max| voltage_mv.min(max))
    }

    fn clamp_current_ma(&self, current_ma: u32) -> u32 {
        self.registers
            .max_current_ma()
            .map_or(current_ma, |max| current_ma.min(max))
    }

    /// Set the output target voltage. Value supplied in millivolts.
    ///
    /// Clamped to the maximum voltage, if that has been read.
    pub fn set_output_voltage_mv(&mut self, voltage_mv: u32) -> Result<(), S::Error> {
        let centivolts = Scale::CENTI.milli_to_raw(self.clamp_voltage_mv(voltage_mv));
        self.write_function(Function::SetVoltage, centivolts, None)
    }

    /// Set the output current limit. Value supplied in milliamps.
    ///
    /// Clamped to the maximum current, if that has been read.
    pub fn set_current_limit_ma(&mut self, current_ma: u32) -> Result<(), S::Error> {
        let milliamps = Scale::MILLI.milli_to_raw(self.clamp_current_ma(current_ma));
        self.write_function(Function::SetCurrent, milliamps, None)
    }

    /// Set output voltage and current limit in a single request.
    pub fn set_voltage_and_current(
        &mut self,
        voltage_mv: u32,
        current_ma: u32,
    ) -> Result<(), S::Error> {
        let centivolts = Scale::CENTI.milli_to_raw(self.clamp_voltage_mv(voltage_mv));
        let milliamps = Scale::MILLI.milli_to_raw(self.clamp_current_ma(current_ma));
        self.write_function(Function::SetVoltageAndCurrent, centivolts, Some(milliamps))
    }

    /// Enable/disable the output.
    pub fn set_output_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.write_function(Function::OutputStatus, state.into() as u16, None)
    }

    /// Maximum output voltage in volts, as last read.
    pub fn max_voltage(&self) -> Option<f32> {
        self.registers.max_voltage()
    }

    /// Maximum output current in amps, as last read.
    pub fn max_current(&self) -> Option<f32> {
        self.registers.max_current()
    }

    /// Measured output voltage in volts, as last read.
    pub fn measured_voltage(&self) -> Option<f32> {
        self.registers.measured_voltage()
    }

    /// Measured output current in amps, as last read.
    pub fn measured_current(&self) -> Option<f32> {
        self.registers.measured_current()
    }

    /// Internal temperature in degrees celsius, as last read.
    pub fn temperature(&self) -> Option<f32> {
        self.registers.temperature()
    }

    pub fn control_mode(&self) -> Option<ControlMode> {
        self.registers.control_mode()
    }

    /// Whether the output was in constant current mode, as last read.
    pub fn constant_output_is_current(&self) -> bool {
        self.registers.constant_output_is_current()
    }

    /// Whether the output was in constant voltage mode, as last read.
    pub fn constant_output_is_voltage(&self) -> bool {
        self.registers.constant_output_is_voltage()
    }
}
