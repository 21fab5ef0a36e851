//! One request/response exchange over a serial channel.

use embedded_io::{Error as _, ErrorKind};

use crate::{
    config::DpmConfig,
    error::{Error, Result},
    timing::{Clock, ResponseTiming},
    types::LineEnding,
};

/// A serial port the PSU is connected to.
///
/// Reads must not block once [`embedded_io::ReadReady::read_ready`] reported data.
pub trait Channel: embedded_io::Read + embedded_io::Write + embedded_io::ReadReady {
    /// Baud rate the port is currently running at.
    fn baud_rate(&self) -> u32;
}

impl<T: Channel + ?Sized> Channel for &mut T {
    fn baud_rate(&self) -> u32 {
        T::baud_rate(self)
    }
}

/// Drives the write-then-poll cycle of one exchange against a [`Channel`].
pub struct Transport<S: Channel, C: Clock> {
    channel: S,
    clock: C,
    timing: ResponseTiming,
    config: DpmConfig,
}

impl<S: Channel, C: Clock> Transport<S, C> {
    pub fn new(channel: S, clock: C, config: DpmConfig) -> Self {
        let timing = ResponseTiming::new(channel.baud_rate(), config.response_offset);
        Self {
            channel,
            clock,
            timing,
            config,
        }
    }

    /// Timing currently in use.
    pub fn timing(&self) -> ResponseTiming {
        self.timing
    }

    /// Recompute the response deadline from the channel's current baud rate.
    pub fn refresh_timing(&mut self) {
        self.timing = ResponseTiming::new(self.channel.baud_rate(), self.config.response_offset);
    }

    #[cfg(test)]
    pub(crate) fn channel_mut(&mut self) -> &mut S {
        &mut self.channel
    }

    /// Give back the channel and clock.
    pub fn release(self) -> (S, C) {
        (self.channel, self.clock)
    }

    /// Read one byte if there is one waiting.
    fn read_byte(&mut self) -> Result<Option<u8>, S::Error> {
        if !self.channel.read_ready().map_err(Error::SerialError)? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.channel.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            // Some ports report an empty poll as a timeout.
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(Error::SerialError(e)),
        }
    }

    /// Drop anything left over from an earlier, failed exchange. Returns the number of bytes
    /// dropped.
    ///
    /// Draining stops after one response budget, even if the bus keeps delivering bytes.
    pub fn discard_pending(&mut self) -> Result<usize, S::Error> {
        self.channel.flush().map_err(Error::SerialError)?;
        self.clock.delay_ms(self.config.settle_delay_ms);

        let deadline = self.timing.deadline(self.clock.now());
        let mut scratch = [0u8; 8];
        let mut dropped = 0;
        while self.channel.read_ready().map_err(Error::SerialError)? {
            if self.clock.now() >= deadline {
                log::warn!("Bus still busy after discarding {} bytes", dropped);
                break;
            }
            match self.channel.read(&mut scratch) {
                Ok(0) => break,
                Ok(read) => dropped += read,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) => return Err(Error::SerialError(e)),
            }
        }
        if dropped > 0 {
            log::trace!("Discarded {} stale bytes", dropped);
        }
        Ok(dropped)
    }

    /// Send `frame` plus the line terminator and collect the response line into `buffer`.
    ///
    /// One slot of `buffer` is kept as the terminator slot, so at most `L - 1` bytes are captured.
    /// On success the number of bytes received, including the final `\n`, is returned.
    pub fn exchange<const L: usize>(
        &mut self,
        frame: &str,
        buffer: &mut heapless::Vec<u8, L>,
    ) -> Result<usize, S::Error> {
        if self.channel.baud_rate() != self.timing.baud_rate() {
            self.refresh_timing();
        }
        buffer.clear();
        self.discard_pending()?;

        if self.config.log_frames {
            log::debug!("REQ: {}", frame);
        }
        self.send(frame, self.config.line_ending)?;

        let result = self.receive_line(buffer);

        if self.config.log_frames {
            let status = match &result {
                Ok(received) => *received as i32,
                Err(err) => err.status().code(),
            };
            log::debug!(
                "RES({}): {}",
                status,
                core::str::from_utf8(buffer.as_slice()).unwrap_or("<non-utf8>").trim_end()
            );
        }
        result
    }

    fn send(&mut self, frame: &str, line_ending: LineEnding) -> Result<(), S::Error> {
        self.channel
            .write_all(frame.as_bytes())
            .map_err(Error::SerialError)?;
        self.channel
            .write_all(line_ending.as_bytes())
            .map_err(Error::SerialError)
    }

    /// Poll until a `\n` arrives, the buffer fills or the deadline passes.
    fn receive_line<const L: usize>(
        &mut self,
        buffer: &mut heapless::Vec<u8, L>,
    ) -> Result<usize, S::Error> {
        let capacity = L.saturating_sub(1);
        let deadline = self.timing.deadline(self.clock.now());

        while self.clock.now() < deadline {
            let Some(byte) = self.read_byte()? else {
                continue;
            };
            if buffer.len() >= capacity || buffer.push(byte).is_err() {
                return Err(Error::BufferOverflow);
            }
            if byte == b'\n' {
                return Ok(buffer.len());
            }
        }
        Err(Error::Timeout)
    }
}
