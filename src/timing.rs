//! Response timing.
//!
//! The driver polls the channel until a full line has arrived or a deadline passes. The deadline
//! is derived from the baud rate, modelling a worst case reply of 20 characters at 8 bits each,
//! plus a fixed offset covering the processing time of the PSU:
//!
//! ```text
//! budget_ms = ceil(1000 * 20 * 8 / baud_rate) + offset_ms
//! ```
//!
//! For 9600 baud that is 17 ms plus the offset.

use fugit::{MillisDurationU32, MillisDurationU64};

/// A point in time with millisecond resolution.
pub type Millis = fugit::Instant<u64, 1, 1000>;

/// Bits in the longest reply we plan for, 20 characters of 8 bits.
const REPLY_BITS: u64 = 20 * 8;

/// Default allowance for the PSU to process a request.
pub const DEFAULT_RESPONSE_OFFSET: MillisDurationU32 = MillisDurationU32::millis(20);

/// Source of time used for deadlines and delays.
pub trait Clock {
    /// Current time. Must be monotonic.
    fn now(&mut self) -> Millis;

    /// Block for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now(&mut self) -> Millis {
        T::now(self)
    }

    fn delay_ms(&mut self, ms: u32) {
        T::delay_ms(self, ms)
    }
}

/// How long to wait for one response line at a given baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseTiming {
    baud_rate: u32,
    budget: MillisDurationU64,
}

impl ResponseTiming {
    pub fn new(baud_rate: u32, offset: MillisDurationU32) -> Self {
        let line_ms = (1000 * REPLY_BITS).div_ceil(u64::from(baud_rate.max(1)));
        let budget = MillisDurationU64::millis(line_ms + u64::from(offset.to_millis()));
        Self { baud_rate, budget }
    }

    /// Baud rate this budget was computed for.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Total wait budget for one response.
    pub fn budget(&self) -> MillisDurationU64 {
        self.budget
    }

    /// The instant after which a response that started at `start` has timed out.
    pub fn deadline(&self, start: Millis) -> Millis {
        start + self.budget
    }
}

/// Wall clock time from the standard library.
#[cfg(not(feature = "no-std"))]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(not(feature = "no-std"))]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(feature = "no-std"))]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(feature = "no-std"))]
impl Clock for StdClock {
    fn now(&mut self) -> Millis {
        let elapsed = self.origin.elapsed().as_millis();
        Millis::from_ticks(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
