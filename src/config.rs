//! Driver configuration.

use fugit::MillisDurationU32;

use crate::{
    timing::DEFAULT_RESPONSE_OFFSET,
    types::{Address, LineEnding},
};

/// Default wait before stale input is drained, letting an in-flight byte land.
pub const DEFAULT_SETTLE_DELAY_MS: u32 = 5;

/// What to do when an exchange fails with a timeout, overflow or bad frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Report the failure straight away.
    #[default]
    None,
    /// Re-send the request up to this many more times.
    Bounded(u8),
}

impl RetryPolicy {
    /// Total number of attempts allowed, including the first.
    pub fn attempts(&self) -> u16 {
        match self {
            RetryPolicy::None => 1,
            RetryPolicy::Bounded(retries) => 1 + u16::from(*retries),
        }
    }
}

/// Use [`DpmConfigBuilder`] to create a configuration, or take the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpmConfig {
    /// Bus address of the PSU.
    pub address: Address,
    /// Terminator sent after every request.
    pub line_ending: LineEnding,
    /// Allowance for PSU processing time, added to the transmission time of a reply.
    pub response_offset: MillisDurationU32,
    /// Delay before draining stale input ahead of each request.
    pub settle_delay_ms: u32,
    pub retry: RetryPolicy,
    /// Log every request and response at debug level.
    pub log_frames: bool,
}

impl Default for DpmConfig {
    fn default() -> Self {
        Self {
            address: Address::DEFAULT,
            line_ending: LineEnding::default(),
            response_offset: DEFAULT_RESPONSE_OFFSET,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            retry: RetryPolicy::default(),
            log_frames: false,
        }
    }
}

impl DpmConfig {
    pub fn builder() -> DpmConfigBuilder {
        DpmConfigBuilder::default()
    }
}

/// Use this type to create a [`DpmConfig`].
#[derive(Debug, Clone, Default)]
pub struct DpmConfigBuilder {
    config: DpmConfig,
}

impl DpmConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let's build it!
    pub fn build(self) -> DpmConfig {
        self.config
    }

    /// Set the PSU address. Out of range values fall back to `01`.
    pub fn with_address(mut self, address: impl Into<Address>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.config.line_ending = line_ending;
        self
    }

    pub fn with_response_offset(mut self, offset: MillisDurationU32) -> Self {
        self.config.response_offset = offset;
        self
    }

    pub fn with_settle_delay_ms(mut self, delay_ms: u32) -> Self {
        self.config.settle_delay_ms = delay_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn with_frame_logging(mut self, enabled: bool) -> Self {
        self.config.log_frames = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DpmConfig::default();
        assert_eq!(config.address, Address::new(1));
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert_eq!(config.response_offset.to_millis(), 20);
        assert_eq!(config.settle_delay_ms, 5);
        assert_eq!(config.retry, RetryPolicy::None);
        assert!(!config.log_frames);
    }

    #[test]
    fn builder() {
        let config = DpmConfig::builder()
            .with_address(12u8)
            .with_line_ending(LineEnding::CrLf)
            .with_response_offset(MillisDurationU32::millis(50))
            .with_settle_delay_ms(0)
            .with_retry(RetryPolicy::Bounded(3))
            .with_frame_logging(true)
            .build();
        assert_eq!(&config.address.digits(), b"12");
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert_eq!(config.response_offset.to_millis(), 50);
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.retry.attempts(), 4);
        assert!(config.log_frames);
    }

    #[test]
    fn builder_address_fallback() {
        let config = DpmConfigBuilder::new().with_address(150u8).build();
        assert_eq!(config.address, Address::DEFAULT);
    }

    #[test]
    fn retry_attempts() {
        assert_eq!(RetryPolicy::None.attempts(), 1);
        assert_eq!(RetryPolicy::Bounded(0).attempts(), 1);
        assert_eq!(RetryPolicy::Bounded(255).attempts(), 256);
    }
}
