//! We use this mocking module in unit tests to emulate a serial port with a PSU on the other end,
//! and a clock.

use crate::{
    timing::{Clock, Millis},
    transport::Channel,
};

/// A reply the mock PSU sends back once a full request line has been written.
/// `None` means the PSU stays silent.
type Reply = Option<heapless::Vec<u8, 64>>;

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 256>,
    /// Buffer containing data ready to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Replies released one per request line
    replies: heapless::Deque<Reply, 8>,
    baud_rate: u32,
    /// Another device keeps talking, so there is always something to read
    chatter: bool,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        // The PSU answers once it has seen the end of a request line.
        for _ in buf.iter().filter(|&&b| b == b'\n') {
            self.release_reply()?;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        if available_bytes == 0 && self.chatter {
            buf.fill(b'x');
            return Ok(buf.len());
        }
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(self.chatter || self.read_position < self.read_buffer.len())
    }
}

impl Channel for MockSerial {
    fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers, at 9600 baud
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            replies: heapless::Deque::new(),
            baud_rate: 9600,
            chatter: false,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn set_baud_rate(&mut self, baud_rate: u32) {
        self.baud_rate = baud_rate;
    }

    /// Make data readable straight away, as if left over from an earlier exchange
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Keep the line busy with bytes that never end a line
    pub fn set_chatter(&mut self, chatter: bool) {
        self.chatter = chatter;
    }

    /// Queue the reply to the next request line
    pub fn queue_reply(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        let reply = heapless::Vec::from_slice(data).map_err(|_| MockSerialError::BufferOverflow)?;
        self.replies
            .push_back(Some(reply))
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Queue no reply at all to the next request line
    pub fn queue_silence(&mut self) -> Result<(), MockSerialError> {
        self.replies
            .push_back(None)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    fn release_reply(&mut self) -> Result<(), MockSerialError> {
        if let Some(Some(reply)) = self.replies.pop_front() {
            if self.read_position >= self.read_buffer.len() {
                self.read_buffer.clear();
                self.read_position = 0;
            }
            self.read_buffer
                .extend_from_slice(&reply)
                .map_err(|_| MockSerialError::BufferOverflow)?;
        }
        Ok(())
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

/// A clock that moves forward by a fixed step every time it is read.
pub struct MockClock {
    now_ms: u64,
    step_ms: u64,
    first_reading: Option<u64>,
    last_reading: u64,
    delayed_ms: u64,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            step_ms: 1,
            first_reading: None,
            last_reading: 0,
            delayed_ms: 0,
        }
    }

    pub fn step_ms(&self) -> u64 {
        self.step_ms
    }

    pub fn first_reading(&self) -> u64 {
        self.first_reading.unwrap_or(0)
    }

    pub fn last_reading(&self) -> u64 {
        self.last_reading
    }

    /// Total time spent in [`Clock::delay_ms`]
    pub fn delayed_ms(&self) -> u64 {
        self.delayed_ms
    }
}

impl Clock for MockClock {
    fn now(&mut self) -> Millis {
        let reading = self.now_ms;
        self.first_reading.get_or_insert(reading);
        self.last_reading = reading;
        self.now_ms += self.step_ms;
        Millis::from_ticks(reading)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_ms += u64::from(ms);
        self.delayed_ms += u64::from(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, ReadReady, Write};

    #[test]
    fn test_new_mock_serial() {
        let mock = MockSerial::new();
        assert_eq!(mock.written_data().len(), 0);
        assert_eq!(mock.read_position, 0);
        assert_eq!(mock.baud_rate(), 9600);
        assert!(!mock.should_error_on_write);
        assert!(!mock.should_error_on_read);
    }

    #[test]
    fn test_write_data() {
        let mut mock = MockSerial::new();
        let test_data = b":01r30=0,";

        let result = mock.write(test_data);
        assert_eq!(result.unwrap(), test_data.len());
        assert_eq!(mock.written_data(), test_data);

        mock.clear_written_data();
        assert!(mock.written_data().is_empty());
    }

    #[test]
    fn test_write_buffer_overflow() {
        let mut mock = MockSerial::new();
        let large_data = [0u8; 300]; // Larger than 256 byte capacity

        let result = mock.write(&large_data);
        assert!(matches!(result.unwrap_err(), MockSerialError::BufferOverflow));
    }

    #[test]
    fn test_stale_data_is_readable() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"stale").unwrap();
        assert!(mock.read_ready().unwrap());

        let mut buffer = [0u8; 3];
        assert_eq!(mock.read(&mut buffer).unwrap(), 3);
        assert_eq!(&buffer, b"sta");
        assert_eq!(mock.read(&mut buffer).unwrap(), 2);
        assert!(!mock.read_ready().unwrap());
        assert_eq!(mock.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_reply_released_by_request_line() {
        let mut mock = MockSerial::new();
        mock.queue_reply(b":01ok\r\n").unwrap();
        mock.queue_silence().unwrap();
        mock.queue_reply(b":01r33=30.\r\n").unwrap();

        mock.write(b":01w12=1,").unwrap();
        assert!(!mock.read_ready().unwrap());
        mock.write(b"\n").unwrap();

        let mut buffer = [0u8; 16];
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b":01ok\r\n");

        // Silence.
        mock.write(b":01r33=0,\n").unwrap();
        assert!(!mock.read_ready().unwrap());

        mock.write(b":01r33=0,\n").unwrap();
        let read = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..read], b":01r33=30.\r\n");
    }

    #[test]
    fn test_chatter_is_always_readable() {
        let mut mock = MockSerial::new();
        mock.set_chatter(true);
        let mut buffer = [0u8; 4];
        for _ in 0..3 {
            assert!(mock.read_ready().unwrap());
            assert_eq!(mock.read(&mut buffer).unwrap(), 4);
            assert_eq!(&buffer, b"xxxx");
        }
    }

    #[test]
    fn test_error_simulation() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(matches!(
            mock.write(b"test").unwrap_err(),
            MockSerialError::SimulatedError
        ));
        assert!(mock.flush().is_err());
        assert_eq!(mock.written_data().len(), 0);

        mock.set_read_data(b"test data").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 10];
        assert!(mock.read(&mut buffer).is_err());
        assert!(mock.read_ready().is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::BufferOverflow.kind(),
            embedded_io::ErrorKind::OutOfMemory
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_clock_steps() {
        let mut clock = MockClock::new();
        assert_eq!(clock.now().ticks(), 0);
        assert_eq!(clock.now().ticks(), 1);
        clock.delay_ms(10);
        assert_eq!(clock.now().ticks(), 12);
        assert_eq!(clock.first_reading(), 0);
        assert_eq!(clock.last_reading(), 12);
        assert_eq!(clock.delayed_ms(), 10);
    }
}
