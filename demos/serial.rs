use std::env;

use dpm86xx_psu::{
    Dpm86xx, DpmConfig, RetryPolicy,
    function::Function,
    timing::StdClock,
    transport::Channel,
};
use inquire::Select;
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
// Reads only happen once bytes are waiting, so this just bounds a stuck port.
const SERIAL_TIMEOUT_MS: u64 = 50;
const PSU_ADDRESS: u8 = 1;
const OUTPUT_VOLTAGE_MV: u32 = 5500; // 5.5V
const CURRENT_LIMIT_MA: u32 = 100; // 0.1A
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::ConnectionRefused => embedded_io::ErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset => embedded_io::ErrorKind::ConnectionReset,
            std::io::ErrorKind::ConnectionAborted => embedded_io::ErrorKind::ConnectionAborted,
            std::io::ErrorKind::NotConnected => embedded_io::ErrorKind::NotConnected,
            std::io::ErrorKind::AddrInUse => embedded_io::ErrorKind::AddrInUse,
            std::io::ErrorKind::AddrNotAvailable => embedded_io::ErrorKind::AddrNotAvailable,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::AlreadyExists => embedded_io::ErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl embedded_io::ReadReady for PortWrapper {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let waiting = self
            .0
            .bytes_to_read()
            .map_err(|e| IoError(std::io::Error::from(e)))?;
        Ok(waiting > 0)
    }
}

impl Channel for PortWrapper {
    fn baud_rate(&self) -> u32 {
        self.0.baud_rate().unwrap_or(BAUD_RATE)
    }
}

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Open serial port
    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let port = PortWrapper(port);

    // Create a PSU object
    let config = DpmConfig::builder()
        .with_address(PSU_ADDRESS)
        .with_retry(RetryPolicy::Bounded(2))
        .with_frame_logging(true)
        .build();
    let mut psu: Dpm86xx<PortWrapper, StdClock> = Dpm86xx::new(port, StdClock::new(), config);
    println!(
        "Response deadline: {}ms at {} baud",
        psu.timing().budget().to_millis(),
        psu.timing().baud_rate()
    );

    // The limits identify the model, and keep the setpoints below in range
    let (max_voltage_mv, max_current_ma) = psu.probe_limits().unwrap();
    println!(
        "PSU limits: {}V / {}A",
        max_voltage_mv as f32 / 1000.0,
        max_current_ma as f32 / 1000.0
    );

    // Set output voltage and current limit together
    psu.set_voltage_and_current(OUTPUT_VOLTAGE_MV, CURRENT_LIMIT_MA)
        .unwrap();
    println!(
        "Set output voltage to {}V, current limit to {}A",
        OUTPUT_VOLTAGE_MV as f32 / 1000.0,
        CURRENT_LIMIT_MA as f32 / 1000.0
    );

    // Enable the output
    psu.set_output_state(true).unwrap();
    println!("Output enabled");

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    // Measure and display the output
    let measured_voltage = psu.read_output_voltage_mv().unwrap();
    println!(
        "Measured output voltage: {:.3}V",
        measured_voltage as f32 / 1000.0
    );
    let measured_current = psu.read_current_ma().unwrap();
    println!(
        "Measured output current: {:.3}A",
        measured_current as f32 / 1000.0
    );
    println!("Control mode: {:?}", psu.read_control_mode().unwrap());
    println!("Temperature: {}C", psu.read_temperature_c().unwrap());

    // Raw access, e.g. for functions without a dedicated method
    match psu.read_function(Function::Temperature) {
        Ok(raw) => println!("Raw temperature: {}", raw),
        Err(e) => println!("Read failed with status {}: {}", e.status().code(), e),
    }

    // Turn the output back off
    psu.set_output_state(false).unwrap();
    println!("Output disabled");
}
