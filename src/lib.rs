//! This crate provides an interface for communicating with and controlling the Joy-IT / JUNTEK DPM86xx
//! series of programmable power supplies over their ASCII serial protocol.
//!
//! It supports `no-std` environments by use of the `no-std` feature flag.
//!
//! Example PSU model numbers which this should work with:
//! * DPM8605
//! * DPM8608
//! * DPM8616
//! * DPM8624
//!
//! The protocol is a simple request/response exchange of text lines, routed by a two digit
//! device address, so a handful of PSUs can share one RS485 bus:
//!
//! ```text
//! -> :01r30=0,
//! <- :01r30=1200.
//! -> :01w10=500,
//! <- :01ok
//! ```
//!
//! The serial port used for PSU comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! Any port can be used as long as it implements [`transport::Channel`], and timing is taken from a
//! [`timing::Clock`].

#![cfg_attr(feature = "no-std", no_std)]

pub mod config;
pub mod error;
pub mod frame;
pub mod function;
pub mod parser;
pub mod psu;
pub mod registers;
pub mod scaling;
pub mod timing;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_serial;

pub use config::{DpmConfig, DpmConfigBuilder, RetryPolicy};
pub use error::{Error, Result, Status};
pub use function::Function;
pub use psu::Dpm86xx;
pub use types::{Address, ControlMode, LineEnding, State};
