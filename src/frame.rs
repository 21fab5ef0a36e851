//! Building of request frames.
//!
//! A request looks like `:<address><r|w><code>=<operand>,[<operand>,]`, the line terminator is
//! added by the transport.

use core::fmt::Write;

use crate::{function::Function, types::Address};

/// Room for the longest request, `:01w20=65535,65535,`, with some spare.
pub const FRAME_CAPACITY: usize = 32;

/// A request frame, without line terminator.
pub type RequestFrame = heapless::String<FRAME_CAPACITY>;

fn write_header(
    frame: &mut RequestFrame,
    address: Address,
    direction: char,
    function: Function,
) -> core::fmt::Result {
    let [a0, a1] = address.digits();
    let [c0, c1] = function.code_digits();
    write!(
        frame,
        ":{}{}{}{}{}=",
        a0 as char, a1 as char, direction, c0 as char, c1 as char
    )
}

/// Build the frame reading `function`, e.g. `:01r30=0,`.
pub fn build_read_frame(
    address: Address,
    function: Function,
) -> Result<RequestFrame, core::fmt::Error> {
    let mut frame = RequestFrame::new();
    write_header(&mut frame, address, 'r', function)?;
    frame.push_str("0,").map_err(|_| core::fmt::Error)?;
    Ok(frame)
}

/// Build the frame writing `function`, e.g. `:01w10=500,`.
///
/// `value2` is only emitted for [`Function::SetVoltageAndCurrent`], where a missing value is
/// sent as `0`. Values are not range checked here.
pub fn build_write_frame(
    address: Address,
    function: Function,
    value1: u16,
    value2: Option<u16>,
) -> Result<RequestFrame, core::fmt::Error> {
    let mut frame = RequestFrame::new();
    write_header(&mut frame, address, 'w', function)?;
    write!(frame, "{},", value1)?;
    if function.is_compound() {
        write!(frame, "{},", value2.unwrap_or(0))?;
    }
    Ok(frame)
}
