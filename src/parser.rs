//! Parsing of response frames.
//!
//! Two shapes of response are recognised, both ending in CRLF:
//! * Value: `:01r30=1200.\r\n`
//! * Write acknowledgement: `:01ok\r\n`
//!
//! Faults on the bus can leave garbage in front of the real response, so everything up to and
//! including the last `:` is dropped before the shape is checked.

use crate::function::{Function, FunctionCatalog};

/// Outcome of parsing one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// A value for one of the readable functions, raw (unscaled).
    Value(Function, u16),
    /// The PSU acknowledged a write.
    WriteAck,
    /// Not a valid frame, not addressed to us, or a malformed operand.
    Invalid,
}

impl Response {
    /// The function this response stands for, with the sentinels for the non value cases.
    pub fn function(&self) -> Function {
        match self {
            Response::Value(function, _) => *function,
            Response::WriteAck => Function::WriteOk,
            Response::Invalid => Function::Invalid,
        }
    }
}

/// Position of the first `byte` in `haystack`.
fn index_of(haystack: &[u8], byte: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == byte)
}

/// Checks each `(byte, offset_from_end)` pair: the first occurrence of `byte` must sit exactly
/// `offset_from_end` bytes before the end of `frame`.
fn ends_with_shape(frame: &[u8], shape: &[(u8, usize)]) -> bool {
    shape.iter().all(|&(byte, offset)| {
        frame
            .len()
            .checked_sub(offset)
            .is_some_and(|expected| index_of(frame, byte) == Some(expected))
    })
}

const VALUE_SHAPE: [(u8, usize); 3] = [(b'.', 3), (b'\r', 2), (b'\n', 1)];
const ACK_SHAPE: [(u8, usize); 4] = [(b'o', 4), (b'k', 3), (b'\r', 2), (b'\n', 1)];

/// Strip any bus noise in front of the frame.
///
/// Returns everything after the last `:`, or the whole capture if there is none.
pub fn strip_noise(raw: &[u8]) -> &[u8] {
    match raw.iter().rposition(|&b| b == b':') {
        Some(start) => {
            if start > 0 {
                log::trace!("Dropping {} bytes of bus noise", start);
            }
            &raw[start + 1..]
        }
        None => raw,
    }
}

/// Parse the digits of a value operand. Empty, non-decimal or overflowing input is rejected.
pub fn parse_operand(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0u16, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u16::from(b - b'0'))
    })
}

/// Parse a raw response capture.
///
/// Value frames are only accepted when their key matches an entry in `catalog`; a well formed
/// frame for another address or function is [`Response::Invalid`].
pub fn parse(raw: &[u8], catalog: &FunctionCatalog) -> Response {
    let frame = strip_noise(raw);

    if !ends_with_shape(frame, &VALUE_SHAPE) {
        if ends_with_shape(frame, &ACK_SHAPE) {
            return Response::WriteAck;
        }
        return Response::Invalid;
    }

    let Some(separator) = index_of(frame, b'=') else {
        return Response::Invalid;
    };
    // The shape check guarantees the '.' is at `len - 3`.
    let dot = frame.len() - 3;
    if separator > dot {
        return Response::Invalid;
    }
    let (key, operand) = (&frame[..separator], &frame[separator + 1..dot]);

    let Some(value) = parse_operand(operand) else {
        log::warn!(
            "{}  :::  Value is not a number!",
            core::str::from_utf8(operand).unwrap_or("<non-utf8>")
        );
        return Response::Invalid;
    };

    match catalog.lookup(key) {
        Some(function) => Response::Value(function, value),
        None => Response::Invalid,
    }
}
