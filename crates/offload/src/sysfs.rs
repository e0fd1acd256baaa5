//! Text encoding of scalar device attributes.

use crate::error::{OffloadError, Result};

/// Parse a base-10 `u32` the way attribute stores accept it: an optional
/// leading `+`, digits, and at most one trailing newline.
pub fn parse_u32(buf: &str) -> Result<u32> {
    let body = buf.strip_suffix('\n').unwrap_or(buf);
    let digits = body.strip_prefix('+').unwrap_or(body);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OffloadError::invalid(format!("not an unsigned integer: {buf:?}")));
    }

    digits
        .parse::<u32>()
        .map_err(|_| OffloadError::invalid(format!("out of range: {buf:?}")))
}

/// Render an attribute value, newline terminated.
pub fn emit_u32(value: u32) -> String {
    format!("{value}\n")
}
