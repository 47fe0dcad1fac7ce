//! Wire frame codec: builds outbound command frames and parses inbound
//! response frames.

use crate::constants::{CMD_HEADER, RSP_ACK_BYTE, RSP_HEADER};
use crate::crc::{crc32, crc32_value};
use crate::error::BslError;

/// A decoded response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A single-byte ACK (0x00), used for connect/start.
    Ack,
    /// A structured response: response-type byte plus its payload.
    Structured { rsptype: u8, payload: Vec<u8> },
}

/// Builds an outbound command frame:
/// `header || le16(len(payload)+1) || command || payload || crc32(command||payload)`.
pub fn encode(header: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() as u16 + 1).to_le_bytes();
    let mut cmd_and_payload = Vec::with_capacity(1 + payload.len());
    cmd_and_payload.push(command);
    cmd_and_payload.extend_from_slice(payload);

    let mut out = Vec::with_capacity(1 + 2 + cmd_and_payload.len() + 4);
    out.push(header);
    out.extend_from_slice(&len);
    out.extend_from_slice(&cmd_and_payload);
    out.extend_from_slice(&crc32(&cmd_and_payload));
    out
}

/// Builds an outbound command frame using the standard 0x80 header.
pub fn encode_command(command: u8, payload: &[u8]) -> Vec<u8> {
    encode(CMD_HEADER, command, payload)
}

/// Decodes a complete response frame from `buf`. `buf` must contain exactly
/// one frame's worth of bytes (no trailing garbage, no partial frame).
pub fn decode(buf: &[u8]) -> Result<Response, BslError> {
    if buf.is_empty() {
        return Err(BslError::FrameTooShort);
    }

    if buf[0] != RSP_ACK_BYTE {
        return Err(BslError::BadLength {
            expected: 1,
            actual: buf.len(),
        });
    }

    if buf.len() == 1 {
        return Ok(Response::Ack);
    }

    if buf.len() < 4 {
        return Err(BslError::FrameTooShort);
    }

    if buf[1] != RSP_HEADER {
        return Err(BslError::BadLength {
            expected: RSP_HEADER as usize,
            actual: buf[1] as usize,
        });
    }

    let len = u16::from_le_bytes([buf[2], buf[3]]) as usize;
    let expected_total = 4 + len + 4;
    if buf.len() < expected_total {
        return Err(BslError::FrameTooShort);
    }
    if buf.len() != expected_total {
        return Err(BslError::BadLength {
            expected: expected_total,
            actual: buf.len(),
        });
    }

    let rsptype_and_payload = &buf[4..4 + len];
    let trailing_crc = u32::from_le_bytes([
        buf[4 + len],
        buf[4 + len + 1],
        buf[4 + len + 2],
        buf[4 + len + 3],
    ]);
    let computed = crc32_value(rsptype_and_payload);
    if computed != trailing_crc {
        return Err(BslError::CrcMismatch {
            expected: computed,
            actual: trailing_crc,
        });
    }

    let rsptype = rsptype_and_payload[0];
    let payload = rsptype_and_payload[1..].to_vec();
    Ok(Response::Structured { rsptype, payload })
}

/// Returns the total byte length a structured response frame will have,
/// given the declared `len` field (payload length + 1), used by transports
/// to know how many bytes to read before calling [`decode`].
pub fn structured_frame_total_len(len: u16) -> usize {
    4 + len as usize + 4
}
