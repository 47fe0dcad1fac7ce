//! # BSL Error Handling
//!
//! Defines the `BslError` enum covering every failure mode the HEX parser,
//! image normalizer, frame codec, client state machine, and serial
//! transport can produce.

use thiserror::Error;

/// Represents the different error types that can occur in this crate.
#[derive(Debug, Error)]
pub enum BslError {
    /// A malformed Intel HEX record; `line` is 1-based.
    #[error("hex parse error at line {line}: {reason}")]
    HexParse { line: usize, reason: String },

    /// A segment's start address is not 8-byte aligned.
    #[error("misaligned segment at address 0x{address:08X}")]
    MisalignedSegment { address: u32 },

    /// A segment carries no bytes.
    #[error("empty segment at address 0x{address:08X}")]
    EmptySegment { address: u32 },

    /// Opening the serial port failed.
    #[error("failed to open serial port: {0}")]
    SerialOpen(String),

    /// A read or write on the serial port failed.
    #[error("serial I/O error: {0}")]
    SerialIo(String),

    /// No response arrived within the deadline.
    #[error("timed out waiting for a response")]
    ResponseTimeout,

    /// The response buffer was shorter than a valid frame could be.
    #[error("frame too short")]
    FrameTooShort,

    /// The declared length field didn't match the bytes actually present.
    #[error("bad frame length: expected {expected}, got {actual}")]
    BadLength { expected: usize, actual: usize },

    /// The trailing CRC-32 didn't match a recomputation.
    #[error("CRC mismatch: expected 0x{expected:08X}, got 0x{actual:08X}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// A decoded `DeviceInfo` field disagreed with the expected constant.
    #[error("unexpected device info field {field}: expected {expected}, got {actual}")]
    UnexpectedDeviceInfo {
        field: &'static str,
        expected: String,
        actual: String,
    },

    /// The device reported a non-success core-message status.
    #[error("BSL core error: code 0x{code:02X}{}", address.map(|a| format!(" at address 0x{a:08X}")).unwrap_or_default())]
    BslCoreError { code: u8, address: Option<u32> },

    /// The client state machine received an unexpected response for its
    /// current state.
    #[error("protocol sequence error: expected {expected}, got {actual}")]
    ProtocolSequenceError {
        expected: &'static str,
        actual: &'static str,
    },
}
