//! BSL Protocol Constants
//!
//! Command opcodes, response-type tags, frame header bytes, and the
//! expected device-identification values for the MSPM0 ROM bootloader.

/// Command frame header byte (host -> device).
pub const CMD_HEADER: u8 = 0x80;

/// Response frame leading ACK byte (device -> host).
pub const RSP_ACK_BYTE: u8 = 0x00;

/// Structured response frame header byte, following the leading ACK byte.
pub const RSP_HEADER: u8 = 0x08;

// ----------------------------------------------------------------------------
// Command opcodes
// ----------------------------------------------------------------------------

pub const CMD_CONNECT: u8 = 0x12;
pub const CMD_GET_DEVICE_INFO: u8 = 0x19;
pub const CMD_PROGRAM_DATA: u8 = 0x20;
pub const CMD_UNLOCK: u8 = 0x21;
pub const CMD_ERASE_PAGE: u8 = 0x23;
pub const CMD_STANDALONE_VERIFY: u8 = 0x26;
pub const CMD_START_APPLICATION: u8 = 0x40;

// ----------------------------------------------------------------------------
// Response types
// ----------------------------------------------------------------------------

pub const RSPTYPE_DEVICE_INFO: u8 = 0x19;
pub const RSPTYPE_STANDALONE_VERIFY: u8 = 0x32;
pub const RSPTYPE_CORE_MESSAGE: u8 = 0x3B;

// ----------------------------------------------------------------------------
// Core-message status codes
// ----------------------------------------------------------------------------

pub const STATUS_SUCCESS: u8 = 0x00;
pub const STATUS_LOCK_ERROR: u8 = 0x01;
pub const STATUS_PASSWORD_ERROR: u8 = 0x02;
pub const STATUS_INVALID_MEMORY_RANGE: u8 = 0x05;
pub const STATUS_INVALID_ALIGNMENT: u8 = 0x0A;

// ----------------------------------------------------------------------------
// Flash/image geometry
// ----------------------------------------------------------------------------

/// Minimum flash erase granularity.
pub const PAGE_SIZE: u32 = 1024;

/// Maximum length of a single programmed Segment.
pub const MAX_SEGMENT_LEN: usize = 1024;

/// Segment start address / length alignment requirement.
pub const ALIGNMENT: u32 = 8;

// ----------------------------------------------------------------------------
// Expected DeviceInfo constants (host-side sanity check, see 6.2)
// ----------------------------------------------------------------------------

pub const EXPECTED_CMD_INTERP_VERSION: u16 = 0x0100;
pub const EXPECTED_BUILD_ID: u16 = 0x0100;
pub const EXPECTED_APP_VERSION: u32 = 0x0000_0000;
pub const EXPECTED_PLUGIN_VERSION: u16 = 0x0001;
pub const MIN_MAX_BUFFER_SIZE: u16 = 0x0400;
pub const EXPECTED_BUFFER_START_ADDRESS: u32 = 0x2000_0160;
pub const EXPECTED_BCR_ID: u32 = 0x0000_0001;
pub const EXPECTED_BSL_ID: u32 = 0x0000_0001;

/// `max_buffer_size` as reported by the simulator's DeviceInfo response.
pub const SIMULATOR_MAX_BUFFER_SIZE: u16 = 0x06C0;

/// Fixed 32-byte payload used for the blank-password unlock command.
pub const UNLOCK_PAYLOAD: [u8; 32] = [0xFF; 32];
