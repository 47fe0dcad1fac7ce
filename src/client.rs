//! Client state machine: drives a device through
//! Connect -> Identified -> Unlocked -> Erased -> Programmed -> Started.
//!
//! Generic over any `AsyncRead + AsyncWrite + Unpin` transport, so the same
//! driver runs against a real serial port or an in-memory duplex stream
//! wired to the simulator.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use crate::constants::*;
use crate::erase;
use crate::error::BslError;
use crate::frame::{self, Response};
use crate::image::Image;
use crate::logging::{log_debug, log_info};

/// Decoded result of the GetDeviceInfo exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub cmd_interp_version: u16,
    pub build_id: u16,
    pub app_version: u32,
    pub plugin_version: u16,
    pub max_buffer_size: u16,
    pub buffer_start_address: u32,
    pub bcr_id: u32,
    pub bsl_id: u32,
}

impl DeviceInfo {
    /// Decodes the ≥24-byte DeviceInfo payload (little-endian fields).
    pub fn decode(payload: &[u8]) -> Result<Self, BslError> {
        if payload.len() < 24 {
            return Err(BslError::BadLength {
                expected: 24,
                actual: payload.len(),
            });
        }
        Ok(DeviceInfo {
            cmd_interp_version: u16::from_le_bytes([payload[0], payload[1]]),
            build_id: u16::from_le_bytes([payload[2], payload[3]]),
            app_version: u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]),
            plugin_version: u16::from_le_bytes([payload[8], payload[9]]),
            max_buffer_size: u16::from_le_bytes([payload[10], payload[11]]),
            buffer_start_address: u32::from_le_bytes([
                payload[12],
                payload[13],
                payload[14],
                payload[15],
            ]),
            bcr_id: u32::from_le_bytes([payload[16], payload[17], payload[18], payload[19]]),
            bsl_id: u32::from_le_bytes([payload[20], payload[21], payload[22], payload[23]]),
        })
    }

    /// Validates every field against the expected constants of section 6.2.
    pub fn validate(&self) -> Result<(), BslError> {
        check_eq("cmd_interp_version", self.cmd_interp_version, EXPECTED_CMD_INTERP_VERSION)?;
        check_eq("build_id", self.build_id, EXPECTED_BUILD_ID)?;
        check_eq("app_version", self.app_version, EXPECTED_APP_VERSION)?;
        check_eq("plugin_version", self.plugin_version, EXPECTED_PLUGIN_VERSION)?;
        if self.max_buffer_size < MIN_MAX_BUFFER_SIZE {
            return Err(BslError::UnexpectedDeviceInfo {
                field: "max_buffer_size",
                expected: format!(">= {MIN_MAX_BUFFER_SIZE}"),
                actual: self.max_buffer_size.to_string(),
            });
        }
        check_eq("buffer_start_address", self.buffer_start_address, EXPECTED_BUFFER_START_ADDRESS)?;
        check_eq("bcr_id", self.bcr_id, EXPECTED_BCR_ID)?;
        check_eq("bsl_id", self.bsl_id, EXPECTED_BSL_ID)?;
        Ok(())
    }
}

fn check_eq<T: PartialEq + std::fmt::Display>(
    field: &'static str,
    actual: T,
    expected: T,
) -> Result<(), BslError> {
    if actual != expected {
        return Err(BslError::UnexpectedDeviceInfo {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Per-request response deadline. Distinct from the serial layer's
/// per-byte idle timeout; this bounds the whole exchange.
const RESPONSE_DEADLINE: Duration = Duration::from_secs(2);

/// Drives a session against `transport`: connect, identify, unlock, erase,
/// program, start. Returns the validated DeviceInfo on success.
pub async fn run_session<T>(transport: &mut T, image: &Image) -> Result<DeviceInfo, BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    connect(transport).await?;
    let info = get_device_info(transport).await?;
    info.validate()?;
    unlock(transport).await?;

    let pages = erase::plan(image);
    log_info(&format!("erase plan covers {} page(s)", pages.len()));
    for page in pages {
        erase_page(transport, page).await?;
    }

    for seg in &image.segments {
        program_segment(transport, seg.start_address, &seg.bytes).await?;
    }

    start_application(transport).await?;
    Ok(info)
}

async fn send<T>(transport: &mut T, command: u8, payload: &[u8]) -> Result<(), BslError>
where
    T: AsyncWriteExt + Unpin,
{
    let frame = frame::encode_command(command, payload);
    log_debug(&format!("-> cmd 0x{command:02X} ({} byte payload)", payload.len()));
    transport
        .write_all(&frame)
        .await
        .map_err(|e| BslError::SerialIo(e.to_string()))
}

/// Reads a 1-byte ACK response. Length-driven: exactly one byte is ever
/// expected, so there is nothing to time out mid-frame on.
async fn recv_ack<T>(transport: &mut T) -> Result<Response, BslError>
where
    T: AsyncReadExt + Unpin,
{
    let mut buf = [0u8; 1];
    timeout(RESPONSE_DEADLINE, transport.read_exact(&mut buf))
        .await
        .map_err(|_| BslError::ResponseTimeout)?
        .map_err(|e| BslError::SerialIo(e.to_string()))?;
    frame::decode(&buf)
}

/// Reads a structured response frame. Length-driven completion: the header
/// fixes the total frame size, so exactly that many bytes are read with no
/// idle-gap guessing.
async fn recv_structured<T>(transport: &mut T) -> Result<Response, BslError>
where
    T: AsyncReadExt + Unpin,
{
    let mut head = [0u8; 4];
    timeout(RESPONSE_DEADLINE, transport.read_exact(&mut head))
        .await
        .map_err(|_| BslError::ResponseTimeout)?
        .map_err(|e| BslError::SerialIo(e.to_string()))?;

    if head[0] != RSP_ACK_BYTE || head[1] != RSP_HEADER {
        return Err(BslError::BadLength {
            expected: RSP_HEADER as usize,
            actual: head[1] as usize,
        });
    }

    let len = u16::from_le_bytes([head[2], head[3]]);
    let rest_len = frame::structured_frame_total_len(len) - head.len();
    let mut rest = vec![0u8; rest_len];
    timeout(RESPONSE_DEADLINE, transport.read_exact(&mut rest))
        .await
        .map_err(|_| BslError::ResponseTimeout)?
        .map_err(|e| BslError::SerialIo(e.to_string()))?;

    let mut full = head.to_vec();
    full.extend_from_slice(&rest);
    frame::decode(&full)
}

fn expect_core_message_success(resp: &Response, address: Option<u32>) -> Result<(), BslError> {
    match resp {
        Response::Structured { rsptype, payload } if *rsptype == RSPTYPE_CORE_MESSAGE => {
            let status = *payload.first().ok_or(BslError::FrameTooShort)?;
            if status == STATUS_SUCCESS {
                Ok(())
            } else {
                Err(BslError::BslCoreError {
                    code: status,
                    address,
                })
            }
        }
        Response::Ack => Err(BslError::ProtocolSequenceError {
            expected: "core message",
            actual: "ack",
        }),
        Response::Structured { .. } => Err(BslError::ProtocolSequenceError {
            expected: "core message",
            actual: "structured (wrong type)",
        }),
    }
}

async fn connect<T>(transport: &mut T) -> Result<(), BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    send(transport, CMD_CONNECT, &[]).await?;
    match recv_ack(transport).await? {
        Response::Ack => {
            log_info("connected");
            Ok(())
        }
        _ => Err(BslError::ProtocolSequenceError {
            expected: "ack",
            actual: "structured",
        }),
    }
}

async fn get_device_info<T>(transport: &mut T) -> Result<DeviceInfo, BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    send(transport, CMD_GET_DEVICE_INFO, &[]).await?;
    match recv_structured(transport).await? {
        Response::Structured { rsptype, payload } if rsptype == RSPTYPE_DEVICE_INFO => {
            DeviceInfo::decode(&payload)
        }
        _ => Err(BslError::ProtocolSequenceError {
            expected: "device info",
            actual: "unexpected response",
        }),
    }
}

async fn unlock<T>(transport: &mut T) -> Result<(), BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    send(transport, CMD_UNLOCK, &UNLOCK_PAYLOAD).await?;
    let resp = recv_structured(transport).await?;
    expect_core_message_success(&resp, None)?;
    log_info("unlocked");
    Ok(())
}

async fn erase_page<T>(transport: &mut T, page_addr: u32) -> Result<(), BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let mut payload = Vec::with_capacity(8);
    payload.extend_from_slice(&page_addr.to_le_bytes());
    payload.extend_from_slice(&PAGE_SIZE.to_le_bytes());
    send(transport, CMD_ERASE_PAGE, &payload).await?;
    let resp = recv_structured(transport).await?;
    expect_core_message_success(&resp, Some(page_addr))?;
    log_debug(&format!("erased page 0x{page_addr:08X}"));
    Ok(())
}

async fn program_segment<T>(transport: &mut T, start: u32, bytes: &[u8]) -> Result<(), BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let mut payload = Vec::with_capacity(4 + bytes.len());
    payload.extend_from_slice(&start.to_le_bytes());
    payload.extend_from_slice(bytes);
    send(transport, CMD_PROGRAM_DATA, &payload).await?;
    let resp = recv_structured(transport).await?;
    expect_core_message_success(&resp, Some(start))?;
    log_debug(&format!("programmed {} byte(s) at 0x{start:08X}", bytes.len()));
    Ok(())
}

async fn start_application<T>(transport: &mut T) -> Result<(), BslError>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    send(transport, CMD_START_APPLICATION, &[]).await?;
    match recv_ack(transport).await? {
        Response::Ack => {
            log_info("application started");
            Ok(())
        }
        _ => Err(BslError::ProtocolSequenceError {
            expected: "ack",
            actual: "structured",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_decode_roundtrip() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0x0100u16.to_le_bytes());
        payload.extend_from_slice(&0x0100u16.to_le_bytes());
        payload.extend_from_slice(&0u32.to_le_bytes());
        payload.extend_from_slice(&0x0001u16.to_le_bytes());
        payload.extend_from_slice(&0x06C0u16.to_le_bytes());
        payload.extend_from_slice(&0x2000_0160u32.to_le_bytes());
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&1u32.to_le_bytes());

        let info = DeviceInfo::decode(&payload).unwrap();
        assert!(info.validate().is_ok());
    }

    #[test]
    fn device_info_rejects_short_payload() {
        assert!(DeviceInfo::decode(&[0u8; 10]).is_err());
    }
}
