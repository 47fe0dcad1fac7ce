//! Device-side loopback simulator: answers the same wire protocol the
//! client speaks, without any real flash behind it, so the programmer can
//! be exercised end-to-end without hardware.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::constants::*;
use crate::crc::crc32_value;
use crate::error::BslError;
use crate::logging::{log_debug, log_warn};

/// Device-side state: only the accumulated programmed bytes persist across
/// requests (used to answer standalone-verify).
#[derive(Debug, Default)]
pub struct Simulator {
    pub programmed_bytes: Vec<u8>,
}

impl Simulator {
    pub fn new() -> Self {
        Simulator::default()
    }

    /// Runs the request/response loop against `transport` until the
    /// transport is closed (read returns EOF).
    pub async fn run<T>(&mut self, transport: &mut T) -> Result<(), BslError>
    where
        T: AsyncReadExt + AsyncWriteExt + Unpin,
    {
        loop {
            let frame = match read_frame(transport).await {
                Ok(Some(f)) => f,
                Ok(None) => return Ok(()),
                Err(e) => {
                    log_warn(&format!("discarding malformed frame: {e}"));
                    continue;
                }
            };

            if let Some(reply) = self.dispatch(&frame) {
                transport
                    .write_all(&reply)
                    .await
                    .map_err(|e| BslError::SerialIo(e.to_string()))?;
            }
        }
    }

    /// Dispatches a single already-framed, CRC-valid request and returns
    /// the reply bytes to send, or `None` if the frame is silently dropped
    /// (e.g. misaligned program-data).
    fn dispatch(&mut self, frame: &ParsedCommandFrame) -> Option<Vec<u8>> {
        match frame.command {
            CMD_CONNECT => Some(vec![RSP_ACK_BYTE]),
            CMD_GET_DEVICE_INFO => {
                let mut payload = Vec::with_capacity(24);
                payload.extend_from_slice(&EXPECTED_CMD_INTERP_VERSION.to_le_bytes());
                payload.extend_from_slice(&EXPECTED_BUILD_ID.to_le_bytes());
                payload.extend_from_slice(&EXPECTED_APP_VERSION.to_le_bytes());
                payload.extend_from_slice(&EXPECTED_PLUGIN_VERSION.to_le_bytes());
                payload.extend_from_slice(&SIMULATOR_MAX_BUFFER_SIZE.to_le_bytes());
                payload.extend_from_slice(&EXPECTED_BUFFER_START_ADDRESS.to_le_bytes());
                payload.extend_from_slice(&EXPECTED_BCR_ID.to_le_bytes());
                payload.extend_from_slice(&EXPECTED_BSL_ID.to_le_bytes());
                Some(structured_reply(RSPTYPE_DEVICE_INFO, &payload))
            }
            CMD_UNLOCK => Some(core_message_reply(STATUS_SUCCESS)),
            CMD_ERASE_PAGE => Some(core_message_reply(STATUS_SUCCESS)),
            CMD_PROGRAM_DATA => {
                if frame.payload.len() < 4 {
                    log_warn("program-data frame shorter than address prefix");
                    return None;
                }
                let address = u32::from_le_bytes([
                    frame.payload[0],
                    frame.payload[1],
                    frame.payload[2],
                    frame.payload[3],
                ]);
                let data = &frame.payload[4..];
                if address % ALIGNMENT != 0 || data.len() % ALIGNMENT as usize != 0 {
                    log_warn(&format!(
                        "rejecting misaligned program-data at 0x{address:08X} ({} bytes)",
                        data.len()
                    ));
                    return None;
                }
                self.programmed_bytes.extend_from_slice(data);
                Some(core_message_reply(STATUS_SUCCESS))
            }
            CMD_STANDALONE_VERIFY => {
                if frame.payload.len() < 8 {
                    log_warn("standalone-verify frame shorter than addr/length prefix");
                    return None;
                }
                let length = u32::from_le_bytes([
                    frame.payload[4],
                    frame.payload[5],
                    frame.payload[6],
                    frame.payload[7],
                ]) as usize;
                let span_end = length.min(self.programmed_bytes.len());
                let crc = crc32_value(&self.programmed_bytes[0..span_end]);
                Some(structured_reply(RSPTYPE_STANDALONE_VERIFY, &crc.to_le_bytes()))
            }
            CMD_START_APPLICATION => Some(vec![RSP_ACK_BYTE]),
            other => {
                log_warn(&format!("ignoring unknown command 0x{other:02X}"));
                None
            }
        }
    }
}

fn core_message_reply(status: u8) -> Vec<u8> {
    structured_reply(RSPTYPE_CORE_MESSAGE, &[status])
}

fn structured_reply(rsptype: u8, payload: &[u8]) -> Vec<u8> {
    let mut rsptype_and_payload = Vec::with_capacity(1 + payload.len());
    rsptype_and_payload.push(rsptype);
    rsptype_and_payload.extend_from_slice(payload);
    let len = (rsptype_and_payload.len() as u16).to_le_bytes();
    let crc = crate::crc::crc32(&rsptype_and_payload);

    let mut out = vec![RSP_ACK_BYTE, RSP_HEADER];
    out.extend_from_slice(&len);
    out.extend_from_slice(&rsptype_and_payload);
    out.extend_from_slice(&crc);
    out
}

struct ParsedCommandFrame {
    command: u8,
    payload: Vec<u8>,
}

/// Reads one command frame off `transport`, recovering framing the way the
/// wire protocol's header describes: once 3 bytes are buffered, the length
/// field fixes the remaining byte count. Returns `Ok(None)` on clean EOF
/// before any byte of a new frame arrives.
async fn read_frame<T>(transport: &mut T) -> Result<Option<ParsedCommandFrame>, BslError>
where
    T: AsyncReadExt + Unpin,
{
    let mut header = [0u8; 3];
    if let Err(e) = transport.read_exact(&mut header[..1]).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
        return Err(BslError::SerialIo(e.to_string()));
    }
    if header[0] != CMD_HEADER {
        return Err(BslError::BadLength {
            expected: CMD_HEADER as usize,
            actual: header[0] as usize,
        });
    }

    transport
        .read_exact(&mut header[1..3])
        .await
        .map_err(|e| BslError::SerialIo(e.to_string()))?;
    let length = u16::from_le_bytes([header[1], header[2]]) as usize;

    let mut rest = vec![0u8; length + 4];
    transport
        .read_exact(&mut rest)
        .await
        .map_err(|e| BslError::SerialIo(e.to_string()))?;

    let command_and_payload = &rest[0..length];
    let trailing_crc = u32::from_le_bytes([
        rest[length],
        rest[length + 1],
        rest[length + 2],
        rest[length + 3],
    ]);
    let computed = crc32_value(command_and_payload);
    if computed != trailing_crc {
        log_debug("frame CRC mismatch");
        return Err(BslError::CrcMismatch {
            expected: computed,
            actual: trailing_crc,
        });
    }

    let command = command_and_payload[0];
    let payload = command_and_payload[1..].to_vec();
    Ok(Some(ParsedCommandFrame { command, payload }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    #[tokio::test]
    async fn connect_replies_ack() {
        let (mut client, mut device) = tokio::io::duplex(256);
        let mut sim = Simulator::new();

        let handle = tokio::spawn(async move {
            let _ = sim.run(&mut device).await;
            sim
        });

        let frame = frame::encode_command(CMD_CONNECT, &[]);
        client.write_all(&frame).await.unwrap();

        let mut resp = [0u8; 1];
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(resp[0], 0x00);

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn program_then_verify_round_trip() {
        let (mut client, mut device) = tokio::io::duplex(4096);
        let sim_handle = tokio::spawn(async move {
            let mut sim = Simulator::new();
            let _ = sim.run(&mut device).await;
            sim
        });

        let segments: [(u32, u8); 3] = [(0, 0x00), (0x10, 0x01), (0x20, 0x02)];
        for (addr, fill) in segments {
            let mut payload = Vec::new();
            payload.extend_from_slice(&addr.to_le_bytes());
            payload.extend_from_slice(&[fill; 8]);
            let frame = frame::encode_command(CMD_PROGRAM_DATA, &payload);
            client.write_all(&frame).await.unwrap();

            let mut resp = vec![0u8; 4 + 2 + 4];
            client.read_exact(&mut resp).await.unwrap();
        }

        let mut verify_payload = Vec::new();
        verify_payload.extend_from_slice(&0u32.to_le_bytes());
        verify_payload.extend_from_slice(&24u32.to_le_bytes());
        let frame = frame::encode_command(CMD_STANDALONE_VERIFY, &verify_payload);
        client.write_all(&frame).await.unwrap();

        let mut resp = vec![0u8; 4 + 4 + 4];
        client.read_exact(&mut resp).await.unwrap();
        let decoded = crate::frame::decode(&resp).unwrap();
        match decoded {
            crate::frame::Response::Structured { rsptype, payload } => {
                assert_eq!(rsptype, RSPTYPE_STANDALONE_VERIFY);
                let crc = u32::from_le_bytes(payload.try_into().unwrap());
                let mut expected_bytes = vec![0x00u8; 8];
                expected_bytes.extend_from_slice(&[0x01u8; 8]);
                expected_bytes.extend_from_slice(&[0x02u8; 8]);
                assert_eq!(crc, crc32_value(&expected_bytes));
            }
            other => panic!("unexpected response: {other:?}"),
        }

        drop(client);
        sim_handle.await.unwrap();
    }

    #[tokio::test]
    async fn bad_crc_frame_gets_no_reply() {
        let (mut client, mut device) = tokio::io::duplex(256);
        tokio::spawn(async move {
            let mut sim = Simulator::new();
            let _ = sim.run(&mut device).await;
        });

        let mut frame = frame::encode_command(CMD_UNLOCK, &[0xFF; 32]);
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;
        client.write_all(&frame).await.unwrap();

        // Follow up with a well-formed connect; only its reply should arrive.
        let good = frame::encode_command(CMD_CONNECT, &[]);
        client.write_all(&good).await.unwrap();

        let mut resp = [0u8; 1];
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(resp[0], 0x00);
    }
}
