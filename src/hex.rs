//! Intel HEX parser.
//!
//! Consumes a line-oriented Intel HEX text stream and emits an ordered list
//! of raw (address, bytes) segments, honoring extended-linear-address
//! records. Segment accumulation (contiguous-address tracking, the
//! 1024-byte cap) happens here so the image normalizer only has to enforce
//! alignment and padding.

use crate::constants::MAX_SEGMENT_LEN;
use crate::error::BslError;
use crate::logging::log_warn;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;
const RECORD_EXT_SEGMENT_ADDRESS: u8 = 0x02;
const RECORD_START_SEGMENT_ADDRESS: u8 = 0x03;
const RECORD_EXT_LINEAR_ADDRESS: u8 = 0x04;
const RECORD_START_LINEAR_ADDRESS: u8 = 0x05;

/// A raw segment as emitted by the parser, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment {
    pub start_address: u32,
    pub bytes: Vec<u8>,
}

struct RawRecord {
    address: u16,
    record_type: u8,
    data: Vec<u8>,
}

/// Parses an Intel HEX text stream into an ordered list of raw segments.
pub fn parse(content: &str) -> Result<Vec<RawSegment>, BslError> {
    let mut upper_word: u32 = 0;
    let mut next_contiguous_address: Option<u32> = None;
    let mut current: Option<RawSegment> = None;
    let mut segments = Vec::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() {
            continue;
        }
        if !line.starts_with(':') {
            log_warn(&format!("hex line {line_num}: skipping non-record line"));
            continue;
        }

        let rec = parse_record(line, line_num)?;

        match rec.record_type {
            RECORD_DATA => {
                let full_address = upper_word | (rec.address as u32);
                match (&mut current, next_contiguous_address) {
                    (Some(seg), Some(next)) if full_address == next && seg.bytes.len() < MAX_SEGMENT_LEN => {
                        seg.bytes.extend_from_slice(&rec.data);
                        let new_next = full_address + rec.data.len() as u32;
                        next_contiguous_address = Some(new_next);
                        if seg.bytes.len() >= MAX_SEGMENT_LEN {
                            segments.push(current.take().unwrap());
                            next_contiguous_address = Some(new_next);
                        }
                    }
                    _ => {
                        if let Some(seg) = current.take() {
                            segments.push(seg);
                        }
                        current = Some(RawSegment {
                            start_address: full_address,
                            bytes: rec.data.clone(),
                        });
                        next_contiguous_address = Some(full_address + rec.data.len() as u32);
                    }
                }
            }
            RECORD_EOF => break,
            RECORD_EXT_LINEAR_ADDRESS => {
                if rec.data.len() != 2 {
                    return Err(BslError::HexParse {
                        line: line_num,
                        reason: "extended linear address must be 2 bytes".to_string(),
                    });
                }
                if let Some(seg) = current.take() {
                    segments.push(seg);
                }
                next_contiguous_address = None;
                upper_word = ((rec.data[0] as u32) << 24) | ((rec.data[1] as u32) << 16);
            }
            RECORD_EXT_SEGMENT_ADDRESS | RECORD_START_SEGMENT_ADDRESS | RECORD_START_LINEAR_ADDRESS => {
                if let Some(seg) = current.take() {
                    segments.push(seg);
                }
                next_contiguous_address = None;
            }
            other => {
                log_warn(&format!(
                    "hex line {line_num}: ignoring unsupported record type 0x{other:02X}"
                ));
            }
        }
    }

    if let Some(seg) = current.take() {
        segments.push(seg);
    }

    Ok(segments)
}

fn parse_record(line: &str, line_num: usize) -> Result<RawRecord, BslError> {
    let hex = &line[1..];
    if hex.len() < 10 {
        return Err(BslError::HexParse {
            line: line_num,
            reason: "record too short".to_string(),
        });
    }

    let byte_count = parse_hex_u8(hex, 0, line_num)?;
    let address = parse_hex_u16(hex, 2, line_num)?;
    let record_type = parse_hex_u8(hex, 6, line_num)?;

    let expected_len = 8 + (byte_count as usize * 2) + 2;
    if hex.len() < expected_len {
        return Err(BslError::HexParse {
            line: line_num,
            reason: "data truncated".to_string(),
        });
    }

    let mut data = Vec::with_capacity(byte_count as usize);
    for i in 0..byte_count as usize {
        data.push(parse_hex_u8(hex, 8 + i * 2, line_num)?);
    }

    Ok(RawRecord {
        address,
        record_type,
        data,
    })
}

fn parse_hex_u8(hex: &str, offset: usize, line_num: usize) -> Result<u8, BslError> {
    u8::from_str_radix(&hex[offset..offset + 2], 16).map_err(|_| BslError::HexParse {
        line: line_num,
        reason: format!("invalid hex at offset {offset}"),
    })
}

fn parse_hex_u16(hex: &str, offset: usize, line_num: usize) -> Result<u16, BslError> {
    u16::from_str_radix(&hex[offset..offset + 4], 16).map_err(|_| BslError::HexParse {
        line: line_num,
        reason: format!("invalid hex at offset {offset}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_data_record() {
        let hex = ":08000000000102030405060709\n:00000001FF\n";
        let segs = parse(hex).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start_address, 0);
        assert_eq!(segs[0].bytes, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn extended_linear_address() {
        let hex = ":020000040800F2\n:08000000112233445566778854\n:00000001FF\n";
        let segs = parse(hex).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start_address, 0x0800_0000);
    }

    #[test]
    fn non_contiguous_split() {
        let mut hex = String::new();
        hex.push_str(&format_record(0x0000, 0x00, &[0x11; 8]));
        hex.push('\n');
        hex.push_str(&format_record(0x0100, 0x00, &[0x22; 8]));
        hex.push('\n');
        hex.push_str(":00000001FF\n");
        let segs = parse(&hex).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].start_address, 0x0000_0000);
        assert_eq!(segs[1].start_address, 0x0000_0100);
    }

    #[test]
    fn segment_capped_at_1024() {
        let mut lines = String::new();
        // 1032 bytes total, 16-byte records, contiguous from 0.
        for i in 0..64u32 {
            let addr = (i * 16) as u16;
            let data: Vec<u8> = vec![0xA5; 16];
            lines.push_str(&format_record(addr, 0x00, &data));
            lines.push('\n');
        }
        lines.push_str(&format_record(1024, 0x00, &[0xA5; 8]));
        lines.push('\n');
        lines.push_str(":00000001FF\n");
        let segs = parse(&lines).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].start_address, 0);
        assert_eq!(segs[0].bytes.len(), 1024);
        assert_eq!(segs[1].start_address, 1024);
        assert_eq!(segs[1].bytes.len(), 8);
    }

    fn format_record(address: u16, record_type: u8, data: &[u8]) -> String {
        let mut sum: u8 = data.len() as u8;
        sum = sum.wrapping_add((address >> 8) as u8);
        sum = sum.wrapping_add((address & 0xFF) as u8);
        sum = sum.wrapping_add(record_type);
        for &b in data {
            sum = sum.wrapping_add(b);
        }
        let checksum = (!sum).wrapping_add(1);
        let mut s = format!(":{:02X}{:04X}{:02X}", data.len(), address, record_type);
        for b in data {
            s.push_str(&format!("{b:02X}"));
        }
        s.push_str(&format!("{checksum:02X}"));
        s
    }

    #[test]
    fn rejects_missing_start_code() {
        assert!(parse("000000040000FA\n").unwrap().is_empty());
    }
}
