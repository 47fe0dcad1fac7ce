//! The Image data model: normalized, alignment-checked Segments, plus the
//! optional interim-file persisted form (see section 6.4).

use crate::constants::ALIGNMENT;
use crate::error::BslError;
use crate::hex::RawSegment;

/// A contiguous, 8-byte-aligned block of firmware bytes with a start
/// address. `bytes.len()` is a positive multiple of 8, capped at 1024.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start_address: u32,
    pub bytes: Vec<u8>,
}

/// An ordered sequence of Segments in parse order. Segments never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    pub segments: Vec<Segment>,
}

impl Image {
    /// Parses Intel HEX text and normalizes the result into an Image.
    pub fn from_hex(content: &str) -> Result<Self, BslError> {
        let raw = crate::hex::parse(content)?;
        Self::from_raw_segments(raw)
    }

    /// Normalizes raw parsed segments into an Image: rejects misaligned or
    /// empty segments, pads tails to a multiple of 8 with 0xFF.
    pub fn from_raw_segments(raw: Vec<RawSegment>) -> Result<Self, BslError> {
        let mut segments = Vec::with_capacity(raw.len());
        for seg in raw {
            if seg.bytes.is_empty() {
                return Err(BslError::EmptySegment {
                    address: seg.start_address,
                });
            }
            if seg.start_address % ALIGNMENT != 0 {
                return Err(BslError::MisalignedSegment {
                    address: seg.start_address,
                });
            }

            let mut bytes = seg.bytes;
            let remainder = bytes.len() % ALIGNMENT as usize;
            if remainder != 0 {
                let pad = ALIGNMENT as usize - remainder;
                bytes.extend(std::iter::repeat(0xFFu8).take(pad));
            }

            segments.push(Segment {
                start_address: seg.start_address,
                bytes,
            });
        }

        Ok(Image { segments })
    }

    /// Total programmed byte count across all segments.
    pub fn total_bytes(&self) -> usize {
        self.segments.iter().map(|s| s.bytes.len()).sum()
    }

    /// Serializes the normalized image to the interim file byte layout
    /// (section 6.4): a reserved header, an "ADDR" table of (address,
    /// length) pairs, then a "DATA" section of length-prefixed payloads.
    pub fn to_interim_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; 256];

        out.extend_from_slice(b"ADDR");
        out.extend_from_slice(&(self.segments.len() as u16).to_le_bytes());
        for seg in &self.segments {
            out.extend_from_slice(&seg.start_address.to_le_bytes());
            out.extend_from_slice(&(seg.bytes.len() as u16).to_le_bytes());
        }

        out.extend_from_slice(b"DATA");
        for seg in &self.segments {
            out.extend_from_slice(&(seg.bytes.len() as u16).to_le_bytes());
            out.extend_from_slice(&seg.bytes);
        }

        out
    }

    /// Parses the interim file byte layout back into an Image.
    pub fn from_interim_bytes(buf: &[u8]) -> Result<Self, BslError> {
        if buf.len() < 256 + 4 + 2 {
            return Err(BslError::HexParse {
                line: 0,
                reason: "interim file too short".to_string(),
            });
        }
        if &buf[256..260] != b"ADDR" {
            return Err(BslError::HexParse {
                line: 0,
                reason: "missing ADDR marker".to_string(),
            });
        }

        let count = u16::from_le_bytes([buf[260], buf[261]]) as usize;
        let mut cursor = 262;
        let mut lengths = Vec::with_capacity(count);
        for _ in 0..count {
            if buf.len() < cursor + 6 {
                return Err(BslError::HexParse {
                    line: 0,
                    reason: "truncated ADDR table".to_string(),
                });
            }
            let addr = u32::from_le_bytes([
                buf[cursor],
                buf[cursor + 1],
                buf[cursor + 2],
                buf[cursor + 3],
            ]);
            let len = u16::from_le_bytes([buf[cursor + 4], buf[cursor + 5]]);
            lengths.push((addr, len));
            cursor += 6;
        }

        if buf.len() < cursor + 4 || &buf[cursor..cursor + 4] != b"DATA" {
            return Err(BslError::HexParse {
                line: 0,
                reason: "missing DATA marker".to_string(),
            });
        }
        cursor += 4;

        let mut segments = Vec::with_capacity(count);
        for (addr, len) in lengths {
            if buf.len() < cursor + 2 {
                return Err(BslError::HexParse {
                    line: 0,
                    reason: "truncated DATA section".to_string(),
                });
            }
            let declared_len = u16::from_le_bytes([buf[cursor], buf[cursor + 1]]);
            cursor += 2;
            if declared_len != len {
                return Err(BslError::HexParse {
                    line: 0,
                    reason: "ADDR/DATA length mismatch".to_string(),
                });
            }
            if buf.len() < cursor + len as usize {
                return Err(BslError::HexParse {
                    line: 0,
                    reason: "truncated segment payload".to_string(),
                });
            }
            let bytes = buf[cursor..cursor + len as usize].to_vec();
            cursor += len as usize;
            segments.push(Segment {
                start_address: addr,
                bytes,
            });
        }

        Ok(Image { segments })
    }
}
