//! CRC-32 checksum used by the frame codec and standalone verification.
//!
//! Parameterization matches IEEE 802.3: reflected input/output, initial
//! value `0xFFFFFFFF`, final XOR `0xFFFFFFFF`.

use ::crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the CRC-32 over `span` and returns it little-endian encoded.
pub fn crc32(span: &[u8]) -> [u8; 4] {
    CRC32.checksum(span).to_le_bytes()
}

/// Computes the raw CRC-32 value over `span`.
pub fn crc32_value(span: &[u8]) -> u32 {
    CRC32.checksum(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanity_vector() {
        // Matches the sanity vector of spec section 8: crc32([0xFF]*32 ++ 0x21)
        let mut span = vec![0x21u8];
        span.extend_from_slice(&[0xFFu8; 32]);
        let crc = crc32(&span);
        assert_eq!(crc, [0x02, 0xAA, 0xF0, 0x3D]);
    }

    #[test]
    fn empty_span() {
        let crc = crc32_value(&[]);
        assert_eq!(crc, 0);
    }
}
