use mspm0_bsl::frame::{decode, encode, Response};

#[test]
fn round_trip_ack() {
    let bytes = vec![0x00u8];
    let resp = decode(&bytes).unwrap();
    assert_eq!(resp, Response::Ack);
}

#[test]
fn round_trip_arbitrary_payload() {
    for payload_len in [0usize, 1, 8, 32, 255] {
        let payload: Vec<u8> = (0..payload_len).map(|i| (i % 256) as u8).collect();
        let frame = encode(0x80, 0x20, &payload);

        // header(1) + len(2) + command(1) + payload + crc(4)
        assert_eq!(frame.len(), 1 + 2 + 1 + payload.len() + 4);
        assert_eq!(frame[0], 0x80);
        let len = u16::from_le_bytes([frame[1], frame[2]]);
        assert_eq!(len as usize, payload.len() + 1);
        assert_eq!(frame[3], 0x20);
    }
}

#[test]
fn decode_rejects_truncated_structured_frame() {
    let buf = vec![0x00u8, 0x08, 0x05, 0x00, 0x3B];
    assert!(decode(&buf).is_err());
}
