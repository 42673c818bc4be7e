use bitstream::{BitReader, BitWriter};

#[test]
fn roundtrip_bits() {
    let mut writer = BitWriter::new();
    writer.write_bits(0b1010, 4).unwrap();
    writer.write_bits(0xAB, 8).unwrap();
    let bytes = writer.finish();

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
    assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
}

#[test]
fn roundtrip_mixed() {
    let mut writer = BitWriter::new();
    writer.write_bool(true);
    writer.write_bits(0b1010, 4).unwrap();
    writer.write_ubitvar(77).unwrap();
    writer.write_varu32(300);
    writer.write_vars32(-1);
    let bytes = writer.finish();

    let mut reader = BitReader::new(&bytes);
    assert!(reader.read_bit().unwrap());
    assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
    assert_eq!(reader.read_ubitvar().unwrap(), 77);
    assert_eq!(reader.read_varu32().unwrap(), 300);
    assert_eq!(reader.read_vars32().unwrap(), -1);
}

#[test]
fn varints_at_odd_bit_offsets() {
    // Varints are byte-structured but must decode at any bit position.
    let mut writer = BitWriter::new();
    writer.write_bits(0b101, 3).unwrap();
    writer.write_varu32(u32::MAX);
    writer.write_vars32(i32::MIN);
    let bytes = writer.finish();

    let mut reader = BitReader::new(&bytes);
    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(reader.read_varu32().unwrap(), u32::MAX);
    assert_eq!(reader.read_vars32().unwrap(), i32::MIN);
}

#[test]
fn format_range_does_not_move_the_cursor() {
    let mut writer = BitWriter::new();
    writer.write_bits(0b1100_0011, 8).unwrap();
    let bytes = writer.finish();

    let mut reader = BitReader::new(&bytes);
    reader.read_bits(8).unwrap();
    let rendered = reader.format_range(0, 8);
    assert_eq!(rendered, "11000011");
    assert_eq!(reader.bit_position(), 8);
}
