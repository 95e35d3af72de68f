//! Byte conversion helpers used when reading decoded values

/// Big-endian unsigned integer from up to eight bytes
pub fn be_uint(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > 8 {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
}

/// Pack a two-digit decimal value (0-99) into one BCD byte
pub const fn bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Printable ASCII view of a value, non-printable bytes replaced with '.'
pub fn ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

/// Short File Identifier from the first byte of an AFL entry
pub const fn sfi_from_afl_byte(byte: u8) -> u8 {
    byte >> 3
}

/// P2 for READ RECORD: SFI in the upper five bits, "P1 is a record number" flag
pub const fn read_record_p2(sfi: u8) -> u8 {
    (sfi << 3) | 0x04
}
