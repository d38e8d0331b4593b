//! Packed BCD conversion

/// Packed BCD byte to binary (`0x59` -> 59)
pub const fn bcd_to_dec(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Binary to packed BCD byte (59 -> `0x59`)
///
/// Only meaningful for values below 100.
pub const fn dec_to_bcd(dec: u8) -> u8 {
    ((dec / 10) << 4) | (dec % 10)
}

/// Whether both nibbles are decimal digits
pub const fn is_valid_bcd(bcd: u8) -> bool {
    bcd >> 4 <= 9 && bcd & 0x0F <= 9
}
