//! Field extractors shared by all beacon families.

use super::DecodeError;
use crate::mac_address::MacAddress;

/// Index of the first (least significant) advertiser address byte.
pub const MAC_ADDRESS_OFFSET: usize = 7;

/// Interpret a byte as a two's-complement signed value.
pub fn signed(byte: u8) -> i8 {
    if byte & 0x80 != 0 {
        -(i16::from(!byte) + 1) as i8
    } else {
        byte as i8
    }
}

fn byte_at(bytes: &[u8], offset: usize) -> Result<u8, DecodeError> {
    bytes.get(offset).copied().ok_or(DecodeError::OutOfRange {
        offset,
        len: bytes.len(),
    })
}

/// Advertiser address from indices 7..=12, transmitted least significant byte first.
pub fn mac_address(bytes: &[u8]) -> Result<MacAddress, DecodeError> {
    let end = MAC_ADDRESS_OFFSET + 6;
    let window: [u8; 6] = bytes
        .get(MAC_ADDRESS_OFFSET..end)
        .and_then(|window| window.try_into().ok())
        .ok_or(DecodeError::OutOfRange {
            offset: end - 1,
            len: bytes.len(),
        })?;
    Ok(MacAddress::from_le_bytes(window))
}

/// Signed TX power at `offset`.
pub fn tx_power(bytes: &[u8], offset: usize) -> Result<i8, DecodeError> {
    byte_at(bytes, offset).map(signed)
}

/// Signed RSSI, always the final byte.
pub fn rssi(bytes: &[u8]) -> Result<i8, DecodeError> {
    bytes
        .last()
        .copied()
        .map(signed)
        .ok_or(DecodeError::OutOfRange { offset: 0, len: 0 })
}

/// Pebblebee button state from the third-from-last byte.
///
/// Returns `None` when the value is not a button state, which turns the
/// record into an Unknown one.
pub fn pebblebee_button(bytes: &[u8]) -> Option<u8> {
    let index = bytes.len().checked_sub(3)?;
    match bytes[index] {
        state @ (0 | 1) => Some(state),
        _ => None,
    }
}

/// Printable ASCII following the `ruu.vi/#` signature, RSSI byte excluded.
pub fn ruuvi_data(bytes: &[u8], start: usize) -> String {
    let end = bytes.len().saturating_sub(1);
    bytes
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .take_while(|b| b.is_ascii_graphic())
        .map(|&b| char::from(b))
        .collect()
}
