//! UriBeacon compact URL encoding.
//!
//! See <https://github.com/google/uribeacon/blob/master/specification/AdvertisingMode.md>.

use super::DecodeError;

/// URI scheme prefixes, indexed by scheme code.
pub const SCHEMES: [&str; 5] = ["http://www.", "https://www.", "http://", "https://", "urn:uuid:"];

/// Expansion codes, indexed by byte value. Bytes past the table are literal.
pub const SUFFIXES: [&str; 14] = [
    ".com/", ".org/", ".edu/", ".net/", ".info/", ".biz/", ".gov/", ".com", ".org", ".edu", ".net",
    ".info", ".biz", ".gov",
];

/// Bytes in the service data block before the scheme code:
/// length, type, UUID (2), flags, TX power.
const SCHEME_OFFSET: usize = 6;

pub fn scheme(code: u8) -> Result<&'static str, DecodeError> {
    SCHEMES
        .get(usize::from(code))
        .copied()
        .ok_or(DecodeError::UnknownScheme(code))
}

/// Expansion for a suffix code; `UnknownSuffix` marks a literal byte.
pub fn suffix(code: u8) -> Result<&'static str, DecodeError> {
    SUFFIXES
        .get(usize::from(code))
        .copied()
        .ok_or(DecodeError::UnknownSuffix(code))
}

/// Expand encoded URL bytes (no scheme) onto `url`.
fn expand_into(url: &mut String, encoded: &[u8]) {
    for &byte in encoded {
        match suffix(byte) {
            Ok(expansion) => url.push_str(expansion),
            Err(_) => url.push(char::from(byte)),
        }
    }
}

/// Expand a bare compact URL: scheme code followed by encoded bytes.
pub fn expand_url(bytes: &[u8]) -> Result<String, DecodeError> {
    let (&code, encoded) = bytes
        .split_first()
        .ok_or(DecodeError::OutOfRange { offset: 0, len: 0 })?;
    let mut url = scheme(code)?.to_string();
    expand_into(&mut url, encoded);
    Ok(url)
}

/// Decode the URL carried in a UriBeacon service data block.
///
/// `block_start` is the index of the block's length byte and `ad_length` its
/// value. The scheme code sits at `block_start + 6` and the remaining
/// `ad_length - 6` bytes are the encoded URL. A block shorter than its
/// fixed header fails with `OutOfRange`.
pub fn decode_uri(bytes: &[u8], block_start: usize, ad_length: usize) -> Result<String, DecodeError> {
    let scheme_at = block_start + SCHEME_OFFSET;
    if ad_length < SCHEME_OFFSET {
        return Err(DecodeError::OutOfRange {
            offset: scheme_at,
            len: bytes.len(),
        });
    }
    let code = *bytes.get(scheme_at).ok_or(DecodeError::OutOfRange {
        offset: scheme_at,
        len: bytes.len(),
    })?;
    let mut url = scheme(code)?.to_string();

    let start = scheme_at + 1;
    let end = start + (ad_length - SCHEME_OFFSET);
    let encoded = bytes.get(start..end).ok_or(DecodeError::OutOfRange {
        offset: end - 1,
        len: bytes.len(),
    })?;
    expand_into(&mut url, encoded);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_url_literal() {
        let bytes = [0x02, 0x63, 0x73, 0x72, 0x2E, 0x63, 0x6F, 0x6D];
        assert_eq!(expand_url(&bytes).unwrap(), "http://csr.com");
    }

    #[test]
    fn test_expand_url_with_suffix_codes() {
        // https://www.example.org/abc
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(b"example");
        bytes.push(0x01);
        bytes.extend_from_slice(b"abc");
        assert_eq!(expand_url(&bytes).unwrap(), "https://www.example.org/abc");

        assert_eq!(expand_url(&[0x00, b'x', 0x0D]).unwrap(), "http://www.x.gov");
        assert_eq!(expand_url(&[0x04]).unwrap(), "urn:uuid:");
    }

    #[test]
    fn test_suffix_boundary() {
        // 13 is the last table entry, 14 is a literal control character
        assert_eq!(expand_url(&[0x03, 0x0D]).unwrap(), "https://.gov");
        assert_eq!(expand_url(&[0x03, 0x0E]).unwrap(), "https://\u{0e}");
    }

    #[test]
    fn test_unknown_scheme() {
        assert_eq!(expand_url(&[0x05, b'a']), Err(DecodeError::UnknownScheme(5)));
        assert_eq!(scheme(0xFF), Err(DecodeError::UnknownScheme(0xFF)));
    }

    #[test]
    fn test_unknown_suffix() {
        assert_eq!(suffix(14), Err(DecodeError::UnknownSuffix(14)));
        assert_eq!(suffix(4), Ok(".info/"));
    }

    #[test]
    fn test_expand_url_empty() {
        assert!(expand_url(&[]).is_err());
    }

    #[test]
    fn test_decode_uri_block() {
        // 0D 16 D8 FE 00 14 | 02 | csr.com | RSSI
        let bytes = [
            0x0D, 0x16, 0xD8, 0xFE, 0x00, 0x14, 0x02, 0x63, 0x73, 0x72, 0x2E, 0x63, 0x6F, 0x6D,
            0xA7,
        ];
        assert_eq!(decode_uri(&bytes, 0, 0x0D).unwrap(), "http://csr.com");
    }

    #[test]
    fn test_decode_uri_truncated_block() {
        let bytes = [0x0D, 0x16, 0xD8, 0xFE, 0x00, 0x14, 0x02, 0x63, 0x73];
        assert_eq!(
            decode_uri(&bytes, 0, 0x0D),
            Err(DecodeError::OutOfRange { offset: 13, len: 9 })
        );
        assert_eq!(
            decode_uri(&bytes[..5], 0, 0x0D),
            Err(DecodeError::OutOfRange { offset: 6, len: 5 })
        );
    }

    #[test]
    fn test_decode_uri_block_shorter_than_header() {
        let bytes = [0x03, 0x16, 0xD8, 0xFE, 0x00, 0x14, 0x02, 0x63, 0xA7];
        assert_eq!(
            decode_uri(&bytes, 0, 3),
            Err(DecodeError::OutOfRange { offset: 6, len: 9 })
        );
        // header only: scheme without URL body
        assert_eq!(decode_uri(&bytes, 0, 6).unwrap(), "http://");
    }
}
