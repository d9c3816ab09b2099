//! Hex dump tokenizer.
//!
//! Accepts the `hcidump --raw` form (`> 04 3E 21 ...`, whitespace separated)
//! as well as a single contiguous hex string (`043E21...`).

use super::DecodeError;

/// Marker hcidump puts in front of incoming packets.
pub const RECORD_MARKER: char = '>';

/// Turn one raw record into its byte sequence.
pub fn tokenize(raw: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = raw.trim();
    let has_marker = trimmed.starts_with(RECORD_MARKER);
    let body = trimmed.strip_prefix(RECORD_MARKER).unwrap_or(trimmed);

    if !has_marker && !body.contains(char::is_whitespace) {
        return tokenize_contiguous(body);
    }

    body.split_whitespace()
        .enumerate()
        .map(|(position, token)| parse_token(token, position))
        .collect()
}

fn tokenize_contiguous(body: &str) -> Result<Vec<u8>, DecodeError> {
    if body.len() % 2 != 0 || !body.is_ascii() {
        // Report the dangling tail (or the whole string for non-ASCII input).
        let position = body.len() / 2;
        let token = if body.is_ascii() {
            body[position * 2..].to_string()
        } else {
            body.to_string()
        };
        return Err(DecodeError::MalformedToken { token, position });
    }

    (0..body.len() / 2)
        .map(|position| parse_token(&body[position * 2..position * 2 + 2], position))
        .collect()
}

/// Parse a single two-digit hex token.
pub fn parse_token(token: &str, position: usize) -> Result<u8, DecodeError> {
    let malformed = || DecodeError::MalformedToken {
        token: token.to_string(),
        position,
    };

    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed());
    }
    u8::from_str_radix(token, 16).map_err(|_| malformed())
}

/// Render a byte sequence in hcidump's raw form, marker included.
pub fn format_record(bytes: &[u8]) -> String {
    let mut line = String::with_capacity(2 + bytes.len() * 3);
    line.push(RECORD_MARKER);
    for byte in bytes {
        line.push_str(&format!(" {byte:02X}"));
    }
    line
}
