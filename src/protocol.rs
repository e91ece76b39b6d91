// MIT License - Copyright (c) 2026 Peter Wright
// TPI frame codec: checksums and frame decomposition

use crate::constants::CRLF;

/// One protocol frame split into its parts.
///
/// On the wire a frame is `<3-char code><data><2-char hex checksum>\r\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub code: String,
    pub data: String,
    pub checksum: String,
}

impl Frame {
    /// Whether the carried checksum matches `code + data`.
    pub fn is_valid(&self) -> bool {
        let mut payload = String::with_capacity(self.code.len() + self.data.len());
        payload.push_str(&self.code);
        payload.push_str(&self.data);
        checksum(&payload) == self.checksum
    }
}

/// Calculate the checksum of a payload.
///
/// Sum of the character codes, truncated to the low byte, formatted as two
/// uppercase hex digits.
pub fn checksum(payload: &str) -> String {
    let sum = payload.chars().fold(0u32, |acc, c| acc.wrapping_add(c as u32));
    format!("{:02X}", sum & 0xFF)
}

/// Validate the trailing checksum of a raw frame.
pub fn validate(frame: &str) -> bool {
    split(frame).is_valid()
}

/// Split a raw frame (terminator already stripped) into code, data and checksum.
///
/// Frames of five characters or fewer carry no data. Input shorter than that
/// still splits without error; it simply fails validation.
pub fn split(frame: &str) -> Frame {
    let chars: Vec<char> = frame.chars().collect();
    let len = chars.len();

    let code: String = chars.iter().take(3).collect();
    let data: String = if len > 5 {
        chars[3..len - 2].iter().collect()
    } else {
        String::new()
    };
    let checksum: String = chars[len.saturating_sub(2)..].iter().collect();

    Frame {
        code,
        data,
        checksum,
    }
}

/// Build the wire packet for an outbound command, terminator included.
pub fn encode_packet(code: &str, data: &str) -> String {
    let mut payload = String::with_capacity(code.len() + data.len() + 4);
    payload.push_str(code);
    payload.push_str(data);
    let sum = checksum(&payload);
    payload.push_str(&sum);
    payload.push_str(CRLF);
    payload
}
