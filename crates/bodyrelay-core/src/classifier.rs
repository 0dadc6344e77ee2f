//! Heuristic body encoding classification.
//!
//! The tag is advisory: it travels in `X-Body-Format` and the receiver
//! decides whether to decode. No decode is attempted here, so a body that
//! merely looks like base64 is tagged as such.

use std::fmt;

/// Encoding tag for a relayed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Base64,
    Plain,
}

impl BodyFormat {
    /// Value sent in the `X-Body-Format` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyFormat::Base64 => "base64",
            BodyFormat::Plain => "plain",
        }
    }
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'\r' | b'\n')
}

/// Tags `body` as base64 when it is non-empty, uses only the base64
/// alphabet plus CR/LF, and its length is a multiple of 4.
pub fn classify(body: &[u8]) -> BodyFormat {
    if !body.is_empty() && body.len() % 4 == 0 && body.iter().all(|&b| is_base64_byte(b)) {
        BodyFormat::Base64
    } else {
        BodyFormat::Plain
    }
}
