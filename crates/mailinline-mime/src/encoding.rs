//! Content transfer encodings.
//!
//! Supports Base64 decoding, Quoted-Printable in both directions and
//! conversion between text and its declared charset.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    #[default]
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from a header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }

    /// Decodes a raw body according to this encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid for the encoding.
    pub fn decode(self, raw: &str) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => {
                // Line breaks are allowed between base64 quanta
                let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
                decode_base64(&cleaned)
            }
            Self::QuotedPrintable => decode_quoted_printable(raw),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(raw.as_bytes().to_vec()),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Decodes Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes data using Quoted-Printable encoding (RFC 2045).
///
/// Hard line breaks are kept as CRLF; long lines are soft-wrapped.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len());

    for (i, line) in data.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        encode_quoted_printable_line(line, &mut result);
    }

    result
}

fn encode_quoted_printable_line(bytes: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        let last = i + 1 == bytes.len();
        let width = match byte {
            b'!'..=b'<' | b'>'..=b'~' => 1,
            // Trailing whitespace must be encoded
            b' ' | b'\t' if !last => 1,
            _ => 3,
        };

        // Room for the soft break '='
        if line_length + width > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if width == 1 {
            out.push(byte as char);
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += width;
    }
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match bytes.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => {
                i += 3;
                continue;
            }
            Some([b'\n', _]) => {
                i += 2;
                continue;
            }
            _ if bytes.get(i + 1) == Some(&b'\n') => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let hex = bytes
            .get(i + 1..i + 3)
            .and_then(|h| std::str::from_utf8(h).ok())
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let decoded = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex {hex:?}: {e}")))?;
        result.push(decoded);
        i += 3;
    }

    Ok(result)
}

/// Decodes text bytes written in `charset`.
///
/// A missing or unknown label is read as UTF-8.
///
/// # Errors
///
/// Returns an error if the bytes are not valid in the charset.
pub fn decode_charset(bytes: Vec<u8>, charset: Option<&str>) -> Result<String> {
    match charset.and_then(|label| Encoding::for_label(label.trim().as_bytes())) {
        Some(encoding) if encoding != UTF_8 => {
            let (text, malformed) = encoding.decode_without_bom_handling(&bytes);
            if malformed {
                return Err(Error::InvalidEncoding(format!(
                    "Body is not valid {}",
                    encoding.name()
                )));
            }
            Ok(text.into_owned())
        }
        _ => Ok(String::from_utf8(bytes)?),
    }
}

/// Encodes text in `charset`.
///
/// Returns `None` if the label is unknown, if the charset cannot be
/// written (UTF-16) or if it cannot represent every character of `text`.
#[must_use]
pub fn encode_charset<'a>(text: &'a str, charset: &str) -> Option<Cow<'a, [u8]>> {
    let encoding = Encoding::for_label(charset.trim().as_bytes())?;
    let (bytes, used, unmappable) = encoding.encode(text);
    (used == encoding && !unmappable).then_some(bytes)
}
