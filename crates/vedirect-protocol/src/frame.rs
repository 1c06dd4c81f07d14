//! Completed telemetry frames and typed field access.

use std::collections::HashMap;

/// One complete, checksum-verified set of telemetry fields.
///
/// Field names map to their text values; a name repeated within a frame
/// keeps its last value. Accessors parse on demand and return `None` for
/// absent or malformed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    fields: HashMap<String, String>,
}

impl Frame {
    pub fn new() -> Self {
        Frame::default()
    }

    /// Store a field, replacing any previous value under the same name.
    ///
    /// The parser is the normal producer; this is public so tests and
    /// simulators can assemble frames directly.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Raw text value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Signed decimal field, as sent by the device (`12800`, `-1500`).
    pub fn decimal(&self, name: &str) -> Option<i64> {
        self.get(name)?.trim().parse().ok()
    }

    /// 16-bit hex field with optional `0x` prefix (`0xA057` or `A057`).
    pub fn hex16(&self, name: &str) -> Option<u16> {
        u16::from_str_radix(strip_hex_prefix(self.get(name)?.trim()), 16).ok()
    }

    /// 32-bit hex field with optional `0x` prefix.
    pub fn hex32(&self, name: &str) -> Option<u32> {
        u32::from_str_radix(strip_hex_prefix(self.get(name)?.trim()), 16).ok()
    }

    pub(crate) fn take(&mut self) -> Frame {
        std::mem::take(self)
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Device-side frame encoder: emits `\r\n`-prefixed records followed by a
/// `Checksum` record whose byte brings the frame sum to zero modulo 256.
///
/// Used by tests and replay generators to produce well-formed input.
pub fn encode_frame(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in fields {
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(name.as_bytes());
        out.push(b'\t');
        out.extend_from_slice(value.as_bytes());
    }
    // Devices send the label in mixed case; the parser uppercases it.
    out.extend_from_slice(b"\r\nChecksum\t");
    let sum = out.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    out.push(0u8.wrapping_sub(sum));
    out
}
