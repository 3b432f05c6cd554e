//! Utility Functions Module
//!
//! Small helpers shared across the crate: the wire enumeration macro and
//! formatting for IEEE (EUI-64) addresses.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

mod enum_macros;

/// Format a 64-bit IEEE address the way coordinators print it (`0x` followed
/// by sixteen lowercase hex digits).
pub fn format_ieee(address: u64) -> String {
    let mut out = String::from("0x");
    out.push_str(&hex::encode(address.to_be_bytes()));
    out
}

/// Parse an IEEE address in `0x…` or bare hex form.
pub fn parse_ieee(text: &str) -> Option<u64> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() || digits.len() > 16 {
        return None;
    }
    let padded = format!("{:0>16}", digits);
    let mut bytes = [0u8; 8];
    hex::decode_to_slice(padded, &mut bytes).ok()?;
    Some(u64::from_be_bytes(bytes))
}
