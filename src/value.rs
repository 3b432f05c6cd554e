//! Attribute Values
//!
//! Decoded attribute payloads as handed over by the transport layer and stored
//! by the attribute store.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

/// A decoded attribute value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    String(String),
    Octets(Vec<u8>),
}

impl AttributeValue {
    /// Numeric view used for change-threshold arithmetic
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Unsigned(v) => Some(*v as f64),
            AttributeValue::Signed(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Whether moving from `previous` to `self` crosses `threshold`.
    ///
    /// Both values must be numeric; a non-finite threshold never triggers.
    pub fn exceeds_change(&self, previous: &AttributeValue, threshold: f64) -> bool {
        if !threshold.is_finite() {
            return false;
        }
        match (self.as_f64(), previous.as_f64()) {
            (Some(new), Some(old)) => (new - old).abs() > threshold,
            _ => false,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<u8> for AttributeValue {
    fn from(value: u8) -> Self {
        AttributeValue::Unsigned(value.into())
    }
}

impl From<u16> for AttributeValue {
    fn from(value: u16) -> Self {
        AttributeValue::Unsigned(value.into())
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Unsigned(value.into())
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Unsigned(value)
    }
}

impl From<i16> for AttributeValue {
    fn from(value: i16) -> Self {
        AttributeValue::Signed(value.into())
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Signed(value.into())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Signed(value)
    }
}

impl From<f32> for AttributeValue {
    fn from(value: f32) -> Self {
        AttributeValue::Float(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.into())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_view() {
        assert_eq!(AttributeValue::from(10u8).as_f64(), Some(10.0));
        assert_eq!(AttributeValue::from(-3i16).as_f64(), Some(-3.0));
        assert_eq!(AttributeValue::from(1.5f64).as_f64(), Some(1.5));
        assert_eq!(AttributeValue::from("x").as_f64(), None);
        assert!(!AttributeValue::Null.is_numeric());
    }

    #[test]
    fn test_change_threshold() {
        let old = AttributeValue::from(10u8);
        assert!(AttributeValue::from(50u8).exceeds_change(&old, 15.0));
        assert!(!AttributeValue::from(25u8).exceeds_change(&old, 15.0));
        assert!(!AttributeValue::from(24u8).exceeds_change(&old, 15.0));
        assert!(AttributeValue::from(-10i32).exceeds_change(&old, 15.0));
    }

    #[test]
    fn test_change_requires_numbers() {
        let old = AttributeValue::Null;
        assert!(!AttributeValue::from(50u8).exceeds_change(&old, 1.0));
        assert!(!AttributeValue::from("a").exceeds_change(&AttributeValue::from(1u8), 0.0));
        assert!(!AttributeValue::from(50u8).exceeds_change(&AttributeValue::from(1u8), f64::NAN));
    }
}
