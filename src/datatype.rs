//! ZCL Data Types
//!
//! Primitive type codes carried in read responses, write requests, reports and
//! reporting configuration records, together with the analog/digital
//! classification that decides whether a reportable change threshold applies.
//!
//! # Example
//!
//! ```rust
//! use zcl_foundation::datatype::{DataType, ReportClass};
//!
//! assert_eq!(DataType::Uint8.report_class(), ReportClass::Analog);
//! assert_eq!(DataType::Enum8.report_class(), ReportClass::Digital);
//! assert!(DataType::Struct.is_composite());
//! ```

use crate::generate_wire_enum;

generate_wire_enum! {
    /// Primitive data types (ZCL section 2.6.2)
    DataType {
        NoData = 0x00,
        Data8 = 0x08,
        Data16 = 0x09,
        Data24 = 0x0a,
        Data32 = 0x0b,
        Data40 = 0x0c,
        Data48 = 0x0d,
        Data56 = 0x0e,
        Data64 = 0x0f,
        Boolean = 0x10,
        Bitmap8 = 0x18,
        Bitmap16 = 0x19,
        Bitmap24 = 0x1a,
        Bitmap32 = 0x1b,
        Bitmap40 = 0x1c,
        Bitmap48 = 0x1d,
        Bitmap56 = 0x1e,
        Bitmap64 = 0x1f,
        Uint8 = 0x20,
        Uint16 = 0x21,
        Uint24 = 0x22,
        Uint32 = 0x23,
        Uint40 = 0x24,
        Uint48 = 0x25,
        Uint56 = 0x26,
        Uint64 = 0x27,
        Int8 = 0x28,
        Int16 = 0x29,
        Int24 = 0x2a,
        Int32 = 0x2b,
        Int40 = 0x2c,
        Int48 = 0x2d,
        Int56 = 0x2e,
        Int64 = 0x2f,
        Enum8 = 0x30,
        Enum16 = 0x31,
        SemiPrecision = 0x38,
        SinglePrecision = 0x39,
        DoublePrecision = 0x3a,
        OctetString = 0x41,
        CharString = 0x42,
        LongOctetString = 0x43,
        LongCharString = 0x44,
        Array = 0x48,
        Struct = 0x4c,
        Set = 0x50,
        Bag = 0x51,
        TimeOfDay = 0xe0,
        Date = 0xe1,
        UtcTime = 0xe2,
        ClusterId = 0xe8,
        AttributeId = 0xe9,
        BacnetOid = 0xea,
        IeeeAddress = 0xf0,
        SecurityKey = 0xf1,
        Unknown = 0xff,
    },
    u8
}

/// How a data type takes part in attribute reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportClass {
    /// Numeric: a reportable change threshold applies
    Analog,
    /// Discrete: reports are driven by intervals only
    Digital,
    /// Outside every reportable range
    NotReportable,
}

/// Classify a raw type code.
///
/// General data, logical, bitmap, enumeration, string, ordered sequence,
/// collection, identifier and miscellaneous codes are digital. Integers,
/// floating point and time codes are analog.
pub fn classify(code: u8) -> ReportClass {
    match code {
        0x08..=0x1f | 0x30..=0x37 | 0x40..=0x57 | 0xe8..=0xfe => ReportClass::Digital,
        0x20..=0x2f | 0x38..=0x3f | 0xe0..=0xe7 => ReportClass::Analog,
        _ => ReportClass::NotReportable,
    }
}

impl DataType {
    pub fn report_class(&self) -> ReportClass {
        classify((*self).into())
    }

    pub fn is_analog(&self) -> bool {
        self.report_class() == ReportClass::Analog
    }

    /// Array, structure and bag types; reporting on these is refused
    pub fn is_composite(&self) -> bool {
        matches!(self, DataType::Array | DataType::Struct | DataType::Bag)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8((*self).into())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(DataType::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_analog_types() {
        for ty in [
            DataType::Uint8,
            DataType::Uint64,
            DataType::Int16,
            DataType::SinglePrecision,
            DataType::DoublePrecision,
            DataType::UtcTime,
            DataType::TimeOfDay,
        ] {
            assert_eq!(ty.report_class(), ReportClass::Analog, "{}", ty);
        }
    }

    #[test]
    fn test_digital_types() {
        for ty in [
            DataType::Data8,
            DataType::Boolean,
            DataType::Bitmap16,
            DataType::Enum8,
            DataType::CharString,
            DataType::Array,
            DataType::Struct,
            DataType::Bag,
            DataType::ClusterId,
            DataType::IeeeAddress,
        ] {
            assert_eq!(ty.report_class(), ReportClass::Digital, "{}", ty);
        }
    }

    #[test]
    fn test_unreportable_types() {
        assert_eq!(DataType::NoData.report_class(), ReportClass::NotReportable);
        assert_eq!(DataType::Unknown.report_class(), ReportClass::NotReportable);
        assert_eq!(classify(0x60), ReportClass::NotReportable);
    }

    #[test]
    fn test_composite() {
        assert!(DataType::Array.is_composite());
        assert!(DataType::Struct.is_composite());
        assert!(DataType::Bag.is_composite());
        assert!(!DataType::Set.is_composite());
        assert!(!DataType::Uint8.is_composite());
    }

    proptest! {
        #[test]
        fn classify_agrees_with_data_type(code in any::<u8>()) {
            prop_assert_eq!(DataType::from(code).report_class(), classify(code));
        }
    }
}
