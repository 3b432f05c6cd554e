//! ZCL Status Codes
//!
//! Every per-attribute record in a foundation response carries one of these
//! codes, as does the default response. Store failures never abort a batch:
//! they are folded into a status with [`Status::from_error`].
//!
//! # Example
//!
//! ```rust
//! use zcl_foundation::status::{AccessKind, ErrorKind, Status};
//!
//! assert_eq!(Status::from_error(AccessKind::Read, ErrorKind::NotFound), Status::UnsupportedAttribute);
//! assert_eq!(u8::from(Status::UnsupportedAttribute), 0x86);
//! ```

use crate::generate_wire_enum;

generate_wire_enum! {
    /// Status codes as defined by the ZCL foundation (section 2.5.3)
    Status {
        Success = 0x00,
        Failure = 0x01,
        NotAuthorized = 0x7e,
        ReservedFieldNotZero = 0x7f,
        MalformedCommand = 0x80,
        UnsupportedClusterCommand = 0x81,
        UnsupportedGeneralCommand = 0x82,
        UnsupportedManufacturerClusterCommand = 0x83,
        UnsupportedManufacturerGeneralCommand = 0x84,
        InvalidField = 0x85,
        UnsupportedAttribute = 0x86,
        InvalidValue = 0x87,
        ReadOnly = 0x88,
        InsufficientSpace = 0x89,
        DuplicateExists = 0x8a,
        NotFound = 0x8b,
        UnreportableAttribute = 0x8c,
        InvalidDataType = 0x8d,
        InvalidSelector = 0x8e,
        WriteOnly = 0x8f,
        InconsistentStartupState = 0x90,
        DefinedOutOfBand = 0x91,
        HardwareFailure = 0xc0,
        SoftwareFailure = 0xc1,
        CalibrationError = 0xc2,
    },
    u8
}

/// Which store operation produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Failure categories reported by an attribute store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The attribute (or command) does not exist
    NotFound,
    /// The attribute exists but may not be read
    Unreadable,
    /// The attribute exists but may not be written
    Unwritable,
    /// The attribute's read/write hook failed
    Execution,
    /// Anything else
    Other,
}

impl Status {
    /// Map a store failure to the status reported for that attribute.
    ///
    /// Access denials only count for the operation they apply to: an
    /// `Unwritable` error surfacing from a read is a plain failure.
    pub fn from_error(op: AccessKind, kind: ErrorKind) -> Self {
        match (op, kind) {
            (_, ErrorKind::NotFound) => Status::UnsupportedAttribute,
            (_, ErrorKind::Execution) => Status::NotAuthorized,
            (AccessKind::Read, ErrorKind::Unreadable) => Status::NotAuthorized,
            (AccessKind::Write, ErrorKind::Unwritable) => Status::NotAuthorized,
            _ => Status::Failure,
        }
    }

    /// Map an optional failure; `None` means the operation succeeded.
    pub fn from_outcome(op: AccessKind, error: Option<ErrorKind>) -> Self {
        error.map_or(Status::Success, |kind| Self::from_error(op, kind))
    }

    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8((*self).into())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Status {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u8::deserialize(deserializer).map(Status::from)
    }
}
