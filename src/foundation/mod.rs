//! ZCL Foundation Commands
//!
//! This module defines the decoded payloads of the profile-wide ("foundation")
//! commands and, with the `async` feature, the handlers that execute them
//! against an [`AttributeStore`](crate::store::AttributeStore).
//!
//! # Commands
//!
//! - **Read Attributes**: read a list of attributes, one status record each
//! - **Write Attributes** (plus undivided and no-response variants)
//! - **Configure Reporting**: negotiate periodic and change-triggered reports
//! - **Read Reporting Configuration**: echo a negotiated schedule back
//! - **Discover Attributes**: page through the attribute ids of a cluster
//!
//! Every handler answers with one record per request entry, in request order.
//! Store failures are folded into per-record status codes and never abort the
//! rest of the batch.
//!
//! # Example
//!
//! ```rust
//! use zcl_foundation::datatype::DataType;
//! use zcl_foundation::foundation::{ReportDirection, ReportingConfiguration, ReportingParameters};
//!
//! let record = ReportingConfiguration::reported(0x0000, DataType::Uint8, 1, 3, Some(15.0));
//! assert_eq!(record.direction(), ReportDirection::Reported);
//! assert!(matches!(record.parameters, ReportingParameters::Reported { max_interval: 3, .. }));
//! ```

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::datatype::DataType;
use crate::frame::FoundationCommand;
use crate::status::Status;
use crate::value::AttributeValue;

#[cfg(feature = "async")]
pub mod discover;
#[cfg(feature = "async")]
pub mod read;
#[cfg(feature = "async")]
pub mod reporting;
#[cfg(feature = "async")]
pub mod write;

#[cfg(all(test, feature = "async"))]
mod testing;

#[cfg(feature = "async")]
pub use handler::HandlerContext;

/// Maximum interval value that switches periodic reporting off
pub const REPORTING_DISABLED: u16 = 0xffff;

/// Timeout value returned when none has been configured
pub const TIMEOUT_UNSET: u16 = 0xffff;

/// Direction field of reporting configuration records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ReportDirection {
    /// This device sends reports for the attribute
    Reported = 0x00,
    /// This device expects to receive reports; only a timeout is kept
    Received = 0x01,
}

impl TryFrom<u8> for ReportDirection {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0x00 => Ok(ReportDirection::Reported),
            0x01 => Ok(ReportDirection::Received),
            other => Err(other),
        }
    }
}

/// Read Attributes response record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadStatusRecord {
    pub attr_id: u16,
    pub status: Status,
    /// Present only on success
    pub data_type: Option<DataType>,
    /// Present only on success
    pub value: Option<AttributeValue>,
}

impl ReadStatusRecord {
    pub fn success(attr_id: u16, data_type: DataType, value: AttributeValue) -> Self {
        Self {
            attr_id,
            status: Status::Success,
            data_type: Some(data_type),
            value: Some(value),
        }
    }

    pub fn failed(attr_id: u16, status: Status) -> Self {
        Self {
            attr_id,
            status,
            data_type: None,
            value: None,
        }
    }
}

/// Write Attributes request record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriteRecord {
    pub attr_id: u16,
    pub data_type: DataType,
    pub value: AttributeValue,
}

impl WriteRecord {
    pub fn new(attr_id: u16, data_type: DataType, value: impl Into<AttributeValue>) -> Self {
        Self {
            attr_id,
            data_type,
            value: value.into(),
        }
    }
}

/// Write Attributes response record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriteStatusRecord {
    pub attr_id: u16,
    pub status: Status,
}

/// Schedule or timeout carried by a reporting configuration record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReportingParameters {
    Reported {
        data_type: DataType,
        /// Seconds
        min_interval: u16,
        /// Seconds, or [`REPORTING_DISABLED`]
        max_interval: u16,
        /// Only meaningful for analog types
        reportable_change: Option<f64>,
    },
    Received {
        /// Seconds
        timeout: u16,
    },
}

impl ReportingParameters {
    pub fn direction(&self) -> ReportDirection {
        match self {
            ReportingParameters::Reported { .. } => ReportDirection::Reported,
            ReportingParameters::Received { .. } => ReportDirection::Received,
        }
    }
}

/// Configure Reporting request record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportingConfiguration {
    pub attr_id: u16,
    pub parameters: ReportingParameters,
}

impl ReportingConfiguration {
    pub fn reported(
        attr_id: u16,
        data_type: DataType,
        min_interval: u16,
        max_interval: u16,
        reportable_change: Option<f64>,
    ) -> Self {
        Self {
            attr_id,
            parameters: ReportingParameters::Reported {
                data_type,
                min_interval,
                max_interval,
                reportable_change,
            },
        }
    }

    pub fn received(attr_id: u16, timeout: u16) -> Self {
        Self {
            attr_id,
            parameters: ReportingParameters::Received { timeout },
        }
    }

    pub fn direction(&self) -> ReportDirection {
        self.parameters.direction()
    }
}

/// Configure Reporting response record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigureReportingStatusRecord {
    pub attr_id: u16,
    pub direction: ReportDirection,
    pub status: Status,
}

/// Read Reporting Configuration request record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportingConfigurationQuery {
    pub attr_id: u16,
    pub direction: ReportDirection,
}

impl ReportingConfigurationQuery {
    pub fn new(attr_id: u16, direction: ReportDirection) -> Self {
        Self { attr_id, direction }
    }
}

/// Read Reporting Configuration response record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportingConfigurationRecord {
    pub attr_id: u16,
    pub direction: ReportDirection,
    pub status: Status,
    /// Present only on success
    pub parameters: Option<ReportingParameters>,
}

/// Discover Attributes request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoverRequest {
    pub start_attr_id: u16,
    pub max_attr_ids: u8,
}

/// Attribute id and type pair returned by Discover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeInfo {
    pub attr_id: u16,
    pub data_type: DataType,
}

/// Discover Attributes response
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiscoverResponse {
    /// False when the matches did not fit in the requested page
    pub complete: bool,
    pub attributes: Vec<AttributeInfo>,
}

impl DiscoverResponse {
    pub fn incomplete() -> Self {
        Self {
            complete: false,
            attributes: Vec::new(),
        }
    }
}

/// One attribute carried by a Report Attributes frame
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeReport {
    pub attr_id: u16,
    pub data_type: DataType,
    pub value: AttributeValue,
}

/// Default response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefaultResponse {
    /// Command being answered
    pub command_id: u8,
    pub status: Status,
}

/// Decoded foundation request payloads
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FoundationRequest {
    Read(Vec<u16>),
    Write(Vec<WriteRecord>),
    ConfigureReporting(Vec<ReportingConfiguration>),
    ReadReportingConfiguration(Vec<ReportingConfigurationQuery>),
    Discover(DiscoverRequest),
    /// Payloads this crate does not interpret (structured access, reports,
    /// responses)
    Other,
}

/// Foundation payloads sent by this device
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FoundationResponse {
    Read(Vec<ReadStatusRecord>),
    Write(Vec<WriteStatusRecord>),
    ConfigureReporting(Vec<ConfigureReportingStatusRecord>),
    ReadReportingConfiguration(Vec<ReportingConfigurationRecord>),
    Discover(DiscoverResponse),
    Report(Vec<AttributeReport>),
    Default(DefaultResponse),
}

impl FoundationResponse {
    /// Command id this payload travels under
    pub fn command(&self) -> FoundationCommand {
        match self {
            FoundationResponse::Read(_) => FoundationCommand::ReadResponse,
            FoundationResponse::Write(_) => FoundationCommand::WriteResponse,
            FoundationResponse::ConfigureReporting(_) => {
                FoundationCommand::ConfigureReportingResponse
            }
            FoundationResponse::ReadReportingConfiguration(_) => {
                FoundationCommand::ReadReportingConfigurationResponse
            }
            FoundationResponse::Discover(_) => FoundationCommand::DiscoverResponse,
            FoundationResponse::Report(_) => FoundationCommand::Report,
            FoundationResponse::Default(_) => FoundationCommand::DefaultResponse,
        }
    }
}

#[cfg(feature = "async")]
mod handler {
    use crate::report::{ReportHook, ReportScheduler, ReportTarget};
    use crate::resolver::IdentifierResolver;
    use crate::store::AttributeStore;

    /// Everything a foundation handler needs for one request.
    ///
    /// Handlers keep nothing between calls; reporting state lives in the
    /// scheduler and attribute state in the store.
    pub struct HandlerContext<'a> {
        pub cluster_id: u16,
        pub store: &'a dyn AttributeStore,
        pub resolver: &'a dyn IdentifierResolver,
        /// Owner of all reporting configuration
        pub scheduler: &'a ReportScheduler,
        /// Invoked after every successful read or write
        pub hook: &'a dyn ReportHook,
        /// Where opportunistic reports for this request go
        pub requester: ReportTarget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_direction_codes() {
        assert_eq!(ReportDirection::try_from(0), Ok(ReportDirection::Reported));
        assert_eq!(ReportDirection::try_from(1), Ok(ReportDirection::Received));
        assert_eq!(ReportDirection::try_from(2), Err(2));
    }

    #[test]
    fn test_response_commands() {
        let response = FoundationResponse::Write(vec![]);
        assert_eq!(response.command(), FoundationCommand::WriteResponse);

        let report = FoundationResponse::Report(vec![AttributeReport {
            attr_id: 0,
            data_type: DataType::Uint8,
            value: AttributeValue::from(1u8),
        }]);
        assert_eq!(report.command(), FoundationCommand::Report);
    }

    #[test]
    fn test_read_records() {
        let ok = ReadStatusRecord::success(1, DataType::Uint8, AttributeValue::from(20u8));
        assert!(ok.status.is_success());
        assert_eq!(ok.data_type, Some(DataType::Uint8));

        let failed = ReadStatusRecord::failed(0x10, Status::UnsupportedAttribute);
        assert_eq!(failed.data_type, None);
        assert_eq!(failed.value, None);
    }

    #[test]
    fn test_configuration_records() {
        let record = ReportingConfiguration::received(1, 999);
        assert_eq!(record.direction(), ReportDirection::Received);
        assert_eq!(record.parameters, ReportingParameters::Received { timeout: 999 });
    }
}
