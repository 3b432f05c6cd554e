#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod datatype;
pub mod foundation;
pub mod frame;
pub mod status;
pub mod util;
pub mod value;

#[cfg(feature = "std")]
pub mod resolver;

#[cfg(feature = "async")]
pub mod endpoint;
#[cfg(feature = "async")]
pub mod report;
#[cfg(feature = "async")]
pub mod store;
#[cfg(feature = "async")]
pub mod transport;

// Re-export main types without glob imports to avoid conflicts
pub use datatype::{DataType, ReportClass};
pub use frame::{Address, FoundationCommand, FrameControl, FrameHeader, FramingOptions};
pub use status::Status;
pub use value::AttributeValue;

#[cfg(feature = "std")]
pub use resolver::{ClusterTable, IdentifierResolver};

#[cfg(feature = "async")]
pub use endpoint::{Endpoint, EndpointConfig, EndpointError, IncomingFrame, SimpleDescriptor};
#[cfg(feature = "async")]
pub use report::{ReportScheduler, ReportingSchedule};
#[cfg(feature = "async")]
pub use store::{AttributeStore, MemoryStore, StoreError};
#[cfg(feature = "async")]
pub use transport::{FrameSink, OutboundFrame, TransportError};

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

/// Home Automation profile id
pub const PROFILE_HOME_AUTOMATION: u16 = 0x0104;

#[cfg(test)]
mod tests {
    use crate::datatype::classify;
    use crate::foundation::{ReportDirection, REPORTING_DISABLED};
    use crate::status::{AccessKind, ErrorKind};
    use crate::{DataType, ReportClass, Status};

    #[cfg(not(feature = "std"))]
    use alloc::format;

    #[test]
    fn test_no_std_types() {
        // Pure protocol types work with and without std
        assert_eq!(u8::from(DataType::Uint8), 0x20);
        assert_eq!(classify(0x39), ReportClass::Analog);
        assert_eq!(ReportDirection::Received as u8, 1);
        assert_eq!(REPORTING_DISABLED, 0xffff);
    }

    #[test]
    fn test_status_formatting() {
        let status = Status::from_error(AccessKind::Write, ErrorKind::Unwritable);
        assert_eq!(format!("{}", status), "NotAuthorized");
        assert_eq!(format!("{}", Status::from(0x55u8)), "Reserved(0x55)");
    }
}
