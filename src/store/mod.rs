//! Attribute Store
//!
//! The store owns cluster definitions, attribute values and access control.
//! Foundation handlers only consume the narrow [`AttributeStore`] interface;
//! reads and writes are async so a store backed by real hardware can take as
//! long as it needs without holding up other attributes' report timers.
//!
//! [`MemoryStore`] is a thread-safe in-memory implementation suitable for
//! virtual devices and tests.
//!
//! # Example
//!
//! ```rust
//! use zcl_foundation::store::{Access, ClusterDirection, MemoryStoreBuilder};
//! use zcl_foundation::value::AttributeValue;
//!
//! let store = MemoryStoreBuilder::new()
//!     .cluster(0x0006, ClusterDirection::SERVER)
//!     .attribute(0x0006, 0x0000, AttributeValue::Bool(false), Access::READ_WRITE)
//!     .build()
//!     .expect("valid store");
//!
//! assert!(store.peek(0x0006, 0x0000).is_some());
//! ```

use async_trait::async_trait;
use bitflags::bitflags;
use bytes::Bytes;

pub use crate::frame::CommandKind;
use crate::frame::{Address, FrameHeader};
use crate::status::ErrorKind;
use crate::value::AttributeValue;

pub mod memory;

pub use memory::{CommandHandler, MemoryStore, MemoryStoreBuilder, ReadHook, WriteHook};

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors reported by an attribute store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Unknown cluster, attribute or command
    #[error("not found")]
    NotFound,
    /// Attribute may not be read
    #[error("attribute is not readable")]
    Unreadable,
    /// Attribute may not be written
    #[error("attribute is not writable")]
    Unwritable,
    /// A read/write hook or command handler failed
    #[error("execution failed: {0}")]
    Execution(String),
    /// Any other failure
    #[error("store failure: {0}")]
    Other(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound => ErrorKind::NotFound,
            StoreError::Unreadable => ErrorKind::Unreadable,
            StoreError::Unwritable => ErrorKind::Unwritable,
            StoreError::Execution(_) => ErrorKind::Execution,
            StoreError::Other(_) => ErrorKind::Other,
        }
    }
}

bitflags! {
    /// Attribute access control
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Access: u8 {
        const READ = 0x01;
        const WRITE = 0x02;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Access {
    /// Readable but not writable
    pub fn is_read_only(&self) -> bool {
        self.contains(Access::READ) && !self.contains(Access::WRITE)
    }
}

bitflags! {
    /// Which side(s) of a cluster the device implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClusterDirection: u8 {
        /// Server side; listed as an input cluster
        const SERVER = 0x01;
        /// Client side; listed as an output cluster
        const CLIENT = 0x02;
    }
}

/// A functional (cluster-specific) command handed to the store
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub cluster_id: u16,
    pub kind: CommandKind,
    pub name: String,
    /// Still-encoded command payload
    pub payload: Bytes,
    pub source: Address,
    pub header: FrameHeader,
}

/// What a functional command handler did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The handler already sent its own response; nothing more goes out
    Responded,
    /// Done, nothing to return
    Completed,
    /// Payload for the matching response command
    Reply(Bytes),
}

/// Interface the foundation layer consumes from an attribute store
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Read an attribute's current value
    async fn read(&self, cluster_id: u16, attr_id: u16) -> Result<AttributeValue>;

    /// Write an attribute, returning the value actually stored
    async fn write(&self, cluster_id: u16, attr_id: u16, value: AttributeValue)
        -> Result<AttributeValue>;

    /// Whether the attribute exists
    fn contains(&self, cluster_id: u16, attr_id: u16) -> bool;

    /// Access control of an attribute, `None` if it does not exist
    fn access(&self, cluster_id: u16, attr_id: u16) -> Option<Access>;

    /// Attribute ids of a cluster in ascending order
    fn attributes(&self, cluster_id: u16) -> Vec<u16>;

    /// All clusters with the sides implemented
    fn clusters(&self) -> Vec<(u16, ClusterDirection)>;

    /// Execute a functional command
    async fn exec(&self, request: CommandRequest) -> Result<CommandOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(StoreError::NotFound.kind(), ErrorKind::NotFound);
        assert_eq!(StoreError::Unwritable.kind(), ErrorKind::Unwritable);
        assert_eq!(
            StoreError::Execution("boom".to_string()).kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            StoreError::Other("x".to_string()).to_string(),
            "store failure: x"
        );
    }

    #[test]
    fn test_access() {
        assert!(Access::READ.is_read_only());
        assert!(!Access::READ_WRITE.is_read_only());
        assert!(!Access::WRITE.is_read_only());
    }

    #[test]
    fn test_command_kind() {
        assert_eq!(CommandKind::Command.reverse(), CommandKind::Response);
        assert_eq!(CommandKind::Response.to_string(), "cmdRsp");
    }
}
