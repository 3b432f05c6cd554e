//! Outbound Transport Port
//!
//! Framing and addressing on the air belong to the transport layer. This
//! crate hands it fully decided frames through the [`FrameSink`] trait: who
//! the frame goes to, which cluster and command it carries, the payload and
//! the framing fields to put in the ZCL header.
//!
//! An unbounded tokio channel is a ready-made sink, which is what the demo and
//! the tests use:
//!
//! ```rust
//! use tokio::sync::mpsc;
//! use zcl_foundation::transport::{FrameSink, OutboundFrame};
//!
//! let (tx, _rx) = mpsc::unbounded_channel::<OutboundFrame>();
//! fn takes_sink(_sink: &dyn FrameSink) {}
//! takes_sink(&tx);
//! ```

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::foundation::FoundationResponse;
use crate::frame::{Address, FoundationCommand, FramingOptions};

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised while handing a frame to the transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Receiving side of the sink is gone
    #[error("transport closed")]
    Closed,
    #[error("transport failure: {0}")]
    Other(String),
}

/// Command an outbound frame travels under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    Foundation(FoundationCommand),
    /// Cluster-specific command, with the name it resolved from
    Functional { id: u8, name: String },
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundCommand::Foundation(command) => write!(f, "{:?}", command),
            OutboundCommand::Functional { id, name } => write!(f, "{} ({:#04x})", name, id),
        }
    }
}

/// Payload of an outbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Foundation(FoundationResponse),
    /// Still-encoded functional payload produced by a command handler
    Functional(Bytes),
}

/// A frame ready to be encoded and sent
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundFrame {
    pub destination: Address,
    pub cluster_id: u16,
    pub command: OutboundCommand,
    pub payload: Payload,
    pub options: FramingOptions,
}

impl OutboundFrame {
    /// Foundation frame; the command id comes from the payload
    pub fn foundation(
        destination: Address,
        cluster_id: u16,
        response: FoundationResponse,
        options: FramingOptions,
    ) -> Self {
        Self {
            destination,
            cluster_id,
            command: OutboundCommand::Foundation(response.command()),
            payload: Payload::Foundation(response),
            options,
        }
    }

    pub fn functional(
        destination: Address,
        cluster_id: u16,
        id: u8,
        name: &str,
        payload: Bytes,
        options: FramingOptions,
    ) -> Self {
        Self {
            destination,
            cluster_id,
            command: OutboundCommand::Functional {
                id,
                name: name.to_string(),
            },
            payload: Payload::Functional(payload),
            options,
        }
    }

    /// Foundation payload, if this is a foundation frame
    pub fn foundation_payload(&self) -> Option<&FoundationResponse> {
        match &self.payload {
            Payload::Foundation(response) => Some(response),
            Payload::Functional(_) => None,
        }
    }
}

/// Outbound primitive of the transport layer
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send(&self, frame: OutboundFrame) -> Result<()>;
}

#[async_trait]
impl FrameSink for mpsc::UnboundedSender<OutboundFrame> {
    async fn send(&self, frame: OutboundFrame) -> Result<()> {
        mpsc::UnboundedSender::send(self, frame).map_err(|_| TransportError::Closed)
    }
}
