//! ZCL Frame Header Types
//!
//! The transport layer decodes frames on the air; this crate only sees the
//! already-decoded header fields and addresses. The types here describe those
//! fields and the framing options echoed back on every outbound frame.
//!
//! # Frame control
//!
//! ```rust
//! use zcl_foundation::frame::{Direction, FrameControl};
//!
//! let fc = FrameControl::from_bits_truncate(0x18);
//! assert!(fc.direction() == Direction::ServerToClient);
//! assert!(fc.contains(FrameControl::DISABLE_DEFAULT_RESPONSE));
//! ```

use bitflags::bitflags;

#[cfg(feature = "std")]
use std::error::Error;

use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::util::format_ieee;

/// Result type for frame decoding
pub type Result<T> = core::result::Result<T, DecodeError>;

/// Errors that can occur while interpreting decoded header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Command id is not a foundation command
    UnknownCommand(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownCommand(id) => {
                write!(f, "Unknown foundation command: {:#04x}", id)
            }
        }
    }
}

#[cfg(feature = "std")]
impl Error for DecodeError {}

bitflags! {
    /// ZCL frame control field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameControl: u8 {
        /// Cluster-specific (functional) command; clear for foundation commands
        const CLUSTER_SPECIFIC = 0x01;
        /// Manufacturer code present
        const MANUFACTURER_SPECIFIC = 0x04;
        /// Sent from the server side of the cluster
        const SERVER_TO_CLIENT = 0x08;
        /// Sender does not want a default response
        const DISABLE_DEFAULT_RESPONSE = 0x10;
    }
}

impl FrameControl {
    pub fn frame_type(&self) -> FrameType {
        if self.contains(FrameControl::CLUSTER_SPECIFIC) {
            FrameType::ClusterSpecific
        } else {
            FrameType::Foundation
        }
    }

    pub fn direction(&self) -> Direction {
        if self.contains(FrameControl::SERVER_TO_CLIENT) {
            Direction::ServerToClient
        } else {
            Direction::ClientToServer
        }
    }

    pub fn manufacturer_specific(&self) -> bool {
        self.contains(FrameControl::MANUFACTURER_SPECIFIC)
    }

    pub fn disable_default_response(&self) -> bool {
        self.contains(FrameControl::DISABLE_DEFAULT_RESPONSE)
    }
}

/// Frame type sub-field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Foundation,
    ClusterSpecific,
}

/// Direction sub-field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::ClientToServer => Direction::ServerToClient,
            Direction::ServerToClient => Direction::ClientToServer,
        }
    }
}

/// Namespace of a functional command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Client-to-server command
    Command,
    /// Server-to-client command response
    Response,
}

impl CommandKind {
    pub fn reverse(self) -> Self {
        match self {
            CommandKind::Command => CommandKind::Response,
            CommandKind::Response => CommandKind::Command,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Command => write!(f, "cmd"),
            CommandKind::Response => write!(f, "cmdRsp"),
        }
    }
}

/// Foundation (profile-wide) command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FoundationCommand {
    Read = 0x00,
    ReadResponse = 0x01,
    Write = 0x02,
    WriteUndivided = 0x03,
    WriteResponse = 0x04,
    WriteNoResponse = 0x05,
    ConfigureReporting = 0x06,
    ConfigureReportingResponse = 0x07,
    ReadReportingConfiguration = 0x08,
    ReadReportingConfigurationResponse = 0x09,
    Report = 0x0a,
    DefaultResponse = 0x0b,
    Discover = 0x0c,
    DiscoverResponse = 0x0d,
    ReadStructured = 0x0e,
    WriteStructured = 0x0f,
    WriteStructuredResponse = 0x10,
    DiscoverCommandsReceived = 0x11,
    DiscoverCommandsReceivedResponse = 0x12,
    DiscoverCommandsGenerated = 0x13,
    DiscoverCommandsGeneratedResponse = 0x14,
    DiscoverExtended = 0x15,
    DiscoverExtendedResponse = 0x16,
}

impl FoundationCommand {
    /// The response command answering this request, if any.
    ///
    /// Write-undivided shares the ordinary write response.
    pub fn response(&self) -> Option<FoundationCommand> {
        use FoundationCommand::*;
        match self {
            Read => Some(ReadResponse),
            Write | WriteUndivided => Some(WriteResponse),
            ConfigureReporting => Some(ConfigureReportingResponse),
            ReadReportingConfiguration => Some(ReadReportingConfigurationResponse),
            Discover => Some(DiscoverResponse),
            WriteStructured => Some(WriteStructuredResponse),
            DiscoverCommandsReceived => Some(DiscoverCommandsReceivedResponse),
            DiscoverCommandsGenerated => Some(DiscoverCommandsGeneratedResponse),
            DiscoverExtended => Some(DiscoverExtendedResponse),
            _ => None,
        }
    }
}

impl TryFrom<u8> for FoundationCommand {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self> {
        use FoundationCommand::*;
        let command = match value {
            0x00 => Read,
            0x01 => ReadResponse,
            0x02 => Write,
            0x03 => WriteUndivided,
            0x04 => WriteResponse,
            0x05 => WriteNoResponse,
            0x06 => ConfigureReporting,
            0x07 => ConfigureReportingResponse,
            0x08 => ReadReportingConfiguration,
            0x09 => ReadReportingConfigurationResponse,
            0x0a => Report,
            0x0b => DefaultResponse,
            0x0c => Discover,
            0x0d => DiscoverResponse,
            0x0e => ReadStructured,
            0x0f => WriteStructured,
            0x10 => WriteStructuredResponse,
            0x11 => DiscoverCommandsReceived,
            0x12 => DiscoverCommandsReceivedResponse,
            0x13 => DiscoverCommandsGenerated,
            0x14 => DiscoverCommandsGeneratedResponse,
            0x15 => DiscoverExtended,
            0x16 => DiscoverExtendedResponse,
            other => return Err(DecodeError::UnknownCommand(other)),
        };
        Ok(command)
    }
}

/// Address of a remote endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// 64-bit IEEE address
    pub ieee: u64,
    /// 16-bit network (short) address
    pub network: u16,
    /// Endpoint number on that node
    pub endpoint: u8,
}

impl Address {
    pub fn new(ieee: u64, network: u16, endpoint: u8) -> Self {
        Self {
            ieee,
            network,
            endpoint,
        }
    }

    pub fn ieee_string(&self) -> String {
        format_ieee(self.ieee)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:#06x}:{}",
            format_ieee(self.ieee),
            self.network,
            self.endpoint
        )
    }
}

/// Decoded ZCL header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_control: FrameControl,
    pub manufacturer_code: Option<u16>,
    pub sequence_number: u8,
    pub command_id: u8,
}

impl FrameHeader {
    pub fn new(frame_control: FrameControl, sequence_number: u8, command_id: u8) -> Self {
        Self {
            frame_control,
            manufacturer_code: None,
            sequence_number,
            command_id,
        }
    }

    pub fn with_manufacturer_code(mut self, code: u16) -> Self {
        self.frame_control |= FrameControl::MANUFACTURER_SPECIFIC;
        self.manufacturer_code = Some(code);
        self
    }

    /// Framing for a reply: same manufacturer fields and default-response
    /// preference, sequence number echoed, direction set explicitly.
    pub fn reply_options(&self, direction: Direction) -> FramingOptions {
        FramingOptions {
            manufacturer_specific: self.frame_control.manufacturer_specific(),
            manufacturer_code: self.manufacturer_code,
            direction,
            disable_default_response: self.frame_control.disable_default_response(),
            sequence_number: Some(self.sequence_number),
        }
    }
}

/// Framing fields attached to an outbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FramingOptions {
    pub manufacturer_specific: bool,
    pub manufacturer_code: Option<u16>,
    pub direction: Direction,
    pub disable_default_response: bool,
    /// `None` lets the transport assign a fresh sequence number
    pub sequence_number: Option<u8>,
}

impl FramingOptions {
    /// Same framing without the echoed sequence number, as used for
    /// unsolicited reports
    pub fn unsolicited(mut self) -> Self {
        self.sequence_number = None;
        self
    }

    pub fn frame_control(&self, cluster_specific: bool) -> FrameControl {
        let mut fc = FrameControl::empty();
        fc.set(FrameControl::CLUSTER_SPECIFIC, cluster_specific);
        fc.set(FrameControl::MANUFACTURER_SPECIFIC, self.manufacturer_specific);
        fc.set(
            FrameControl::SERVER_TO_CLIENT,
            self.direction == Direction::ServerToClient,
        );
        fc.set(
            FrameControl::DISABLE_DEFAULT_RESPONSE,
            self.disable_default_response,
        );
        fc
    }
}
