//! Endpoint and Command Dispatch
//!
//! An [`Endpoint`] is one application endpoint of a device: it owns the
//! attribute store, the identifier resolver, the outbound sink and the report
//! scheduler, and routes every decoded inbound frame to the right handler.
//!
//! # Dispatch rules
//!
//! Foundation frames:
//! - read, write, configure reporting, read reporting configuration and
//!   discover answer with exactly one response frame;
//! - write-undivided is handled as write;
//! - write-no-response runs the write handler and sends nothing;
//! - structured read/write and anything else is dropped.
//!
//! Functional (cluster-specific) frames are executed by the store. Unknown
//! commands answer a default response with `UnsupportedClusterCommand`, failed
//! ones with `Failure`. A handler that already responded suppresses any
//! automatic response; one returning a payload gets the matching `<name>Rsp`
//! command; anything else earns a success default response unless the
//! requester disabled it.
//!
//! # Example
//!
//! ```rust,no_run
//! use tokio::sync::mpsc;
//! use zcl_foundation::endpoint::{Endpoint, EndpointConfig};
//! use zcl_foundation::resolver::ClusterTable;
//! use zcl_foundation::store::MemoryStore;
//!
//! # async fn run() -> Result<(), zcl_foundation::endpoint::EndpointError> {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let endpoint = Endpoint::builder()
//!     .with_config(EndpointConfig::default())
//!     .with_store(MemoryStore::new())
//!     .with_resolver(ClusterTable::new())
//!     .with_sink(tx)
//!     .build()?;
//!
//! // Frames decoded by the transport go to `endpoint.handle(..)`, frames to
//! // send come out of `rx`.
//! # let _ = (&endpoint, rx.recv().await);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bytes::Bytes;
use log::{debug, warn};

use crate::foundation::{
    discover, read, reporting, write, DefaultResponse, FoundationRequest, FoundationResponse,
    HandlerContext,
};
use crate::frame::{Address, CommandKind, Direction, FoundationCommand, FrameHeader, FrameType};
use crate::report::{ReportScheduler, ReportTarget};
use crate::resolver::IdentifierResolver;
use crate::status::Status;
use crate::store::{AttributeStore, ClusterDirection, CommandOutcome, CommandRequest, StoreError};
use crate::transport::{FrameSink, OutboundFrame, TransportError};

/// Result type for endpoint operations
pub type Result<T> = std::result::Result<T, EndpointError>;

/// Errors raised by an endpoint
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The builder is missing a required collaborator
    #[error("endpoint is missing its {0}")]
    Incomplete(&'static str),
    /// The outbound sink refused a frame
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Decoded payload of an inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Foundation(FoundationRequest),
    /// Still-encoded cluster-specific payload
    Functional(Bytes),
}

/// An inbound frame as handed over by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingFrame {
    pub source: Address,
    pub cluster_id: u16,
    pub header: FrameHeader,
    pub payload: FramePayload,
}

/// Static description of the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EndpointConfig {
    pub endpoint: u8,
    pub profile_id: u16,
    pub device_id: u16,
    pub device_version: u8,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            endpoint: 1,
            profile_id: crate::PROFILE_HOME_AUTOMATION,
            device_id: 0x0000,
            device_version: 0,
        }
    }
}

/// Simple descriptor advertised for the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleDescriptor {
    pub endpoint: u8,
    pub profile_id: u16,
    pub device_id: u16,
    pub device_version: u8,
    /// Server-side clusters
    pub input_clusters: Vec<u16>,
    /// Client-side clusters
    pub output_clusters: Vec<u16>,
}

/// Builder for an [`Endpoint`]
#[derive(Default)]
pub struct EndpointBuilder {
    config: EndpointConfig,
    store: Option<Arc<dyn AttributeStore>>,
    resolver: Option<Arc<dyn IdentifierResolver>>,
    sink: Option<Arc<dyn FrameSink>>,
}

impl EndpointBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EndpointConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store(mut self, store: impl AttributeStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn with_resolver(mut self, resolver: impl IdentifierResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_sink(mut self, sink: impl FrameSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Fails with [`EndpointError::Incomplete`] naming the first missing part
    pub fn build(self) -> Result<Endpoint> {
        let store = self.store.ok_or(EndpointError::Incomplete("attribute store"))?;
        let resolver = self
            .resolver
            .ok_or(EndpointError::Incomplete("identifier resolver"))?;
        let sink = self.sink.ok_or(EndpointError::Incomplete("frame sink"))?;
        let scheduler = ReportScheduler::new(Arc::clone(&store), Arc::clone(&sink));

        Ok(Endpoint {
            config: self.config,
            store,
            resolver,
            sink,
            scheduler,
        })
    }
}

/// One application endpoint processing foundation and functional commands
pub struct Endpoint {
    config: EndpointConfig,
    store: Arc<dyn AttributeStore>,
    resolver: Arc<dyn IdentifierResolver>,
    sink: Arc<dyn FrameSink>,
    scheduler: ReportScheduler,
}

impl Endpoint {
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder::new()
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &ReportScheduler {
        &self.scheduler
    }

    /// Descriptor derived from the sides of each cluster the store implements
    pub fn simple_descriptor(&self) -> SimpleDescriptor {
        let mut input_clusters = Vec::new();
        let mut output_clusters = Vec::new();
        for (cluster_id, direction) in self.store.clusters() {
            if direction.contains(ClusterDirection::SERVER) {
                input_clusters.push(cluster_id);
            }
            if direction.contains(ClusterDirection::CLIENT) {
                output_clusters.push(cluster_id);
            }
        }

        SimpleDescriptor {
            endpoint: self.config.endpoint,
            profile_id: self.config.profile_id,
            device_id: self.config.device_id,
            device_version: self.config.device_version,
            input_clusters,
            output_clusters,
        }
    }

    /// Route a decoded frame by its payload
    pub async fn handle(&self, frame: IncomingFrame) -> Result<()> {
        let IncomingFrame {
            source,
            cluster_id,
            header,
            payload,
        } = frame;

        match (header.frame_control.frame_type(), payload) {
            (FrameType::Foundation, FramePayload::Foundation(request)) => {
                self.handle_foundation(source, cluster_id, &header, request)
                    .await
            }
            (FrameType::ClusterSpecific, FramePayload::Functional(payload)) => {
                self.handle_functional(source, cluster_id, &header, payload)
                    .await
            }
            (frame_type, _) => {
                warn!(
                    "Dropping {:?} frame from {} with mismatched payload",
                    frame_type, source
                );
                Ok(())
            }
        }
    }

    /// Execute a foundation command and send its response
    pub async fn handle_foundation(
        &self,
        source: Address,
        cluster_id: u16,
        header: &FrameHeader,
        request: FoundationRequest,
    ) -> Result<()> {
        let command = match FoundationCommand::try_from(header.command_id) {
            Ok(command) => command,
            Err(e) => {
                warn!("Dropping frame from {}: {}", source, e);
                return Ok(());
            }
        };
        debug!(
            "{:?} for cluster {:#06x} from {} (seq {})",
            command, cluster_id, source, header.sequence_number
        );

        let ctx = self.context(cluster_id, source, header);
        let response = match (command, request) {
            (FoundationCommand::Read, FoundationRequest::Read(attr_ids)) => {
                FoundationResponse::Read(read::read(&ctx, &attr_ids).await)
            }
            (
                FoundationCommand::Write | FoundationCommand::WriteUndivided,
                FoundationRequest::Write(records),
            ) => FoundationResponse::Write(write::write(&ctx, &records).await),
            (FoundationCommand::WriteNoResponse, FoundationRequest::Write(records)) => {
                write::write(&ctx, &records).await;
                return Ok(());
            }
            (FoundationCommand::ConfigureReporting, FoundationRequest::ConfigureReporting(records)) => {
                FoundationResponse::ConfigureReporting(
                    reporting::configure_reporting(&ctx, &records).await,
                )
            }
            (
                FoundationCommand::ReadReportingConfiguration,
                FoundationRequest::ReadReportingConfiguration(queries),
            ) => FoundationResponse::ReadReportingConfiguration(
                reporting::read_reporting_configuration(&ctx, &queries).await,
            ),
            (FoundationCommand::Discover, FoundationRequest::Discover(request)) => {
                FoundationResponse::Discover(discover::discover(&ctx, &request))
            }
            (FoundationCommand::ReadStructured | FoundationCommand::WriteStructured, _) => {
                debug!("Structured attribute access is not supported, dropping");
                return Ok(());
            }
            (command, _) => {
                warn!("Ignoring {:?} from {}", command, source);
                return Ok(());
            }
        };

        let options = header.reply_options(Direction::ServerToClient);
        self.sink
            .send(OutboundFrame::foundation(source, cluster_id, response, options))
            .await?;
        Ok(())
    }

    /// Execute a cluster-specific command through the store
    pub async fn handle_functional(
        &self,
        source: Address,
        cluster_id: u16,
        header: &FrameHeader,
        payload: Bytes,
    ) -> Result<()> {
        let direction = header.frame_control.direction();
        let kind = match direction {
            Direction::ClientToServer => CommandKind::Command,
            Direction::ServerToClient => CommandKind::Response,
        };

        let Some(name) = self
            .resolver
            .command_name(cluster_id, header.command_id, kind)
            .map(str::to_string)
        else {
            warn!(
                "Unknown {} {:#04x} for cluster {:#06x} from {}",
                kind, header.command_id, cluster_id, source
            );
            return self
                .default_response(source, cluster_id, header, Status::UnsupportedClusterCommand)
                .await;
        };
        debug!(
            "Functional {} '{}' for cluster {:#06x} from {}",
            kind, name, cluster_id, source
        );

        let reply_name = format!("{}Rsp", name);
        let reply_id = self
            .resolver
            .command_id(cluster_id, &reply_name, kind.reverse());

        let request = CommandRequest {
            cluster_id,
            kind,
            name,
            payload,
            source,
            header: *header,
        };
        let outcome = match self.store.exec(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Command {:#04x} failed: {}", header.command_id, e);
                let status = match e {
                    StoreError::NotFound => Status::UnsupportedClusterCommand,
                    _ => Status::Failure,
                };
                return self.default_response(source, cluster_id, header, status).await;
            }
        };

        match (outcome, reply_id) {
            (CommandOutcome::Responded, _) => Ok(()),
            (CommandOutcome::Reply(payload), Some(reply_id)) => {
                let options = header.reply_options(direction.reverse());
                let frame = OutboundFrame::functional(
                    source,
                    cluster_id,
                    reply_id,
                    &reply_name,
                    payload,
                    options,
                );
                self.sink.send(frame).await?;
                Ok(())
            }
            (outcome, _) => {
                if let CommandOutcome::Reply(_) = outcome {
                    debug!("No '{}' command, dropping reply payload", reply_name);
                }
                if header.frame_control.disable_default_response() {
                    return Ok(());
                }
                self.default_response(source, cluster_id, header, Status::Success)
                    .await
            }
        }
    }

    /// Stop all report timers
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn context(&self, cluster_id: u16, source: Address, header: &FrameHeader) -> HandlerContext<'_> {
        HandlerContext {
            cluster_id,
            store: self.store.as_ref(),
            resolver: self.resolver.as_ref(),
            scheduler: &self.scheduler,
            hook: &self.scheduler,
            requester: ReportTarget::for_request(source, header),
        }
    }

    async fn default_response(
        &self,
        source: Address,
        cluster_id: u16,
        header: &FrameHeader,
        status: Status,
    ) -> Result<()> {
        let response = FoundationResponse::Default(DefaultResponse {
            command_id: header.command_id,
            status,
        });
        let options = header.reply_options(header.frame_control.direction().reverse());
        self.sink
            .send(OutboundFrame::foundation(source, cluster_id, response, options))
            .await?;
        Ok(())
    }
}
