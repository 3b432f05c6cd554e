//! Virtual Light Example
//!
//! Runs a dimmable light endpoint entirely in memory. A scripted coordinator
//! reads the light, configures reporting on its current level, toggles it and
//! then nudges the level every two seconds. Every frame the light sends is
//! printed. Run with `RUST_LOG=debug` to see the dispatcher at work.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::sync::mpsc;
use zcl_foundation::{
    datatype::DataType,
    endpoint::{Endpoint, EndpointConfig, FramePayload, IncomingFrame},
    foundation::{FoundationRequest, ReportingConfiguration, WriteRecord},
    frame::{Address, CommandKind, FoundationCommand, FrameControl, FrameHeader},
    resolver::{ClusterDefinition, ClusterTable},
    store::{
        Access, ClusterDirection, CommandOutcome, CommandRequest, MemoryStoreBuilder, StoreError,
    },
    util::parse_ieee,
    value::AttributeValue,
};

const COORDINATOR_IEEE: &str = "0x00124b0012345678";

const ON_OFF: u16 = 0x0006;
const LEVEL: u16 = 0x0008;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Virtual Light Example");
    println!("=====================\n");

    let store = MemoryStoreBuilder::new()
        .cluster(ON_OFF, ClusterDirection::SERVER)
        .cluster(LEVEL, ClusterDirection::SERVER)
        .attribute(ON_OFF, 0x0000, false, Access::READ_WRITE)
        .attribute(LEVEL, 0x0000, 10u8, Access::READ_WRITE)
        .attribute(LEVEL, 0x0001, 0u16, Access::READ)
        .build()?;

    let toggled = store.clone();
    store.add_command(
        ON_OFF,
        CommandKind::Command,
        "toggle",
        Arc::new(move |_: &CommandRequest| -> Result<CommandOutcome, StoreError> {
            let on = toggled.peek(ON_OFF, 0x0000) == Some(AttributeValue::Bool(true));
            toggled.set_local(ON_OFF, 0x0000, AttributeValue::Bool(!on))?;
            Ok(CommandOutcome::Completed)
        }),
    )?;

    let resolver = ClusterTable::new()
        .with_cluster(
            ClusterDefinition::new(ON_OFF)
                .with_attribute(0x0000, DataType::Boolean)
                .with_command(0x00, "off")
                .with_command(0x01, "on")
                .with_command(0x02, "toggle"),
        )
        .with_cluster(
            ClusterDefinition::new(LEVEL)
                .with_attribute(0x0000, DataType::Uint8)
                .with_attribute(0x0001, DataType::Uint16),
        );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let endpoint = Endpoint::builder()
        .with_config(EndpointConfig {
            // Dimmable light
            device_id: 0x0101,
            ..Default::default()
        })
        .with_store(store.clone())
        .with_resolver(resolver)
        .with_sink(tx)
        .build()?;

    let descriptor = endpoint.simple_descriptor();
    println!("Endpoint {}:", descriptor.endpoint);
    println!("  Profile: {:#06x}", descriptor.profile_id);
    println!("  Device: {:#06x}", descriptor.device_id);
    println!("  Input clusters: {:04x?}", descriptor.input_clusters);
    println!("  Output clusters: {:04x?}", descriptor.output_clusters);
    println!();

    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            println!(
                "-> {} cluster {:#06x} {}: {:?}",
                frame.destination, frame.cluster_id, frame.command, frame.payload
            );
        }
    });

    let coordinator_ieee = parse_ieee(COORDINATOR_IEEE).ok_or("invalid coordinator address")?;
    let mut coordinator = Coordinator::new(Address::new(coordinator_ieee, 0x0000, 1));

    endpoint
        .handle(coordinator.foundation(
            LEVEL,
            FoundationCommand::Read,
            FoundationRequest::Read(vec![0x0000, 0x0001, 0x0010]),
        ))
        .await?;
    endpoint
        .handle(coordinator.foundation(
            LEVEL,
            FoundationCommand::ConfigureReporting,
            FoundationRequest::ConfigureReporting(vec![ReportingConfiguration::reported(
                0x0000,
                DataType::Uint8,
                1,
                10,
                Some(5.0),
            )]),
        ))
        .await?;
    endpoint
        .handle(coordinator.functional(ON_OFF, 0x02))
        .await?;

    println!("Light is running, press Ctrl+C to stop.\n");

    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    let mut level: u8 = 10;
    loop {
        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = ticker.tick() => {
                level = level.wrapping_add(7);
                endpoint
                    .handle(coordinator.foundation(
                        LEVEL,
                        FoundationCommand::Write,
                        FoundationRequest::Write(vec![WriteRecord::new(0x0000, DataType::Uint8, level)]),
                    ))
                    .await?;
            }
        }
    }

    endpoint.shutdown();
    println!("\nStopped.");
    Ok(())
}

/// Builds the frames a coordinator would send
struct Coordinator {
    address: Address,
    sequence: u8,
}

impl Coordinator {
    fn new(address: Address) -> Self {
        Self {
            address,
            sequence: 0,
        }
    }

    fn header(&mut self, control: FrameControl, command_id: u8) -> FrameHeader {
        self.sequence = self.sequence.wrapping_add(1);
        FrameHeader::new(control, self.sequence, command_id)
    }

    fn foundation(
        &mut self,
        cluster_id: u16,
        command: FoundationCommand,
        request: FoundationRequest,
    ) -> IncomingFrame {
        IncomingFrame {
            source: self.address,
            cluster_id,
            header: self.header(FrameControl::empty(), command as u8),
            payload: FramePayload::Foundation(request),
        }
    }

    fn functional(&mut self, cluster_id: u16, command_id: u8) -> IncomingFrame {
        IncomingFrame {
            source: self.address,
            cluster_id,
            header: self.header(FrameControl::CLUSTER_SPECIFIC, command_id),
            payload: FramePayload::Functional(Bytes::new()),
        }
    }
}
