//! Shared fixture for the handler tests

use std::sync::Arc;

use tokio::sync::mpsc;

use super::HandlerContext;
use crate::datatype::DataType;
use crate::frame::{Address, FrameControl, FrameHeader};
use crate::report::{ReportScheduler, ReportTarget};
use crate::resolver::{ClusterDefinition, ClusterTable};
use crate::store::{Access, ClusterDirection, MemoryStore, MemoryStoreBuilder, StoreError};
use crate::transport::OutboundFrame;
use crate::value::AttributeValue;

pub(crate) const CLUSTER: u16 = 0x0008;

/// Level-control-like cluster:
///
/// | id     | type    | value | access     | notes              |
/// |--------|---------|-------|------------|--------------------|
/// | 0x0000 | uint8   | 10    | read-write |                    |
/// | 0x0001 | uint16  | 20    | read       |                    |
/// | 0x0002 | boolean | false | read-write |                    |
/// | 0x0003 | array   | []    | read-write |                    |
/// | 0x0004 | int16   | 0     | read-write | hooks always fail  |
/// | 0x0005 | uint8   | 0     | write      |                    |
pub(crate) struct Fixture {
    pub store: MemoryStore,
    pub resolver: ClusterTable,
    pub scheduler: ReportScheduler,
    pub frames: mpsc::UnboundedReceiver<OutboundFrame>,
    pub requester: ReportTarget,
}

impl Fixture {
    pub fn new() -> Self {
        let store = MemoryStoreBuilder::new()
            .cluster(CLUSTER, ClusterDirection::SERVER)
            .attribute(CLUSTER, 0x0000, 10u8, Access::READ_WRITE)
            .attribute(CLUSTER, 0x0001, 20u16, Access::READ)
            .attribute(CLUSTER, 0x0002, false, Access::READ_WRITE)
            .attribute(CLUSTER, 0x0003, AttributeValue::Octets(vec![]), Access::READ_WRITE)
            .attribute(CLUSTER, 0x0004, 0i16, Access::READ_WRITE)
            .read_hook(CLUSTER, 0x0004, || {
                Err(StoreError::Execution("sensor offline".to_string()))
            })
            .write_hook(CLUSTER, 0x0004, |_| {
                Err(StoreError::Execution("sensor offline".to_string()))
            })
            .attribute(CLUSTER, 0x0005, 0u8, Access::WRITE)
            .build()
            .unwrap();

        let resolver = ClusterTable::new().with_cluster(
            ClusterDefinition::new(CLUSTER)
                .with_attribute(0x0000, DataType::Uint8)
                .with_attribute(0x0001, DataType::Uint16)
                .with_attribute(0x0002, DataType::Boolean)
                .with_attribute(0x0003, DataType::Array)
                .with_attribute(0x0004, DataType::Int16)
                .with_attribute(0x0005, DataType::Uint8),
        );

        let (tx, frames) = mpsc::unbounded_channel();
        let scheduler = ReportScheduler::new(Arc::new(store.clone()), Arc::new(tx));
        let header = FrameHeader::new(FrameControl::empty(), 42, 0x00);
        let requester = ReportTarget::for_request(Address::new(0x00124b0001020304, 0x1a2b, 1), &header);

        Self {
            store,
            resolver,
            scheduler,
            frames,
            requester,
        }
    }

    pub fn context(&self) -> HandlerContext<'_> {
        HandlerContext {
            cluster_id: CLUSTER,
            store: &self.store,
            resolver: &self.resolver,
            scheduler: &self.scheduler,
            hook: &self.scheduler,
            requester: self.requester,
        }
    }
}
