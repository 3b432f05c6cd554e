//! Write Attributes handler
//!
//! Serves write, write-undivided and write-no-response alike; the dispatcher
//! decides whether the records go back on the air.

use super::{HandlerContext, WriteRecord, WriteStatusRecord};
use crate::report::AttributeKey;
use crate::status::{AccessKind, Status};

/// Write every record, one status per record in request order
pub async fn write(ctx: &HandlerContext<'_>, records: &[WriteRecord]) -> Vec<WriteStatusRecord> {
    let mut statuses = Vec::with_capacity(records.len());
    for record in records {
        statuses.push(WriteStatusRecord {
            attr_id: record.attr_id,
            status: write_one(ctx, record).await,
        });
    }
    statuses
}

async fn write_one(ctx: &HandlerContext<'_>, record: &WriteRecord) -> Status {
    let cluster_id = ctx.cluster_id;
    let attr_id = record.attr_id;

    let declared = match ctx.resolver.attribute_type(cluster_id, attr_id) {
        Some(data_type) if ctx.store.contains(cluster_id, attr_id) => data_type,
        _ => return Status::UnsupportedAttribute,
    };

    // Read-only attributes accept the write without effect
    if ctx
        .store
        .access(cluster_id, attr_id)
        .is_some_and(|access| access.is_read_only())
    {
        return Status::Success;
    }

    if record.data_type != declared {
        return Status::InvalidValue;
    }

    match ctx.store.write(cluster_id, attr_id, record.value.clone()).await {
        Ok(stored) => {
            let key = AttributeKey::new(cluster_id, attr_id);
            ctx.hook.on_value(key, declared, &stored, &ctx.requester).await;
            Status::Success
        }
        Err(e) => Status::from_error(AccessKind::Write, e.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataType;
    use crate::foundation::testing::{Fixture, CLUSTER};
    use crate::foundation::{AttributeReport, FoundationResponse};
    use crate::report::ReportingSchedule;
    use crate::store::AttributeStore;
    use crate::value::AttributeValue;

    #[tokio::test]
    async fn test_write_and_order() {
        let fixture = Fixture::new();
        let records = vec![
            WriteRecord::new(0x0002, DataType::Boolean, true),
            WriteRecord::new(0x0000, DataType::Uint8, 99u8),
        ];
        let statuses = write(&fixture.context(), &records).await;

        assert_eq!(
            statuses,
            vec![
                WriteStatusRecord {
                    attr_id: 0x0002,
                    status: Status::Success
                },
                WriteStatusRecord {
                    attr_id: 0x0000,
                    status: Status::Success
                },
            ]
        );
        assert_eq!(fixture.store.peek(CLUSTER, 0x0002), Some(AttributeValue::Bool(true)));
        assert_eq!(fixture.store.peek(CLUSTER, 0x0000), Some(AttributeValue::from(99u8)));
    }

    #[tokio::test]
    async fn test_read_only_write_is_ignored() {
        let fixture = Fixture::new();
        let statuses = write(
            &fixture.context(),
            &[WriteRecord::new(0x0001, DataType::Uint16, 500u16)],
        )
        .await;

        assert_eq!(statuses[0].status, Status::Success);
        assert_eq!(fixture.store.peek(CLUSTER, 0x0001), Some(AttributeValue::from(20u16)));
    }

    #[tokio::test]
    async fn test_type_mismatch_never_writes() {
        let fixture = Fixture::new();
        let statuses = write(
            &fixture.context(),
            &[WriteRecord::new(0x0000, DataType::Uint16, 77u16)],
        )
        .await;

        assert_eq!(statuses[0].status, Status::InvalidValue);
        assert_eq!(fixture.store.peek(CLUSTER, 0x0000), Some(AttributeValue::from(10u8)));
    }

    #[tokio::test]
    async fn test_unknown_attribute() {
        let fixture = Fixture::new();
        let statuses = write(
            &fixture.context(),
            &[WriteRecord::new(0x0010, DataType::Uint8, 1u8)],
        )
        .await;

        assert_eq!(u8::from(statuses[0].status), 134);
        assert!(!fixture.store.contains(CLUSTER, 0x0010));
    }

    #[tokio::test]
    async fn test_store_failures() {
        let fixture = Fixture::new();
        let statuses = write(
            &fixture.context(),
            &[
                WriteRecord::new(0x0004, DataType::Int16, 5i16),
                WriteRecord::new(0x0005, DataType::Uint8, 5u8),
            ],
        )
        .await;

        assert_eq!(statuses[0].status, Status::NotAuthorized);
        assert_eq!(statuses[1].status, Status::Success);
        assert_eq!(fixture.store.peek(CLUSTER, 0x0004), Some(AttributeValue::from(0i16)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_report_uses_written_value() {
        let mut fixture = Fixture::new();
        let ctx = fixture.context();
        let key = AttributeKey::new(CLUSTER, 0x0000);
        let schedule = ReportingSchedule {
            data_type: DataType::Uint8,
            min_interval: 0,
            max_interval: 300,
            change_threshold: Some(15.0),
        };
        ctx.scheduler.configure(key, schedule, ctx.requester).await.unwrap();

        // Seeds the last reported value
        write(&ctx, &[WriteRecord::new(0x0000, DataType::Uint8, 10u8)]).await;
        write(&ctx, &[WriteRecord::new(0x0000, DataType::Uint8, 20u8)]).await;
        write(&ctx, &[WriteRecord::new(0x0000, DataType::Uint8, 50u8)]).await;
        drop(ctx);

        let frame = fixture.frames.try_recv().unwrap();
        assert_eq!(
            frame.foundation_payload(),
            Some(&FoundationResponse::Report(vec![AttributeReport {
                attr_id: 0x0000,
                data_type: DataType::Uint8,
                value: AttributeValue::from(50u8),
            }]))
        );
        assert!(fixture.frames.try_recv().is_err());
    }
}
