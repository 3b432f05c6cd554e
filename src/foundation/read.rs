//! Read Attributes handler

use log::warn;

use super::{HandlerContext, ReadStatusRecord};
use crate::report::AttributeKey;
use crate::status::{AccessKind, Status};

/// Read every requested attribute, one record per id in request order.
///
/// A successful read of an analog attribute with a reporting configuration is
/// passed to the report hook, which may emit a report to the requester.
pub async fn read(ctx: &HandlerContext<'_>, attr_ids: &[u16]) -> Vec<ReadStatusRecord> {
    let mut records = Vec::with_capacity(attr_ids.len());
    for &attr_id in attr_ids {
        records.push(read_one(ctx, attr_id).await);
    }
    records
}

async fn read_one(ctx: &HandlerContext<'_>, attr_id: u16) -> ReadStatusRecord {
    let value = match ctx.store.read(ctx.cluster_id, attr_id).await {
        Ok(value) => value,
        Err(e) => {
            return ReadStatusRecord::failed(attr_id, Status::from_error(AccessKind::Read, e.kind()))
        }
    };

    let Some(data_type) = ctx.resolver.attribute_type(ctx.cluster_id, attr_id) else {
        warn!(
            "Attribute {:#06x} of cluster {:#06x} has no declared type",
            attr_id, ctx.cluster_id
        );
        return ReadStatusRecord::failed(attr_id, Status::UnsupportedAttribute);
    };

    let key = AttributeKey::new(ctx.cluster_id, attr_id);
    ctx.hook.on_value(key, data_type, &value, &ctx.requester).await;

    ReadStatusRecord::success(attr_id, data_type, value)
}
