//! Discover Attributes handler

use super::{AttributeInfo, DiscoverRequest, DiscoverResponse, HandlerContext};
use crate::datatype::DataType;

/// List the attributes with `id >= start_attr_id`.
///
/// The whole page is refused (`complete == false`, no attributes) as soon as
/// another attribute is visited after `max_attr_ids` matches were collected;
/// a partial page is never returned.
pub fn discover(ctx: &HandlerContext<'_>, request: &DiscoverRequest) -> DiscoverResponse {
    let max = usize::from(request.max_attr_ids);
    let mut attributes = Vec::new();

    for attr_id in ctx.store.attributes(ctx.cluster_id) {
        if attributes.len() >= max {
            return DiscoverResponse::incomplete();
        }
        if attr_id >= request.start_attr_id {
            let data_type = ctx
                .resolver
                .attribute_type(ctx.cluster_id, attr_id)
                .unwrap_or(DataType::Unknown);
            attributes.push(AttributeInfo { attr_id, data_type });
        }
    }

    DiscoverResponse {
        complete: true,
        attributes,
    }
}
