//! Configure Reporting and Read Reporting Configuration handlers
//!
//! Both handlers go through the [`ReportScheduler`](crate::report::ReportScheduler),
//! which owns every configuration record; nothing is kept here between calls.

use log::warn;

use super::{
    ConfigureReportingStatusRecord, HandlerContext, ReportDirection, ReportingConfiguration,
    ReportingConfigurationQuery, ReportingConfigurationRecord, ReportingParameters,
    REPORTING_DISABLED, TIMEOUT_UNSET,
};
use crate::datatype::DataType;
use crate::report::{AttributeKey, ReportingSchedule};
use crate::status::Status;

/// Apply each configuration record in order.
///
/// Per record:
/// 1. unknown attribute → `UnsupportedAttribute`
/// 2. array, struct or bag attribute → `UnsupportedAttribute`
/// 3. receive direction → timeout stored, `Success`
/// 4. report direction with a mismatched type → `InvalidDataType`
/// 5. otherwise the schedule replaces any previous one, `Success`
pub async fn configure_reporting(
    ctx: &HandlerContext<'_>,
    records: &[ReportingConfiguration],
) -> Vec<ConfigureReportingStatusRecord> {
    let mut statuses = Vec::with_capacity(records.len());
    for record in records {
        statuses.push(ConfigureReportingStatusRecord {
            attr_id: record.attr_id,
            direction: record.direction(),
            status: configure_one(ctx, record).await,
        });
    }
    statuses
}

async fn configure_one(ctx: &HandlerContext<'_>, record: &ReportingConfiguration) -> Status {
    let Some(declared) = declared_type(ctx, record.attr_id) else {
        return Status::UnsupportedAttribute;
    };
    if declared.is_composite() {
        return Status::UnsupportedAttribute;
    }

    let key = AttributeKey::new(ctx.cluster_id, record.attr_id);
    let applied = match record.parameters {
        ReportingParameters::Received { timeout } => ctx.scheduler.set_timeout(key, timeout).await,
        ReportingParameters::Reported {
            data_type,
            min_interval,
            max_interval,
            reportable_change,
        } => {
            if data_type != declared {
                return Status::InvalidDataType;
            }
            let schedule = ReportingSchedule {
                data_type: declared,
                min_interval,
                max_interval,
                change_threshold: reportable_change.filter(|_| declared.is_analog()),
            };
            ctx.scheduler.configure(key, schedule, ctx.requester).await
        }
    };

    match applied {
        Ok(()) => Status::Success,
        Err(e) => {
            warn!("Configure reporting failed: {}", e);
            Status::Failure
        }
    }
}

/// Echo the stored configuration of each queried attribute.
///
/// Unknown attributes answer `UnsupportedAttribute` before the configuration
/// is even looked at; attributes never configured answer
/// `UnreportableAttribute`. Unset fields come back as their defaults
/// (`0xffff` for intervals and timeout, `0` for the reportable change).
pub async fn read_reporting_configuration(
    ctx: &HandlerContext<'_>,
    queries: &[ReportingConfigurationQuery],
) -> Vec<ReportingConfigurationRecord> {
    let mut records = Vec::with_capacity(queries.len());
    for query in queries {
        let (status, parameters) = match read_one(ctx, query).await {
            Ok(parameters) => (Status::Success, Some(parameters)),
            Err(status) => (status, None),
        };
        records.push(ReportingConfigurationRecord {
            attr_id: query.attr_id,
            direction: query.direction,
            status,
            parameters,
        });
    }
    records
}

async fn read_one(
    ctx: &HandlerContext<'_>,
    query: &ReportingConfigurationQuery,
) -> Result<ReportingParameters, Status> {
    let declared = declared_type(ctx, query.attr_id).ok_or(Status::UnsupportedAttribute)?;
    let key = AttributeKey::new(ctx.cluster_id, query.attr_id);
    let config = ctx
        .scheduler
        .config(key)
        .await
        .ok_or(Status::UnreportableAttribute)?;

    let parameters = match query.direction {
        ReportDirection::Received => ReportingParameters::Received {
            timeout: config.timeout.unwrap_or(TIMEOUT_UNSET),
        },
        ReportDirection::Reported => {
            let schedule = config.schedule;
            let change = schedule.and_then(|s| s.change_threshold).unwrap_or(0.0);
            ReportingParameters::Reported {
                data_type: declared,
                min_interval: schedule.map_or(REPORTING_DISABLED, |s| s.min_interval),
                max_interval: schedule.map_or(REPORTING_DISABLED, |s| s.max_interval),
                reportable_change: declared.is_analog().then_some(change),
            }
        }
    };
    Ok(parameters)
}

fn declared_type(ctx: &HandlerContext<'_>, attr_id: u16) -> Option<DataType> {
    if !ctx.store.contains(ctx.cluster_id, attr_id) {
        return None;
    }
    ctx.resolver.attribute_type(ctx.cluster_id, attr_id)
}
