//! Attribute Report Scheduling
//!
//! The [`ReportScheduler`] is the single owner of every reporting
//! configuration. Each configured attribute gets its own tokio task which
//! holds the attribute's [`AttributeReportConfig`] together with its minimum
//! and maximum interval timers. Everything that touches that state (Configure
//! Reporting, the timers, opportunistic checks after reads and writes, Read
//! Reporting Configuration snapshots) is a message to that task, so the three
//! report triggers of one attribute are serialized while different attributes
//! run independently.
//!
//! # Timers
//!
//! For a schedule with `max_interval != 0xffff`:
//!
//! - a one-shot minimum timer fires `min_interval` seconds after configuration
//!   (skipped when `min_interval == 0`) and reports the current store value;
//! - a periodic maximum timer fires every `max_interval` seconds (never when
//!   `max_interval == 0`), reports the current value and re-arms the minimum
//!   timer.
//!
//! Reconfiguring drops both timers before new ones are armed. Timers live
//! inside the task's event loop, so a dropped timer can never fire.
//!
//! # Opportunistic reports
//!
//! After a successful read or write of an analog attribute that has a
//! configuration, [`ReportHook::on_value`] replaces the last reported value
//! and, when periodic reporting is enabled and the change exceeds the
//! configured threshold, emits a report to whoever issued the read or write.

mod task;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use log::debug;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::datatype::DataType;
use crate::foundation::REPORTING_DISABLED;
use crate::frame::{Address, Direction, FrameHeader, FramingOptions};
use crate::store::AttributeStore;
use crate::transport::FrameSink;
use crate::value::AttributeValue;

use task::{AttributeTask, Command};

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors raised by the report scheduler
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The attribute's task is no longer running
    #[error("report task for {0} has stopped")]
    Stopped(AttributeKey),
}

/// Identity of a reportable attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    pub cluster_id: u16,
    pub attr_id: u16,
}

impl AttributeKey {
    pub fn new(cluster_id: u16, attr_id: u16) -> Self {
        Self {
            cluster_id,
            attr_id,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}/{:#06x}", self.cluster_id, self.attr_id)
    }
}

/// Where reports go and how they are framed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTarget {
    pub destination: Address,
    /// Framing without a sequence number
    pub options: FramingOptions,
}

impl ReportTarget {
    pub fn new(destination: Address, options: FramingOptions) -> Self {
        Self {
            destination,
            options: options.unsolicited(),
        }
    }

    /// Reports answering a request from `source`
    pub fn for_request(source: Address, header: &FrameHeader) -> Self {
        Self::new(source, header.reply_options(Direction::ServerToClient))
    }
}

/// Negotiated schedule of a reported attribute
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportingSchedule {
    pub data_type: DataType,
    /// Seconds
    pub min_interval: u16,
    /// Seconds, or [`REPORTING_DISABLED`]
    pub max_interval: u16,
    /// Only kept for analog types
    pub change_threshold: Option<f64>,
}

impl ReportingSchedule {
    pub fn is_periodic(&self) -> bool {
        self.max_interval != REPORTING_DISABLED
    }
}

/// Reporting state of one attribute
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeReportConfig {
    /// Set when this device reports the attribute
    pub schedule: Option<ReportingSchedule>,
    /// Set when this device expects reports of the attribute
    pub timeout: Option<u16>,
    /// Last value actually reported or observed
    pub last_reported: Option<AttributeValue>,
}

/// Policy invoked after every successful read or write of an attribute
#[async_trait]
pub trait ReportHook: Send + Sync {
    /// Returns true when a report was emitted
    async fn on_value(
        &self,
        key: AttributeKey,
        data_type: DataType,
        value: &AttributeValue,
        requester: &ReportTarget,
    ) -> bool;
}

struct TaskHandle {
    commands: mpsc::UnboundedSender<Command>,
    join: JoinHandle<()>,
}

/// Owner of all per-attribute reporting state
pub struct ReportScheduler {
    store: Arc<dyn AttributeStore>,
    sink: Arc<dyn FrameSink>,
    tasks: Mutex<HashMap<AttributeKey, TaskHandle>>,
}

impl ReportScheduler {
    pub fn new(store: Arc<dyn AttributeStore>, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            store,
            sink,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Install or replace the schedule of an attribute.
    ///
    /// Timer reports go to `target`.
    pub async fn configure(
        &self,
        key: AttributeKey,
        schedule: ReportingSchedule,
        target: ReportTarget,
    ) -> Result<()> {
        debug!(
            "Configuring reports for {}: min {}s, max {}s, change {:?}",
            key, schedule.min_interval, schedule.max_interval, schedule.change_threshold
        );
        let (done, wait) = oneshot::channel();
        self.send(
            key,
            self.handle_or_spawn(key),
            Command::Configure {
                schedule,
                target,
                done,
            },
        )?;
        wait.await.map_err(|_| SchedulerError::Stopped(key))
    }

    /// Record the timeout for reports this device expects to receive
    pub async fn set_timeout(&self, key: AttributeKey, timeout: u16) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.send(
            key,
            self.handle_or_spawn(key),
            Command::SetTimeout { timeout, done },
        )?;
        wait.await.map_err(|_| SchedulerError::Stopped(key))
    }

    /// Snapshot of an attribute's reporting state, `None` if never configured
    pub async fn config(&self, key: AttributeKey) -> Option<AttributeReportConfig> {
        let commands = self.handle(key)?;
        let (reply, wait) = oneshot::channel();
        commands.send(Command::Snapshot { reply }).ok()?;
        wait.await.ok()
    }

    pub fn is_configured(&self, key: AttributeKey) -> bool {
        self.lock().contains_key(&key)
    }

    /// Stop every attribute task; pending timers are dropped
    pub fn shutdown(&self) {
        let tasks: Vec<_> = self.lock().drain().collect();
        for (key, handle) in tasks {
            debug!("Stopping report task for {}", key);
            handle.join.abort();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AttributeKey, TaskHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, key: AttributeKey) -> Option<mpsc::UnboundedSender<Command>> {
        self.lock().get(&key).map(|handle| handle.commands.clone())
    }

    fn handle_or_spawn(&self, key: AttributeKey) -> mpsc::UnboundedSender<Command> {
        let mut tasks = self.lock();
        let handle = tasks.entry(key).or_insert_with(|| {
            let (commands, join) =
                AttributeTask::spawn(key, Arc::clone(&self.store), Arc::clone(&self.sink));
            TaskHandle { commands, join }
        });
        handle.commands.clone()
    }

    fn send(
        &self,
        key: AttributeKey,
        commands: mpsc::UnboundedSender<Command>,
        command: Command,
    ) -> Result<()> {
        commands
            .send(command)
            .map_err(|_| SchedulerError::Stopped(key))
    }
}

impl Drop for ReportScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[async_trait]
impl ReportHook for ReportScheduler {
    async fn on_value(
        &self,
        key: AttributeKey,
        data_type: DataType,
        value: &AttributeValue,
        requester: &ReportTarget,
    ) -> bool {
        if !data_type.is_analog() {
            return false;
        }
        let Some(commands) = self.handle(key) else {
            return false;
        };

        let (done, wait) = oneshot::channel();
        let command = Command::Observe {
            value: value.clone(),
            requester: *requester,
            done,
        };
        if commands.send(command).is_err() {
            return false;
        }
        wait.await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{AttributeReport, FoundationResponse};
    use crate::frame::FrameControl;
    use crate::store::{Access, ClusterDirection, MemoryStore, MemoryStoreBuilder};
    use crate::transport::OutboundFrame;
    use std::time::Duration;
    use tokio::time::Instant;

    const CLUSTER: u16 = 0x0402;
    const KEY: AttributeKey = AttributeKey {
        cluster_id: CLUSTER,
        attr_id: 0x0000,
    };

    fn setup() -> (
        MemoryStore,
        ReportScheduler,
        mpsc::UnboundedReceiver<OutboundFrame>,
    ) {
        let store = MemoryStoreBuilder::new()
            .cluster(CLUSTER, ClusterDirection::SERVER)
            .attribute(CLUSTER, 0x0000, 10u16, Access::READ_WRITE)
            .build()
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = ReportScheduler::new(Arc::new(store.clone()), Arc::new(tx));
        (store, scheduler, rx)
    }

    fn target(endpoint: u8) -> ReportTarget {
        let header = FrameHeader::new(FrameControl::empty(), 9, 0x06);
        ReportTarget::for_request(Address::new(0x1234, 0x0001, endpoint), &header)
    }

    fn schedule(min: u16, max: u16, change: Option<f64>) -> ReportingSchedule {
        ReportingSchedule {
            data_type: DataType::Uint16,
            min_interval: min,
            max_interval: max,
            change_threshold: change,
        }
    }

    async fn observe(
        scheduler: &ReportScheduler,
        data_type: DataType,
        value: AttributeValue,
        endpoint: u8,
    ) -> bool {
        scheduler
            .on_value(KEY, data_type, &value, &target(endpoint))
            .await
    }

    fn reported_value(frame: &OutboundFrame) -> AttributeValue {
        match frame.foundation_payload() {
            Some(FoundationResponse::Report(reports)) => {
                let AttributeReport { value, .. } = &reports[0];
                value.clone()
            }
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn test_target_has_no_sequence_number() {
        let target = target(1);
        assert_eq!(target.options.sequence_number, None);
        assert_eq!(target.options.direction, Direction::ServerToClient);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(KEY.to_string(), "0x0402/0x0000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_then_max_timer() {
        let (store, scheduler, mut rx) = setup();
        let start = Instant::now();
        scheduler
            .configure(KEY, schedule(1, 3, Some(5.0)), target(1))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(reported_value(&first), AttributeValue::from(10u16));
        assert_eq!(first.options.sequence_number, None);

        store.set_local(CLUSTER, 0x0000, 42u16.into()).unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(reported_value(&second), AttributeValue::from(42u16));

        // The max timer re-arms the min timer
        let third = rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert_eq!(reported_value(&third), AttributeValue::from(42u16));

        let config = scheduler.config(KEY).await.unwrap();
        assert_eq!(config.last_reported, Some(AttributeValue::from(42u16)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_min_max_deadline() {
        let (_store, scheduler, mut rx) = setup();
        scheduler
            .configure(KEY, schedule(3, 3, None), target(1))
            .await
            .unwrap();

        // Both timers are due at 3s; each reports once
        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut reports = 0;
        while rx.try_recv().is_ok() {
            reports += 1;
        }
        assert_eq!(reports, 2);

        // The max timer re-armed min for 6s, where both fire again
        tokio::time::sleep(Duration::from_secs(3)).await;
        let mut reports = 0;
        while rx.try_recv().is_ok() {
            reports += 1;
        }
        assert_eq!(reports, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_schedule_arms_nothing() {
        let (_store, scheduler, mut rx) = setup();
        scheduler
            .configure(KEY, schedule(1, REPORTING_DISABLED, Some(5.0)), target(1))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());

        let config = scheduler.config(KEY).await.unwrap();
        assert_eq!(config.last_reported, None);

        // Observed, but never reported without a periodic baseline
        assert!(!observe(&scheduler, DataType::Uint16, AttributeValue::from(10u16), 2).await);
        assert!(!observe(&scheduler, DataType::Uint16, AttributeValue::from(90u16), 2).await);
        assert!(rx.try_recv().is_err());
        let config = scheduler.config(KEY).await.unwrap();
        assert_eq!(config.last_reported, Some(AttributeValue::from(90u16)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_interval_keeps_min_timer() {
        let (_store, scheduler, mut rx) = setup();
        let start = Instant::now();
        scheduler
            .configure(KEY, schedule(2, 0, None), target(1))
            .await
            .unwrap();

        rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(2));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_cancels_timers() {
        let (_store, scheduler, mut rx) = setup();
        let start = Instant::now();
        scheduler
            .configure(KEY, schedule(0, 5, None), target(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        scheduler
            .configure(KEY, schedule(0, 10, None), target(2))
            .await
            .unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(14));
        assert_eq!(frame.destination.endpoint, 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_report_goes_to_requester() {
        let (_store, scheduler, mut rx) = setup();
        scheduler
            .configure(KEY, schedule(0, 60, Some(15.0)), target(1))
            .await
            .unwrap();

        // No previous value, nothing to compare against
        assert!(!observe(&scheduler, DataType::Uint16, AttributeValue::from(10u16), 7).await);
        assert!(!observe(&scheduler, DataType::Uint16, AttributeValue::from(25u16), 7).await);
        assert!(observe(&scheduler, DataType::Uint16, AttributeValue::from(50u16), 7).await);

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.destination.endpoint, 7);
        assert_eq!(reported_value(&frame), AttributeValue::from(50u16));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_hook_ignores_unconfigured_and_digital() {
        let (_store, scheduler, _rx) = setup();
        assert!(!observe(&scheduler, DataType::Uint16, AttributeValue::from(1u16), 1).await);
        assert!(!scheduler.is_configured(KEY));

        scheduler.set_timeout(KEY, 30).await.unwrap();
        assert!(scheduler.is_configured(KEY));
        assert!(!observe(&scheduler, DataType::Boolean, AttributeValue::Bool(true), 1).await);
        let config = scheduler.config(KEY).await.unwrap();
        assert_eq!(config.timeout, Some(30));
        assert_eq!(config.schedule, None);
        assert_eq!(config.last_reported, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_skips_report() {
        let store = MemoryStoreBuilder::new()
            .cluster(CLUSTER, ClusterDirection::SERVER)
            .attribute(CLUSTER, 0x0000, 10u16, Access::WRITE)
            .build()
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = ReportScheduler::new(Arc::new(store), Arc::new(tx));
        scheduler
            .configure(KEY, schedule(1, 2, None), target(1))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.config(KEY).await.unwrap().last_reported, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_tasks() {
        let (_store, scheduler, mut rx) = setup();
        scheduler
            .configure(KEY, schedule(1, 2, None), target(1))
            .await
            .unwrap();
        scheduler.shutdown();
        assert!(!scheduler.is_configured(KEY));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.config(KEY).await, None);
    }
}
