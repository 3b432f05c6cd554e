//! Per-attribute reporting task
//!
//! One task per configured attribute. The task owns the configuration record
//! and both timers; the scheduler only talks to it through [`Command`]s.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use log::{trace, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::{AttributeKey, AttributeReportConfig, ReportTarget, ReportingSchedule};
use crate::datatype::DataType;
use crate::foundation::{AttributeReport, FoundationResponse};
use crate::store::AttributeStore;
use crate::transport::{FrameSink, OutboundFrame};
use crate::value::AttributeValue;

pub(super) enum Command {
    Configure {
        schedule: ReportingSchedule,
        target: ReportTarget,
        done: oneshot::Sender<()>,
    },
    SetTimeout {
        timeout: u16,
        done: oneshot::Sender<()>,
    },
    /// A read or write produced `value`; replies whether a report went out
    Observe {
        value: AttributeValue,
        requester: ReportTarget,
        done: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<AttributeReportConfig>,
    },
}

pub(super) struct AttributeTask {
    key: AttributeKey,
    store: Arc<dyn AttributeStore>,
    sink: Arc<dyn FrameSink>,
    config: AttributeReportConfig,
    /// Destination of timer-driven reports
    target: Option<ReportTarget>,
    min_deadline: Option<Instant>,
    max_timer: Option<Interval>,
}

impl AttributeTask {
    pub(super) fn spawn(
        key: AttributeKey,
        store: Arc<dyn AttributeStore>,
        sink: Arc<dyn FrameSink>,
    ) -> (mpsc::UnboundedSender<Command>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = Self {
            key,
            store,
            sink,
            config: AttributeReportConfig::default(),
            target: None,
            min_deadline: None,
            max_timer: None,
        };
        (tx, tokio::spawn(task.run(rx)))
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            // Min before max so a shared deadline reports in both branches
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.apply(command).await,
                    None => break,
                },
                _ = sleep_until(self.min_deadline) => {
                    self.min_deadline = None;
                    self.report_current().await;
                }
                _ = tick(&mut self.max_timer) => {
                    self.report_current().await;
                    self.arm_min_timer();
                }
            }
        }
        trace!("Report task for {} finished", self.key);
    }

    async fn apply(&mut self, command: Command) {
        match command {
            Command::Configure {
                schedule,
                target,
                done,
            } => {
                self.configure(schedule, target);
                let _ = done.send(());
            }
            Command::SetTimeout { timeout, done } => {
                self.config.timeout = Some(timeout);
                let _ = done.send(());
            }
            Command::Observe {
                value,
                requester,
                done,
            } => {
                let reported = self.observe(value, &requester).await;
                let _ = done.send(reported);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.config.clone());
            }
        }
    }

    fn configure(&mut self, schedule: ReportingSchedule, target: ReportTarget) {
        self.min_deadline = None;
        self.max_timer = None;
        self.config.schedule = Some(schedule);
        self.target = Some(target);

        if !schedule.is_periodic() {
            return;
        }
        self.arm_min_timer();
        if schedule.max_interval != 0 {
            let period = Duration::from_secs(schedule.max_interval.into());
            let mut timer = time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.max_timer = Some(timer);
        }
    }

    /// Replaces any pending minimum timer
    fn arm_min_timer(&mut self) {
        self.min_deadline = match self.config.schedule {
            Some(schedule) if schedule.min_interval != 0 => {
                Some(Instant::now() + Duration::from_secs(schedule.min_interval.into()))
            }
            _ => None,
        };
    }

    async fn report_current(&mut self) {
        let (Some(schedule), Some(target)) = (self.config.schedule, self.target) else {
            return;
        };
        let value = match self
            .store
            .read(self.key.cluster_id, self.key.attr_id)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("Skipping report of {}: {}", self.key, e);
                return;
            }
        };
        self.config.last_reported = Some(value.clone());
        self.emit(schedule.data_type, value, &target).await;
    }

    async fn observe(&mut self, value: AttributeValue, requester: &ReportTarget) -> bool {
        let previous = self.config.last_reported.replace(value.clone());
        let Some(schedule) = self.config.schedule else {
            return false;
        };
        let Some(threshold) = schedule.change_threshold else {
            return false;
        };
        if !schedule.is_periodic() {
            return false;
        }

        let exceeded = previous
            .as_ref()
            .is_some_and(|previous| value.exceeds_change(previous, threshold));
        if exceeded {
            self.emit(schedule.data_type, value, requester).await;
        }
        exceeded
    }

    async fn emit(&self, data_type: DataType, value: AttributeValue, target: &ReportTarget) {
        trace!(
            "Reporting {} = {:?} to {}",
            self.key,
            value,
            target.destination
        );
        let report = FoundationResponse::Report(vec![AttributeReport {
            attr_id: self.key.attr_id,
            data_type,
            value,
        }]);
        let frame = OutboundFrame::foundation(
            target.destination,
            self.key.cluster_id,
            report,
            target.options,
        );
        if let Err(e) = self.sink.send(frame).await {
            warn!("Failed to send report of {}: {}", self.key, e);
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

async fn tick(timer: &mut Option<Interval>) -> Instant {
    match timer {
        Some(timer) => timer.tick().await,
        None => future::pending().await,
    }
}
