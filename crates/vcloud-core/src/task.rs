//! Task monitoring: poll a long-running remote operation to completion.
//!
//! [`TaskMonitor::await_completion`] consumes an [`OperationHandle`] and
//! drives it through a small state machine:
//!
//! ```text
//! Polling ──terminal snapshot──▶ Completed / Failed / Canceled
//!    │ ──deadline passed─────────▶ TimedOut (task may still be running)
//!    │ ──cancel token fired──────▶ CancelRequested { confirmed }
//!    └ ──retries exhausted───────▶ Err(TransientNetwork)
//! ```
//!
//! Progress fed to the [`ProgressSink`] never decreases, and the sink is
//! only called when the displayed state or progress actually changes.

use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vcloud_api::TaskRecord;

use crate::call::{CallOutcome, bounded};
use crate::error::CoreError;
use crate::remote::ControlPlane;

// ── Task state ───────────────────────────────────────────────────────

/// Lifecycle state of a remote task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Queued,
    Running,
    Success,
    Error,
    Canceled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Canceled)
    }

    /// Map a remote status string. Unknown non-terminal statuses count as
    /// running so the monitor keeps polling.
    pub fn from_remote(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "queued" | "prerunning" | "pending" => Self::Queued,
            "success" => Self::Success,
            "error" => Self::Error,
            "canceled" | "cancelled" | "aborted" => Self::Canceled,
            _ => Self::Running,
        }
    }
}

/// Point-in-time view of a remote task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub state: TaskState,
    /// Completion percentage, clamped to `0..=100`.
    pub progress: u8,
    pub operation: Option<String>,
    pub message: Option<String>,
    /// Structured failure payload, present only for [`TaskState::Error`].
    pub detail: Option<serde_json::Value>,
}

impl TaskSnapshot {
    pub fn new(id: impl Into<String>, state: TaskState, progress: u8) -> Self {
        Self {
            id: id.into(),
            state,
            progress: progress.min(100),
            operation: None,
            message: None,
            detail: None,
        }
    }
}

impl From<TaskRecord> for TaskSnapshot {
    fn from(record: TaskRecord) -> Self {
        let state = TaskState::from_remote(&record.status);
        let progress = record
            .progress
            .map_or(0, |p| u8::try_from(p.clamp(0, 100)).unwrap_or(100));

        let error_message = record
            .error
            .as_ref()
            .and_then(|e| e.get("message"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);

        let message = match state {
            TaskState::Error => error_message.or(record.details),
            _ => record.details.or(error_message),
        };

        Self {
            id: record.id,
            state,
            progress,
            operation: record.operation,
            message,
            detail: if state == TaskState::Error {
                record.error
            } else {
                None
            },
        }
    }
}

// ── Handle ───────────────────────────────────────────────────────────

/// Reference to a remote long-running operation, tagged with the profile
/// that started it. Consumed by [`TaskMonitor::await_completion`].
#[derive(Debug, PartialEq, Eq)]
pub struct OperationHandle {
    id: String,
    profile: String,
    operation: Option<String>,
}

impl OperationHandle {
    pub fn new(id: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile: profile.into(),
            operation: None,
        }
    }

    /// Handle for the task a mutating call returned.
    pub fn from_task(record: &TaskRecord, profile: impl Into<String>) -> Self {
        Self {
            id: record.id.clone(),
            profile: profile.into(),
            operation: record.operation.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

// ── Progress sink ────────────────────────────────────────────────────

/// Receives progress updates while a task is monitored.
pub trait ProgressSink {
    /// Called when the displayed state or progress changes. `progress` is
    /// the monotonic value to show, which may exceed `snapshot.progress`.
    fn update(&mut self, snapshot: &TaskSnapshot, progress: u8);

    /// Called once when monitoring ends, whatever the outcome.
    fn finish(&mut self, _outcome: &TaskOutcome) {}
}

/// Sink that discards updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _snapshot: &TaskSnapshot, _progress: u8) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(&TaskSnapshot, u8),
{
    fn update(&mut self, snapshot: &TaskSnapshot, progress: u8) {
        self(snapshot, progress);
    }
}

// ── Options & outcome ────────────────────────────────────────────────

/// Polling policy.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Delay between polls.
    pub poll_interval: Duration,
    /// Overall deadline. Zero gives up immediately without polling.
    pub timeout: Duration,
    /// Consecutive transient poll failures tolerated before giving up.
    pub max_poll_retries: u32,
    /// Upper bound for a single poll request.
    pub call_timeout: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(1800),
            max_poll_retries: 3,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// How monitoring ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed,
    /// The task was canceled on the remote side.
    Canceled,
    /// The deadline passed before a terminal state was observed.
    TimedOut,
    /// Local cancellation fired; a remote cancel was attempted.
    CancelRequested { confirmed: bool },
}

/// Result of [`TaskMonitor::await_completion`].
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task_id: String,
    pub outcome: TaskOutcome,
    /// Last snapshot observed, if any poll succeeded.
    pub last: Option<TaskSnapshot>,
    /// Poll attempts made, failed ones included.
    pub polls: u32,
    pub elapsed: Duration,
}

impl TaskReport {
    /// Collapse the report into the command-level result.
    pub fn into_result(self) -> Result<TaskSnapshot, CoreError> {
        match self.outcome {
            TaskOutcome::Completed => self.last.ok_or_else(|| {
                CoreError::Internal(format!("task {} completed without a snapshot", self.task_id))
            }),
            TaskOutcome::Failed => {
                let (message, detail) = self
                    .last
                    .map(|s| (s.message, s.detail))
                    .unwrap_or_default();
                Err(CoreError::RemoteOperation {
                    task_id: self.task_id,
                    message: message.unwrap_or_else(|| "task reported an error".into()),
                    detail,
                })
            }
            TaskOutcome::Canceled => Err(CoreError::RemoteOperation {
                task_id: self.task_id,
                message: "task was canceled".into(),
                detail: None,
            }),
            TaskOutcome::TimedOut => Err(CoreError::Timeout {
                task_id: self.task_id,
                waited_secs: self.elapsed.as_secs(),
            }),
            TaskOutcome::CancelRequested { confirmed } => Err(CoreError::Cancelled {
                message: if confirmed {
                    format!("task {} was canceled", self.task_id)
                } else {
                    format!(
                        "stopped waiting for task {}; remote cancel was not confirmed",
                        self.task_id
                    )
                },
            }),
        }
    }
}

// ── Monitor ──────────────────────────────────────────────────────────

/// Polls remote tasks for one [`ControlPlane`].
pub struct TaskMonitor<'a, A> {
    api: &'a A,
    options: MonitorOptions,
    cancel: CancellationToken,
}

impl<'a, A: ControlPlane> TaskMonitor<'a, A> {
    pub fn new(api: &'a A, options: MonitorOptions, cancel: CancellationToken) -> Self {
        Self {
            api,
            options,
            cancel,
        }
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    /// Poll `handle` until it reaches a terminal state, the deadline
    /// passes, or cancellation fires.
    ///
    /// Only exhausted retries and authentication loss are errors; every
    /// other ending is described by the returned [`TaskReport`].
    pub async fn await_completion(
        &self,
        handle: OperationHandle,
        sink: &mut dyn ProgressSink,
    ) -> Result<TaskReport, CoreError> {
        let started = Instant::now();
        let deadline = started + self.options.timeout;
        let mut progress = Progress::default();
        let mut last: Option<TaskSnapshot> = None;
        let mut polls = 0u32;
        let mut failures = 0u32;

        debug!(task = handle.id(), "monitoring task");

        let outcome = loop {
            if self.cancel.is_cancelled() {
                break self.request_cancel(&handle).await;
            }
            let now = Instant::now();
            if now >= deadline {
                info!(task = handle.id(), polls, "task monitor deadline reached");
                break TaskOutcome::TimedOut;
            }

            polls += 1;
            let limit = self.options.call_timeout.min(deadline - now);
            let failure = match bounded(self.api.poll_operation(handle.id()), limit, &self.cancel).await {
                CallOutcome::Done(snapshot) => {
                    failures = 0;
                    if let Some(shown) = progress.advance(&snapshot) {
                        sink.update(&snapshot, shown);
                    }
                    let state = snapshot.state;
                    last = Some(snapshot);
                    match state {
                        TaskState::Success => break TaskOutcome::Completed,
                        TaskState::Error => break TaskOutcome::Failed,
                        TaskState::Canceled => break TaskOutcome::Canceled,
                        TaskState::Queued | TaskState::Running => None,
                    }
                }
                CallOutcome::Cancelled => continue,
                // A poll cut short by the deadline is the deadline, not a network fault.
                CallOutcome::TimedOut if Instant::now() >= deadline => {
                    info!(task = handle.id(), polls, "task monitor deadline reached during poll");
                    break TaskOutcome::TimedOut;
                }
                CallOutcome::TimedOut => Some(format!("poll timed out after {}s", limit.as_secs())),
                CallOutcome::Failed(err) if err.is_transient() => Some(err.to_string()),
                CallOutcome::Failed(err) if err.is_auth_expired() => {
                    sink.finish(&TaskOutcome::Failed);
                    return Err(CoreError::NotAuthenticated {
                        profile: handle.profile().to_owned(),
                    });
                }
                CallOutcome::Failed(err) => {
                    sink.finish(&TaskOutcome::Failed);
                    return Err(err.into());
                }
            };

            if let Some(message) = failure {
                failures += 1;
                if failures > self.options.max_poll_retries {
                    sink.finish(&TaskOutcome::Failed);
                    return Err(CoreError::TransientNetwork {
                        operation: format!("polling task {}", handle.id()),
                        attempts: failures,
                        message,
                    });
                }
                warn!(
                    task = handle.id(),
                    attempt = failures,
                    max = self.options.max_poll_retries,
                    error = %message,
                    "task poll failed, retrying"
                );
            }

            let now = Instant::now();
            if now < deadline {
                let nap = self.options.poll_interval.min(deadline - now);
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep(nap) => {}
                }
            }
        };

        sink.finish(&outcome);
        Ok(TaskReport {
            task_id: handle.id,
            outcome,
            last,
            polls,
            elapsed: started.elapsed(),
        })
    }

    /// Best-effort remote cancel after local cancellation.
    async fn request_cancel(&self, handle: &OperationHandle) -> TaskOutcome {
        info!(task = handle.id(), "cancellation requested, asking remote to cancel task");
        // The shared token has already fired, so only the deadline bounds this call.
        let confirmed = match tokio::time::timeout(
            self.options.call_timeout,
            self.api.cancel_operation(handle.id()),
        )
        .await
        {
            Ok(Ok(accepted)) => accepted,
            Ok(Err(err)) => {
                warn!(task = handle.id(), error = %err, "remote cancel failed");
                false
            }
            Err(_) => {
                warn!(task = handle.id(), "remote cancel timed out");
                false
            }
        };
        TaskOutcome::CancelRequested { confirmed }
    }
}

/// Tracks what the sink last displayed.
#[derive(Default)]
struct Progress {
    shown: Option<(TaskState, u8)>,
}

impl Progress {
    /// Returns the value to display if anything visible changed.
    fn advance(&mut self, snapshot: &TaskSnapshot) -> Option<u8> {
        let value = self
            .shown
            .map_or(snapshot.progress, |(_, p)| p.max(snapshot.progress));
        let next = (snapshot.state, value);
        if self.shown == Some(next) {
            return None;
        }
        self.shown = Some(next);
        Some(value)
    }
}
