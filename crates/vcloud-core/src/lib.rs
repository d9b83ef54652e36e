//! Session and task layer between `vcloud-api` and the `vcd` CLI.
//!
//! - **[`SessionManager`]**: keeps one authenticated [`Session`] per
//!   profile alive for the lifetime of the process: reuses a validated
//!   session, restores one from the persisted token, or reports
//!   [`CoreError::NotAuthenticated`] so the command can abort cleanly.
//!   Calls are serialized per profile and bounded by a timeout and a
//!   shared cancellation token.
//!
//! - **[`TaskMonitor`]**: polls an [`OperationHandle`] to a terminal
//!   state at a fixed cadence, retrying transient failures a bounded
//!   number of times and feeding a [`ProgressSink`] with monotonic
//!   progress.
//!
//! - **[`TabularResult`]**: the renderer-agnostic output shape shared by
//!   every command, with masking and truncation applied once so table and
//!   structured output always agree.
//!
//! - **[`ControlPlane`]**: the narrow remote contract the session manager
//!   and task monitor depend on, implemented for [`vcloud_api::VcdClient`].

pub(crate) mod call;
pub mod config;
pub mod error;
pub mod profile;
pub mod remote;
pub mod session;
pub mod tabular;
pub mod task;

#[cfg(test)]
pub(crate) mod fake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use error::CoreError;
pub use profile::{Profile, ProfileField};
pub use remote::{ControlPlane, Credentials};
pub use session::{LoginOutcome, Session, SessionManager, SessionOptions, SessionState};
pub use tabular::TabularResult;
pub use task::{
    MonitorOptions, NoProgress, OperationHandle, ProgressSink, TaskMonitor, TaskOutcome,
    TaskReport, TaskSnapshot, TaskState,
};

pub use vcloud_api::SessionInfo;
