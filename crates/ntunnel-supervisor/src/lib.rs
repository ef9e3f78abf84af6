//! `ntunnel` Process Supervisor
//!
//! Owns the lifecycle of the external frp client subprocess: spawn with the
//! rendered config, observe liveness through a readiness window, signal and
//! reap on stop with a bounded wait and forced-kill fallback. The runtime
//! record persisted next to the config lets one-shot CLI invocations share
//! the cached process state.

pub mod runtime;
pub mod status;
pub mod supervisor;

pub use runtime::{ProcessState, RuntimeRecord};
pub use status::{StatusReporter, TunnelStatus};
pub use supervisor::{ProcessSupervisor, SupervisorOptions};
