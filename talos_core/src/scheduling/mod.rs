//! # TALOS Scheduling System
//!
//! The command scheduling engine: resource arbitration over subsystems,
//! per-tick command execution, default-command fallback, and the
//! record/replay system for reproducing control input.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use talos_core::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! let drivetrain = scheduler.register_subsystem("drivetrain")?;
//! scheduler.set_default_command(drivetrain, teleop_command)?;
//! let auto = scheduler.schedule(autonomous_routine)?;
//!
//! loop {
//!     scheduler.tick(); // once per control cycle
//! }
//! ```

pub mod config;
pub mod record_replay;
pub mod registry;
pub mod scheduler;

pub use config::{RecordingSettings, SchedulerConfig};
pub use registry::{ClaimConflict, SubsystemId, SubsystemRegistry};
pub use scheduler::Scheduler;

// Re-export record/replay
pub use record_replay::{
    BufferSlot, PlaybackCommand, RecordCommand, RecordingConfig, ReplayBuffer, ReplaySample,
};
