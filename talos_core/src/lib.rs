//! # TALOS Core
//!
//! The core runtime for the TALOS robot control framework.
//!
//! TALOS is a tick-driven, command-based control system for mobile robots.
//! This crate provides the fundamental building blocks:
//!
//! - **Commands**: Self-contained units of behavior with a defined lifecycle
//! - **Subsystems**: Physical resource domains under exclusive ownership
//! - **Scheduling**: Cooperative per-tick execution with atomic resource
//!   arbitration and default-command fallback
//! - **Composition**: Sequence/parallel/race/deadline groups and decorators
//!   for building routines declaratively
//! - **Record/Replay**: Tick-exact capture and playback of control signals
//! - **Telemetry**: Best-effort dashboard publishing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use talos_core::{Command, Scheduler, TickContext};
//!
//! struct BlinkCommand;
//!
//! impl Command for BlinkCommand {
//!     fn name(&self) -> &str { "blink" }
//!
//!     fn execute(&mut self, ctx: &mut TickContext) {
//!         ctx.set_signal("led/on", (ctx.tick_index() % 2) as f64);
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new();
//! let id = scheduler.schedule(Box::new(BlinkCommand)).unwrap();
//! scheduler.tick();
//! assert!(scheduler.is_scheduled(id));
//! ```

pub mod command;
pub mod driver;
pub mod error;
pub mod scheduling;
pub mod signal;
pub mod telemetry;

// Re-export commonly used types for easy access
pub use command::{
    Command, CommandExt, CommandId, CommandState, InstantCommand, ParallelDeadlineGroup,
    ParallelGroup, ParallelRaceGroup, RepeatCommand, RunCommand, SequentialGroup, StartEndCommand,
    TickContext, TimeoutCommand, UntilCommand, WaitCommand, WaitUntilCommand,
};
pub use error::{TalosError, TalosResult};
pub use scheduling::{
    BufferSlot, PlaybackCommand, RecordCommand, RecordingConfig, ReplayBuffer, ReplaySample,
    Scheduler, SchedulerConfig, SubsystemId,
};
pub use signal::SignalBus;
pub use telemetry::{Dashboard, LogSink, MemorySink, TelemetrySink, TelemetryValue};

// Re-export driver utilities (no traits - drivers are simple structs)
pub use driver::{DriverCategory, DriverStatus};
