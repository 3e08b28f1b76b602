//! # TALOS - Tick-driven Autonomous Layer for Operated Systems
//!
//! TALOS is a command-based control framework for mobile robots: operator
//! input and sensor state go in each tick, a resource-safe scheduler decides
//! what every mechanism does, and actuator commands come out - all inside a
//! fixed periodic cycle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use talos::prelude::*;
//! use talos::library::subsystems::drivetrain::{DriveConfig, Drivetrain};
//!
//! fn main() -> TalosResult<()> {
//!     let mut scheduler = Scheduler::new();
//!     let drivetrain = Drivetrain::new(&mut scheduler, DriveConfig::default())?;
//!     let id = drivetrain.lock().id();
//!     scheduler.set_default_command(id, Box::new(Drivetrain::default_command(&drivetrain)))?;
//!
//!     loop {
//!         scheduler.tick();
//!         std::thread::sleep(scheduler.tick_period());
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - **Resource-safe scheduling** with atomic all-or-nothing arbitration
//! - **Declarative routine composition** (sequence, parallel, race, deadline)
//! - **Tick-exact record/replay** of control signals
//! - **Standard library** of subsystems and simulation drivers

// Re-export core components
pub use talos_core::{self, *};

// Re-export standard library with alias
pub use talos_library as library;

/// The TALOS prelude - everything you need to get started
///
/// Just add `use talos::prelude::*;`.
pub mod prelude {
    // ============================================
    // Core command types
    // ============================================
    pub use talos_core::command::{Command, CommandId, CommandState, TickContext};
    pub use talos_core::error::{TalosError, TalosResult};

    // ============================================
    // Composition
    // ============================================
    pub use talos_core::command::{
        CommandExt, InstantCommand, ParallelDeadlineGroup, ParallelGroup, ParallelRaceGroup,
        RepeatCommand, RunCommand, SequentialGroup, StartEndCommand, TimeoutCommand, UntilCommand,
        WaitCommand, WaitUntilCommand,
    };

    // ============================================
    // Scheduling
    // ============================================
    pub use talos_core::scheduling::{Scheduler, SchedulerConfig, SubsystemId};

    // ============================================
    // Record/Replay
    // ============================================
    pub use talos_core::scheduling::{
        BufferSlot, PlaybackCommand, RecordCommand, RecordingConfig, ReplayBuffer,
    };

    // ============================================
    // Signals and telemetry
    // ============================================
    pub use talos_core::signal::SignalBus;
    pub use talos_core::telemetry::{Dashboard, LogSink, MemorySink, TelemetrySink};
}
