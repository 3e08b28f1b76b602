//! Command contract and building blocks
//!
//! A command is a self-contained unit of robot behavior with a defined
//! lifecycle, bound to the subsystems it needs exclusive use of. The
//! scheduler owns commands while they run and drives them through:
//!
//! - `initialize` - one-shot entry action, run on the admission tick
//! - `execute` - step action, run once per tick
//! - `is_finished` - finish-check, consulted before each step
//! - `end(interrupted)` - one-shot exit action, run exactly once
//!
//! Composite commands (sequence, parallel, race, deadline) and decorators
//! (timeout, until, repeat) implement the same trait by delegating to their
//! children, so arbitrarily nested routines present themselves to the
//! scheduler as a single opaque command with a single requirement set.

pub mod decorator;
pub mod functional;
pub mod group;

pub use decorator::{CommandExt, RepeatCommand, TimeoutCommand, UntilCommand};
pub use functional::{
    InstantCommand, RunCommand, StartEndCommand, WaitCommand, WaitUntilCommand,
};
pub use group::{ParallelDeadlineGroup, ParallelGroup, ParallelRaceGroup, SequentialGroup};

use std::fmt;

use crate::scheduling::SubsystemId;
use crate::signal::SignalBus;

/// Handle identifying one scheduled command instance.
///
/// Issued by `Scheduler::schedule` and used to cancel or query the command
/// afterwards; stays valid (as a no-op target) after the command ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub(crate) u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// Lifecycle states of a scheduled command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Admitted, entry action not yet run
    Pending,
    /// Entry action in progress
    Initializing,
    /// Stepped once per tick
    Executing,
    /// Terminal; exit action has run and resources are released
    Ended,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandState::Pending => write!(f, "Pending"),
            CommandState::Initializing => write!(f, "Initializing"),
            CommandState::Executing => write!(f, "Executing"),
            CommandState::Ended => write!(f, "Ended"),
        }
    }
}

/// Per-tick context handed to every command lifecycle call: the current tick
/// index and the signal bus.
pub struct TickContext<'a> {
    tick: u64,
    signals: &'a mut SignalBus,
}

impl<'a> TickContext<'a> {
    pub fn new(tick: u64, signals: &'a mut SignalBus) -> Self {
        Self { tick, signals }
    }

    /// Index of the current scheduler tick
    pub fn tick_index(&self) -> u64 {
        self.tick
    }

    /// Read a numeric signal (0.0 when never written)
    pub fn signal(&self, path: &str) -> f64 {
        self.signals.read(path)
    }

    /// Read a boolean signal
    pub fn signal_bool(&self, path: &str) -> bool {
        self.signals.read_bool(path)
    }

    /// Write a numeric signal
    pub fn set_signal(&mut self, path: &str, value: f64) {
        self.signals.write(path, value);
    }

    /// Shared view of the signal bus
    pub fn signals(&self) -> &SignalBus {
        self.signals
    }

    /// Mutable view of the signal bus
    pub fn signals_mut(&mut self) -> &mut SignalBus {
        self.signals
    }
}

/// A schedulable unit of robot behavior.
///
/// The requirement set must be declared before scheduling and stay fixed for
/// the whole run; the scheduler enforces at most one active command per
/// subsystem at any instant.
pub trait Command: Send {
    /// Human-readable name, used in logs and conflict errors
    fn name(&self) -> &str {
        "command"
    }

    /// Subsystems this command needs exclusive use of
    fn requirements(&self) -> &[SubsystemId] {
        &[]
    }

    /// One-shot entry action, run on the tick the command is admitted
    fn initialize(&mut self, _ctx: &mut TickContext) {}

    /// Step action, run once per tick while the command is executing
    fn execute(&mut self, ctx: &mut TickContext);

    /// Finish-check. Returning `false` forever makes the command run until
    /// externally interrupted (default commands, manual control).
    fn is_finished(&self, _ctx: &TickContext) -> bool {
        false
    }

    /// One-shot exit action. `interrupted` distinguishes cancellation and
    /// preemption from natural completion; success side effects must be
    /// skipped when it is set.
    fn end(&mut self, _ctx: &mut TickContext, _interrupted: bool) {}

    /// Whether a conflicting schedule request may preempt this command
    fn interruptible(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_state_display() {
        assert_eq!(CommandState::Pending.to_string(), "Pending");
        assert_eq!(CommandState::Ended.to_string(), "Ended");
    }

    #[test]
    fn test_tick_context_signal_roundtrip() {
        let mut bus = SignalBus::new();
        let mut ctx = TickContext::new(3, &mut bus);
        assert_eq!(ctx.tick_index(), 3);

        ctx.set_signal("drive/forward", 0.5);
        assert_eq!(ctx.signal("drive/forward"), 0.5);
        assert_eq!(ctx.signal("drive/turn"), 0.0);
    }
}
