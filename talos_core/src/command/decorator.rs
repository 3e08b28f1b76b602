//! Command decorators
//!
//! Decorators wrap a single command and adjust its termination behavior
//! while passing its requirements and interruption policy straight through.
//! The builder methods on [`CommandExt`] make routine construction read
//! declaratively:
//!
//! ```ignore
//! drivetrain_cmd.with_timeout(150).and_then(|ctx| ctx.set_signal("done", 1.0))
//! ```

use super::functional::InstantCommand;
use super::group::SequentialGroup;
use super::{Command, TickContext};
use crate::scheduling::SubsystemId;

/// Ends its inner command once a fixed number of ticks has elapsed since
/// initialize, whichever comes first between that and the inner finish-check.
///
/// Elapsed time is measured in scheduler ticks, not wall-clock time, so a
/// timeout of N ticks scheduled at tick T ends exactly at tick T+N.
pub struct TimeoutCommand {
    name: String,
    inner: Box<dyn Command>,
    timeout_ticks: u64,
    started_at: u64,
}

impl TimeoutCommand {
    pub fn new(inner: Box<dyn Command>, timeout_ticks: u64) -> Self {
        Self {
            name: format!("timeout[{}]({})", timeout_ticks, inner.name()),
            inner,
            timeout_ticks,
            started_at: 0,
        }
    }
}

impl Command for TimeoutCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        self.inner.requirements()
    }

    fn interruptible(&self) -> bool {
        self.inner.interruptible()
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.started_at = ctx.tick_index();
        self.inner.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        self.inner.execute(ctx);
    }

    fn is_finished(&self, ctx: &TickContext) -> bool {
        self.inner.is_finished(ctx) || ctx.tick_index() - self.started_at >= self.timeout_ticks
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        // When the timeout fired before the inner finish-check, the inner
        // command did not complete on its own terms: it sees interrupted.
        let timed_out = !self.inner.is_finished(ctx);
        self.inner.end(ctx, interrupted || timed_out);
    }
}

/// Ends its inner command once a condition on the tick context becomes true
/// (checked before the inner finish-check), whichever comes first.
pub struct UntilCommand {
    name: String,
    inner: Box<dyn Command>,
    condition: Box<dyn Fn(&TickContext) -> bool + Send>,
}

impl UntilCommand {
    pub fn new<F: Fn(&TickContext) -> bool + Send + 'static>(
        inner: Box<dyn Command>,
        condition: F,
    ) -> Self {
        Self {
            name: format!("until({})", inner.name()),
            inner,
            condition: Box::new(condition),
        }
    }
}

impl Command for UntilCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        self.inner.requirements()
    }

    fn interruptible(&self) -> bool {
        self.inner.interruptible()
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.inner.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        self.inner.execute(ctx);
    }

    fn is_finished(&self, ctx: &TickContext) -> bool {
        (self.condition)(ctx) || self.inner.is_finished(ctx)
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        let cut_short = !self.inner.is_finished(ctx);
        self.inner.end(ctx, interrupted || cut_short);
    }
}

/// Restarts its inner command each time it finishes, running it in a loop
/// until externally interrupted. The inner entry and exit actions run on
/// every iteration.
pub struct RepeatCommand {
    name: String,
    inner: Box<dyn Command>,
}

impl RepeatCommand {
    pub fn new(inner: Box<dyn Command>) -> Self {
        Self {
            name: format!("repeat({})", inner.name()),
            inner,
        }
    }
}

impl Command for RepeatCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        self.inner.requirements()
    }

    fn interruptible(&self) -> bool {
        self.inner.interruptible()
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.inner.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        // Reset the inner command's state at the end of each iteration
        if self.inner.is_finished(ctx) {
            self.inner.end(ctx, false);
            self.inner.initialize(ctx);
            return;
        }
        self.inner.execute(ctx);
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        self.inner.end(ctx, interrupted);
    }
}

/// Builder-style combinators available on every command
pub trait CommandExt: Command + Sized + 'static {
    /// Cut this command off after `ticks` scheduler ticks
    fn with_timeout(self, ticks: u64) -> TimeoutCommand {
        TimeoutCommand::new(Box::new(self), ticks)
    }

    /// Cut this command off once `condition` becomes true
    fn until<F: Fn(&TickContext) -> bool + Send + 'static>(self, condition: F) -> UntilCommand {
        UntilCommand::new(Box::new(self), condition)
    }

    /// Restart this command forever each time it finishes
    fn repeatedly(self) -> RepeatCommand {
        RepeatCommand::new(Box::new(self))
    }

    /// Run a one-shot action after this command completes
    fn and_then<F: FnMut(&mut TickContext) + Send + 'static>(self, action: F) -> SequentialGroup {
        SequentialGroup::pair(Box::new(self), Box::new(InstantCommand::new(action)))
    }

    /// Chain another command after this one
    fn before(self, next: Box<dyn Command>) -> SequentialGroup {
        SequentialGroup::pair(Box::new(self), next)
    }
}

impl<T: Command + Sized + 'static> CommandExt for T {}

#[cfg(test)]
mod tests {
    use super::super::functional::{RunCommand, WaitCommand};
    use super::*;
    use crate::signal::SignalBus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Step a command the way the scheduler would for one tick: entry action
    /// first on the admission tick, then finish-check before the step.
    /// Returns true when the command retired during this tick.
    fn step(command: &mut dyn Command, tick: u64, bus: &mut SignalBus, first: bool) -> bool {
        let mut ctx = TickContext::new(tick, bus);
        if first {
            command.initialize(&mut ctx);
        }
        if command.is_finished(&ctx) {
            command.end(&mut ctx, false);
            return true;
        }
        command.execute(&mut ctx);
        false
    }

    #[test]
    fn test_timeout_ends_exactly_on_elapsed_tick() {
        let executes = Arc::new(AtomicUsize::new(0));
        let e = executes.clone();
        let forever = RunCommand::new(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });
        let mut command = forever.with_timeout(2);

        let mut bus = SignalBus::new();
        assert!(!step(&mut command, 0, &mut bus, true));
        assert!(!step(&mut command, 1, &mut bus, false));
        assert!(step(&mut command, 2, &mut bus, false));
        assert_eq!(executes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_timeout_passes_interrupted_to_cut_off_inner() {
        let ended = Arc::new(AtomicUsize::new(0));
        let e = ended.clone();
        let forever = RunCommand::new(|_| {}).with_on_end(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });
        let mut command = forever.with_timeout(1);

        let mut bus = SignalBus::new();
        assert!(!step(&mut command, 0, &mut bus, true));
        assert!(step(&mut command, 1, &mut bus, false));
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_timeout_defers_to_inner_finish() {
        let mut command = WaitCommand::new(1).with_timeout(100);
        let mut bus = SignalBus::new();
        assert!(!step(&mut command, 0, &mut bus, true));
        assert!(step(&mut command, 1, &mut bus, false));
    }

    #[test]
    fn test_until_fires_on_condition() {
        let mut command = RunCommand::new(|_| {}).until(|ctx| ctx.signal_bool("arm/input"));

        let mut bus = SignalBus::new();
        assert!(!step(&mut command, 0, &mut bus, true));
        bus.write_bool("arm/input", true);
        assert!(step(&mut command, 1, &mut bus, false));
    }

    #[test]
    fn test_repeat_restarts_inner() {
        let inits = Arc::new(AtomicUsize::new(0));
        let i = inits.clone();

        struct CountingInit {
            inits: Arc<AtomicUsize>,
            executed: u64,
        }

        impl Command for CountingInit {
            fn initialize(&mut self, _ctx: &mut TickContext) {
                self.executed = 0;
                self.inits.fetch_add(1, Ordering::SeqCst);
            }

            fn execute(&mut self, _ctx: &mut TickContext) {
                self.executed += 1;
            }

            fn is_finished(&self, _ctx: &TickContext) -> bool {
                self.executed >= 1
            }
        }

        let mut command = RepeatCommand::new(Box::new(CountingInit {
            inits: i,
            executed: 0,
        }));

        let mut bus = SignalBus::new();
        // Never finishes on its own; each iteration re-initializes the inner
        assert!(!step(&mut command, 0, &mut bus, true));
        assert!(!step(&mut command, 1, &mut bus, false));
        assert!(!step(&mut command, 2, &mut bus, false));
        assert!(inits.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_and_then_chains_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        let mut command = WaitCommand::new(1).and_then(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let mut bus = SignalBus::new();
        let mut retired = false;
        for tick in 0..5 {
            if step(&mut command, tick, &mut bus, tick == 0) {
                retired = true;
                break;
            }
        }
        assert!(retired);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
