//! Closure-based leaf commands
//!
//! These cover the common cases where a full `Command` impl would be
//! ceremony: run a closure once, run it forever, run it with a cleanup
//! action, or wait for a tick count / condition.

use super::{Command, TickContext};
use crate::scheduling::SubsystemId;

/// Runs a closure once on its admission tick, then finishes immediately.
///
/// The action runs in `initialize` so that it fires even though the
/// finish-check is already true when the scheduler first consults it.
pub struct InstantCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    action: Box<dyn FnMut(&mut TickContext) + Send>,
}

impl InstantCommand {
    pub fn new<F: FnMut(&mut TickContext) + Send + 'static>(action: F) -> Self {
        Self {
            name: "instant".to_string(),
            requirements: Vec::new(),
            action: Box::new(action),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<SubsystemId>) -> Self {
        self.requirements = requirements;
        self
    }
}

impl Command for InstantCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        (self.action)(ctx);
    }

    fn execute(&mut self, _ctx: &mut TickContext) {}

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        true
    }
}

/// Runs a closure every tick until externally interrupted, with an optional
/// cleanup closure run when the command ends for any reason.
pub struct RunCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    run: Box<dyn FnMut(&mut TickContext) + Send>,
    on_end: Option<Box<dyn FnMut(&mut TickContext) + Send>>,
}

impl RunCommand {
    pub fn new<F: FnMut(&mut TickContext) + Send + 'static>(run: F) -> Self {
        Self {
            name: "run".to_string(),
            requirements: Vec::new(),
            run: Box::new(run),
            on_end: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<SubsystemId>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Run a cleanup closure when the command ends, whether it was
    /// interrupted or (via a decorator) completed naturally
    pub fn with_on_end<F: FnMut(&mut TickContext) + Send + 'static>(mut self, on_end: F) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }
}

impl Command for RunCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        (self.run)(ctx);
    }

    fn end(&mut self, ctx: &mut TickContext, _interrupted: bool) {
        if let Some(on_end) = self.on_end.as_mut() {
            on_end(ctx);
        }
    }
}

/// Runs one closure on start and another on end, idling in between.
/// Finishes only when interrupted; useful for hold-while-pressed behaviors.
pub struct StartEndCommand {
    name: String,
    requirements: Vec<SubsystemId>,
    on_start: Box<dyn FnMut(&mut TickContext) + Send>,
    on_end: Box<dyn FnMut(&mut TickContext) + Send>,
}

impl StartEndCommand {
    pub fn new<S, E>(on_start: S, on_end: E) -> Self
    where
        S: FnMut(&mut TickContext) + Send + 'static,
        E: FnMut(&mut TickContext) + Send + 'static,
    {
        Self {
            name: "start_end".to_string(),
            requirements: Vec::new(),
            on_start: Box::new(on_start),
            on_end: Box::new(on_end),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<SubsystemId>) -> Self {
        self.requirements = requirements;
        self
    }
}

impl Command for StartEndCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        (self.on_start)(ctx);
    }

    fn execute(&mut self, _ctx: &mut TickContext) {}

    fn end(&mut self, ctx: &mut TickContext, _interrupted: bool) {
        (self.on_end)(ctx);
    }
}

/// Does nothing for a fixed number of ticks.
///
/// `WaitCommand::new(n)` finishes exactly `n` ticks after its admission
/// tick; `n == 0` finishes on the admission tick itself.
pub struct WaitCommand {
    name: String,
    ticks: u64,
    started_at: u64,
}

impl WaitCommand {
    pub fn new(ticks: u64) -> Self {
        Self {
            name: format!("wait[{}]", ticks),
            ticks,
            started_at: 0,
        }
    }
}

impl Command for WaitCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.started_at = ctx.tick_index();
    }

    fn execute(&mut self, _ctx: &mut TickContext) {}

    fn is_finished(&self, ctx: &TickContext) -> bool {
        ctx.tick_index() - self.started_at >= self.ticks
    }
}

/// Does nothing until a condition on the tick context becomes true
pub struct WaitUntilCommand {
    name: String,
    condition: Box<dyn Fn(&TickContext) -> bool + Send>,
}

impl WaitUntilCommand {
    pub fn new<F: Fn(&TickContext) -> bool + Send + 'static>(condition: F) -> Self {
        Self {
            name: "wait_until".to_string(),
            condition: Box::new(condition),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Command for WaitUntilCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, _ctx: &mut TickContext) {}

    fn is_finished(&self, ctx: &TickContext) -> bool {
        (self.condition)(ctx)
    }
}
