//! Command scheduler
//!
//! The central loop of the control program. Once per tick the external
//! driver calls [`Scheduler::tick`], which:
//!
//! 1. admits default commands for idle subsystems,
//! 2. advances every active command in stable admission order (newly
//!    admitted commands run their entry action and first step on this same
//!    tick),
//! 3. retires finished commands, releasing their subsystems and re-admitting
//!    default commands for the freed subsystems within the same tick,
//! 4. publishes telemetry and advances the tick index.
//!
//! Scheduling is single-threaded and cooperative: a command's step executes
//! to completion and returns control every cycle, and all arbitration is
//! atomic within a tick. Cancellation - direct or via resource preemption -
//! is synchronous: the dispossessed command's exit action runs before the
//! call returns and its subsystems are immediately reassignable.
//!
//! A panic in any command action is contained: the command is retired as
//! interrupted, its resources are released, and every other command keeps
//! ticking.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use colored::Colorize;

use super::config::SchedulerConfig;
use super::registry::{SubsystemId, SubsystemRegistry};
use crate::command::{Command, CommandId, CommandState, TickContext};
use crate::error::{TalosError, TalosResult};
use crate::signal::SignalBus;
use crate::telemetry::Dashboard;

/// A command under scheduler ownership
struct ActiveCommand {
    id: CommandId,
    name: String,
    command: Box<dyn Command>,
    requirements: Vec<SubsystemId>,
    interruptible: bool,
    state: CommandState,
    /// Set when this instance is a subsystem's default command; it returns
    /// to the default slot on retirement instead of being dropped
    default_of: Option<SubsystemId>,
}

enum StepOutcome {
    Running,
    /// Ended naturally; the exit action has already run
    Finished,
    /// An action panicked; `end_ran` records whether the exit action ran
    Faulted { end_ran: bool },
}

/// Central orchestrator: owns the subsystems, the active commands, the
/// signal bus, and the dashboard, and drives them once per tick.
pub struct Scheduler {
    name: String,
    registry: SubsystemRegistry,
    active: Vec<ActiveCommand>,
    default_commands: BTreeMap<SubsystemId, Box<dyn Command>>,
    signals: SignalBus,
    dashboard: Option<Dashboard>,
    tick_index: u64,
    next_id: u64,
    tick_period: Duration,
    suppress_default_admission: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create an empty scheduler with the default 20 ms tick period
    pub fn new() -> Self {
        Self {
            name: "TalosScheduler".to_string(),
            registry: SubsystemRegistry::new(),
            active: Vec::new(),
            default_commands: BTreeMap::new(),
            signals: SignalBus::new(),
            dashboard: None,
            tick_index: 0,
            next_id: 0,
            tick_period: Duration::from_millis(20),
            suppress_default_admission: false,
        }
    }

    /// Set the scheduler name (builder pattern)
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Apply a configuration preset (builder pattern)
    pub fn with_config(mut self, config: &SchedulerConfig) -> Self {
        self.name = config.name.clone();
        self.tick_period = config.tick_period();
        self
    }

    /// Attach a telemetry dashboard (builder pattern)
    pub fn with_dashboard(mut self, dashboard: Dashboard) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    /// Override the nominal tick period (builder pattern)
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Scheduler name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nominal tick period, for the external periodic driver to pace on
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Index of the next tick to run
    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Number of currently active commands (including pending admissions)
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Shared view of the signal bus
    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    /// Mutable view of the signal bus, for input glue between ticks
    pub fn signals_mut(&mut self) -> &mut SignalBus {
        &mut self.signals
    }

    /// The attached dashboard, if any
    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }

    // ========================================================================
    // Subsystems and default commands
    // ========================================================================

    /// Register a physical resource domain under a unique name
    pub fn register_subsystem(&mut self, name: &str) -> TalosResult<SubsystemId> {
        let id = self.registry.register(name)?;
        log::info!("registered subsystem '{}' as {}", name, id);
        Ok(id)
    }

    /// Name of a registered subsystem
    pub fn subsystem_name(&self, id: SubsystemId) -> &str {
        self.registry.name(id)
    }

    /// The command currently owning a subsystem
    pub fn owner_of(&self, id: SubsystemId) -> Option<CommandId> {
        self.registry.owner(id)
    }

    /// Bind a fallback command that runs whenever no other command holds the
    /// subsystem. The command must require the subsystem and be
    /// interruptible; a previously bound default is cancelled and replaced.
    pub fn set_default_command(
        &mut self,
        subsystem: SubsystemId,
        command: Box<dyn Command>,
    ) -> TalosResult<()> {
        if !self.registry.contains(subsystem) {
            return Err(TalosError::not_found(format!(
                "subsystem {} is not registered",
                subsystem
            )));
        }
        if !command.requirements().contains(&subsystem) {
            return Err(TalosError::invalid_input(format!(
                "default command '{}' must require subsystem '{}'",
                command.name(),
                self.registry.name(subsystem)
            )));
        }
        self.validate_requirements(command.requirements())?;
        if !command.interruptible() {
            return Err(TalosError::invalid_input(format!(
                "default command '{}' must be interruptible",
                command.name()
            )));
        }

        // Retire a currently running instance of the old default before
        // replacing the slot, so its exit action still runs. Admission is
        // suppressed so the old instance cannot slip back in before the
        // slot is overwritten.
        if let Some(index) = self
            .active
            .iter()
            .position(|e| e.default_of == Some(subsystem))
        {
            self.suppress_default_admission = true;
            self.retire_at(index, true, false);
            self.suppress_default_admission = false;
        }
        log::info!(
            "default command '{}' bound to subsystem '{}'",
            command.name(),
            self.registry.name(subsystem)
        );
        self.default_commands.insert(subsystem, command);
        Ok(())
    }

    /// Unbind a subsystem's default command, cancelling it if it is running
    pub fn remove_default_command(&mut self, subsystem: SubsystemId) -> Option<Box<dyn Command>> {
        if let Some(index) = self
            .active
            .iter()
            .position(|e| e.default_of == Some(subsystem))
        {
            self.suppress_default_admission = true;
            self.retire_at(index, true, false);
            self.suppress_default_admission = false;
        }
        self.default_commands.remove(&subsystem)
    }

    // ========================================================================
    // Driver interface
    // ========================================================================

    /// Reset the scheduler at a mode transition: cancel everything and
    /// restart the tick count
    pub fn initialize(&mut self) {
        self.cancel_all();
        self.tick_index = 0;
    }

    /// Submit a command for execution.
    ///
    /// Arbitration is immediate and all-or-nothing: every required subsystem
    /// must be free or held by an interruptible owner, otherwise the whole
    /// request is rejected with `ResourceConflict` and nothing changes.
    /// Dispossessed owners receive their interrupted exit action before this
    /// call returns. The admitted command runs its entry action and first
    /// step on the next tick.
    pub fn schedule(&mut self, command: Box<dyn Command>) -> TalosResult<CommandId> {
        let mut requirements: Vec<SubsystemId> = Vec::new();
        for requirement in command.requirements() {
            if !requirements.contains(requirement) {
                requirements.push(*requirement);
            }
        }
        self.validate_requirements(&requirements)?;

        let id = self.alloc_id();
        let claim = {
            let active = &self.active;
            let can_interrupt = |owner: CommandId| {
                active
                    .iter()
                    .find(|e| e.id == owner)
                    .map(|e| e.interruptible)
                    .unwrap_or(false)
            };
            self.registry.try_claim(id, &requirements, &can_interrupt)
        };

        let dispossessed = match claim {
            Ok(dispossessed) => dispossessed,
            Err(conflict) => {
                let owner_name = self
                    .active
                    .iter()
                    .find(|e| e.id == conflict.owner)
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| conflict.owner.to_string());
                return Err(TalosError::resource_conflict(
                    self.registry.name(conflict.subsystem),
                    owner_name,
                ));
            }
        };

        for owner in dispossessed {
            self.cancel(owner);
        }

        log::debug!("scheduled '{}' as {}", command.name(), id);
        self.active.push(ActiveCommand {
            id,
            name: command.name().to_string(),
            interruptible: command.interruptible(),
            requirements,
            command,
            state: CommandState::Pending,
            default_of: None,
        });
        Ok(id)
    }

    /// Cancel a command, running its interrupted exit action synchronously
    /// and releasing its subsystems. A no-op for unknown or already-ended
    /// ids.
    pub fn cancel(&mut self, id: CommandId) {
        if let Some(index) = self.active.iter().position(|e| e.id == id) {
            self.retire_at(index, true, false);
        }
    }

    /// Cancel every active command, including running default commands
    pub fn cancel_all(&mut self) {
        self.suppress_default_admission = true;
        while !self.active.is_empty() {
            self.retire_at(0, true, false);
        }
        self.suppress_default_admission = false;
    }

    /// Whether a command is currently owned by the scheduler
    pub fn is_scheduled(&self, id: CommandId) -> bool {
        self.active.iter().any(|e| e.id == id)
    }

    /// Lifecycle state of an active command (`Ended` commands are no longer
    /// tracked, so they report `None`)
    pub fn command_state(&self, id: CommandId) -> Option<CommandState> {
        self.active.iter().find(|e| e.id == id).map(|e| e.state)
    }

    /// Run one scheduling cycle
    pub fn tick(&mut self) {
        self.admit_default_commands();

        let mut index = 0;
        while index < self.active.len() {
            let outcome = {
                let Scheduler {
                    active,
                    signals,
                    tick_index,
                    ..
                } = self;
                let entry = &mut active[index];
                let mut ctx = TickContext::new(*tick_index, signals);
                step_active(entry, &mut ctx)
            };
            match outcome {
                StepOutcome::Running => index += 1,
                StepOutcome::Finished => self.retire_at(index, false, true),
                StepOutcome::Faulted { end_ran } => self.retire_at(index, true, end_ran),
            }
        }

        self.publish_telemetry();
        self.tick_index += 1;
    }

    /// Check the core ownership invariant: every active command owns all of
    /// its requirements and nothing else, and no subsystem is owned by a
    /// command that is not active. Intended for tests and debug assertions.
    pub fn ownership_consistent(&self) -> bool {
        for entry in &self.active {
            for requirement in &entry.requirements {
                if self.registry.owner(*requirement) != Some(entry.id) {
                    return false;
                }
            }
        }
        for subsystem in self.registry.ids() {
            if let Some(owner) = self.registry.owner(subsystem) {
                let Some(entry) = self.active.iter().find(|e| e.id == owner) else {
                    return false;
                };
                if !entry.requirements.contains(&subsystem) {
                    return false;
                }
            }
        }
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn alloc_id(&mut self) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        id
    }

    fn validate_requirements(&self, requirements: &[SubsystemId]) -> TalosResult<()> {
        for id in requirements {
            if !self.registry.contains(*id) {
                return Err(TalosError::scheduling(format!(
                    "requirement {} is not a registered subsystem",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Admit default commands for every idle subsystem whose default's whole
    /// requirement set is free. Admitted defaults run their entry action and
    /// first step when the tick loop reaches them.
    fn admit_default_commands(&mut self) {
        if self.suppress_default_admission {
            return;
        }
        let bound: Vec<SubsystemId> = self.default_commands.keys().copied().collect();
        for subsystem in bound {
            if self.registry.owner(subsystem).is_some() {
                continue;
            }
            let all_free = self
                .default_commands
                .get(&subsystem)
                .map(|c| {
                    c.requirements()
                        .iter()
                        .all(|r| self.registry.owner(*r).is_none())
                })
                .unwrap_or(false);
            if !all_free {
                continue;
            }
            if let Some(command) = self.default_commands.remove(&subsystem) {
                let id = self.alloc_id();
                let requirements = command.requirements().to_vec();
                match self.registry.try_claim(id, &requirements, &|_| false) {
                    Ok(_) => {
                        log::debug!(
                            "default command '{}' admitted for '{}'",
                            command.name(),
                            self.registry.name(subsystem)
                        );
                        self.active.push(ActiveCommand {
                            id,
                            name: command.name().to_string(),
                            interruptible: command.interruptible(),
                            requirements,
                            command,
                            state: CommandState::Pending,
                            default_of: Some(subsystem),
                        });
                    }
                    Err(_) => {
                        // All requirements were checked free above; losing
                        // the claim here means the check and claim raced,
                        // which cannot happen single-threaded
                        log::warn!(
                            "default command for '{}' lost its claim",
                            self.registry.name(subsystem)
                        );
                        self.default_commands.insert(subsystem, command);
                    }
                }
            }
        }
    }

    /// Remove the command at `index` from the active set, run its exit
    /// action if it has not already run, release its subsystems, and
    /// re-admit default commands for the freed subsystems.
    fn retire_at(&mut self, index: usize, interrupted: bool, end_already_ran: bool) {
        let mut entry = self.active.remove(index);
        let run_end = !end_already_ran
            && entry.state != CommandState::Pending
            && entry.state != CommandState::Ended;
        if run_end {
            let Scheduler {
                signals,
                tick_index,
                ..
            } = self;
            let mut ctx = TickContext::new(*tick_index, signals);
            let name = entry.name.clone();
            let _ = guard(&name, "end", || entry.command.end(&mut ctx, interrupted));
        }
        entry.state = CommandState::Ended;

        let freed = self.registry.release(entry.id);
        log::debug!(
            "retired '{}' ({}) interrupted={}",
            entry.name,
            entry.id,
            interrupted
        );

        if let Some(subsystem) = entry.default_of {
            self.default_commands.insert(subsystem, entry.command);
        }
        if !freed.is_empty() {
            self.admit_default_commands();
        }
    }

    fn publish_telemetry(&mut self) {
        let tick = self.tick_index as f64;
        let active = self.active.len() as f64;
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.publish_number("scheduler/tick", tick);
            dashboard.publish_number("scheduler/active_commands", active);
            dashboard.update();
        }
    }
}

/// Drive one active command through a full tick: entry action on admission,
/// then finish-check, then the step action. The finish-check runs before
/// the step, so a command whose check elapses between ticks (timeouts,
/// exhausted playback) retires on that exact tick without an extra step.
/// Every call into the command is panic-guarded.
fn step_active(entry: &mut ActiveCommand, ctx: &mut TickContext) -> StepOutcome {
    let name = entry.name.clone();
    if entry.state == CommandState::Pending {
        entry.state = CommandState::Initializing;
        if guard(&name, "initialize", || entry.command.initialize(ctx)).is_err() {
            return StepOutcome::Faulted { end_ran: false };
        }
        entry.state = CommandState::Executing;
    }
    match guard(&name, "finish-check", || entry.command.is_finished(ctx)) {
        Err(()) => return StepOutcome::Faulted { end_ran: false },
        Ok(true) => return end_naturally(entry, ctx, &name),
        Ok(false) => {}
    }
    if guard(&name, "execute", || entry.command.execute(ctx)).is_err() {
        return StepOutcome::Faulted { end_ran: false };
    }
    StepOutcome::Running
}

fn end_naturally(entry: &mut ActiveCommand, ctx: &mut TickContext, name: &str) -> StepOutcome {
    entry.state = CommandState::Ended;
    match guard(name, "end", || entry.command.end(ctx, false)) {
        Ok(()) => StepOutcome::Finished,
        Err(()) => StepOutcome::Faulted { end_ran: true },
    }
}

/// Execute a command action with panic containment
fn guard<T>(name: &str, phase: &str, action: impl FnOnce() -> T) -> Result<T, ()> {
    match catch_unwind(AssertUnwindSafe(action)) {
        Ok(value) => Ok(value),
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            log::error!("command '{}' panicked during {}: {}", name, phase, message);
            eprintln!(
                "{}",
                format!(
                    "[FAULT] command '{}' panicked during {}: {}",
                    name, phase, message
                )
                .red()
            );
            Err(())
        }
    }
}
