//! Composite command groups
//!
//! Groups wrap child commands into a single command with sequencing or
//! parallel semantics. Children are never visible to the scheduler: only the
//! group is scheduled, its requirement set is the union of its children's,
//! and the group drives each child through the same
//! initialize / finish-check / execute / end cycle the scheduler applies to
//! top-level commands. That keeps nesting transparent to arbitrary depth.
//!
//! Parallel-style groups additionally require their children's requirement
//! sets to be disjoint, since the children step concurrently within a tick.
//!
//! Tie-breaks (documented, deterministic):
//! - race: children are stepped in construction order and the first child to
//!   report finished wins the race; later children are interrupted without
//!   stepping again that tick.
//! - deadline: the deadline child is stepped before the other children each
//!   tick, so when it fires the others are interrupted before stepping.

use super::{Command, TickContext};
use crate::error::{TalosError, TalosResult};
use crate::scheduling::SubsystemId;

/// Drive one child through a full scheduler-equivalent tick.
/// Returns true when the child retired (ended naturally) during this call.
fn tick_child(child: &mut Box<dyn Command>, ctx: &mut TickContext) -> bool {
    if child.is_finished(ctx) {
        child.end(ctx, false);
        return true;
    }
    child.execute(ctx);
    if child.is_finished(ctx) {
        child.end(ctx, false);
        return true;
    }
    false
}

fn union_requirements(children: &[Box<dyn Command>]) -> Vec<SubsystemId> {
    let mut union = Vec::new();
    for child in children {
        for requirement in child.requirements() {
            if !union.contains(requirement) {
                union.push(*requirement);
            }
        }
    }
    union
}

/// Union of child requirements, rejecting overlap between children
fn disjoint_requirements(children: &[Box<dyn Command>]) -> TalosResult<Vec<SubsystemId>> {
    let mut union = Vec::new();
    for child in children {
        for requirement in child.requirements() {
            if union.contains(requirement) {
                return Err(TalosError::invalid_composite(format!(
                    "parallel children of '{}' share a subsystem requirement",
                    child.name()
                )));
            }
            union.push(*requirement);
        }
    }
    Ok(union)
}

fn all_interruptible(children: &[Box<dyn Command>]) -> bool {
    children.iter().all(|c| c.interruptible())
}

struct ChildSlot {
    command: Box<dyn Command>,
    running: bool,
}

impl ChildSlot {
    fn new(command: Box<dyn Command>) -> Self {
        Self {
            command,
            running: false,
        }
    }
}

// ============================================================================
// Sequential
// ============================================================================

/// Runs children strictly one at a time in order.
///
/// The next child initializes only after the current one ends naturally, and
/// it takes its first step on the same tick it initializes. Interrupting the
/// group interrupts the current child and never starts the next.
pub struct SequentialGroup {
    name: String,
    children: Vec<Box<dyn Command>>,
    requirements: Vec<SubsystemId>,
    interruptible: bool,
    index: usize,
    child_initialized: bool,
}

impl SequentialGroup {
    pub fn new(children: Vec<Box<dyn Command>>) -> TalosResult<Self> {
        if children.is_empty() {
            return Err(TalosError::invalid_composite(
                "sequential group requires at least one child",
            ));
        }
        let requirements = union_requirements(&children);
        let interruptible = all_interruptible(&children);
        Ok(Self {
            name: "sequential".to_string(),
            children,
            requirements,
            interruptible,
            index: 0,
            child_initialized: false,
        })
    }

    /// Infallible two-child constructor, used by the builder extensions
    pub(crate) fn pair(first: Box<dyn Command>, second: Box<dyn Command>) -> Self {
        let children = vec![first, second];
        let requirements = union_requirements(&children);
        let interruptible = all_interruptible(&children);
        Self {
            name: "sequential".to_string(),
            children,
            requirements,
            interruptible,
            index: 0,
            child_initialized: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Command for SequentialGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn interruptible(&self) -> bool {
        self.interruptible
    }

    fn initialize(&mut self, _ctx: &mut TickContext) {
        self.index = 0;
        self.child_initialized = false;
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        while self.index < self.children.len() {
            let child = &mut self.children[self.index];
            if !self.child_initialized {
                child.initialize(ctx);
                self.child_initialized = true;
            }
            if tick_child(child, ctx) {
                self.index += 1;
                self.child_initialized = false;
                continue;
            }
            return;
        }
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.index >= self.children.len()
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        if interrupted && self.child_initialized && self.index < self.children.len() {
            self.children[self.index].end(ctx, true);
        }
    }
}

// ============================================================================
// Parallel (all)
// ============================================================================

/// Starts all children on the same tick and ends when every child has ended
/// naturally. A child that ends early stops being stepped while the group
/// waits on the slowest child.
pub struct ParallelGroup {
    name: String,
    children: Vec<ChildSlot>,
    requirements: Vec<SubsystemId>,
    interruptible: bool,
}

impl ParallelGroup {
    pub fn new(children: Vec<Box<dyn Command>>) -> TalosResult<Self> {
        if children.is_empty() {
            return Err(TalosError::invalid_composite(
                "parallel group requires at least one child",
            ));
        }
        let requirements = disjoint_requirements(&children)?;
        let interruptible = all_interruptible(&children);
        Ok(Self {
            name: "parallel".to_string(),
            children: children.into_iter().map(ChildSlot::new).collect(),
            requirements,
            interruptible,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Command for ParallelGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn interruptible(&self) -> bool {
        self.interruptible
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        for slot in &mut self.children {
            slot.running = false;
        }
        for slot in &mut self.children {
            slot.command.initialize(ctx);
            slot.running = true;
        }
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        for slot in &mut self.children {
            if !slot.running {
                continue;
            }
            if tick_child(&mut slot.command, ctx) {
                slot.running = false;
            }
        }
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.children.iter().all(|slot| !slot.running)
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        if interrupted {
            for slot in &mut self.children {
                if slot.running {
                    slot.command.end(ctx, true);
                    slot.running = false;
                }
            }
        }
    }
}

// ============================================================================
// Parallel race
// ============================================================================

/// Starts all children on the same tick and ends as soon as any child ends
/// naturally; every other still-running child is interrupted on that tick.
pub struct ParallelRaceGroup {
    name: String,
    children: Vec<ChildSlot>,
    requirements: Vec<SubsystemId>,
    interruptible: bool,
    finished: bool,
}

impl ParallelRaceGroup {
    pub fn new(children: Vec<Box<dyn Command>>) -> TalosResult<Self> {
        if children.is_empty() {
            return Err(TalosError::invalid_composite(
                "race group requires at least one child",
            ));
        }
        let requirements = disjoint_requirements(&children)?;
        let interruptible = all_interruptible(&children);
        Ok(Self {
            name: "race".to_string(),
            children: children.into_iter().map(ChildSlot::new).collect(),
            requirements,
            interruptible,
            finished: false,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn interrupt_running(&mut self, ctx: &mut TickContext) {
        for slot in &mut self.children {
            if slot.running {
                slot.command.end(ctx, true);
                slot.running = false;
            }
        }
    }
}

impl Command for ParallelRaceGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn interruptible(&self) -> bool {
        self.interruptible
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.finished = false;
        for slot in &mut self.children {
            slot.running = false;
        }
        for slot in &mut self.children {
            slot.command.initialize(ctx);
            slot.running = true;
        }
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        if self.finished {
            return;
        }
        let mut won = false;
        for i in 0..self.children.len() {
            let slot = &mut self.children[i];
            if !slot.running {
                continue;
            }
            if tick_child(&mut slot.command, ctx) {
                slot.running = false;
                won = true;
                break;
            }
        }
        if won {
            self.finished = true;
            self.interrupt_running(ctx);
        }
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.finished
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        if interrupted {
            self.interrupt_running(ctx);
        }
    }
}

// ============================================================================
// Parallel deadline
// ============================================================================

/// Runs a deadline child alongside the other children and ends exactly when
/// the deadline child ends naturally, interrupting any child still running.
pub struct ParallelDeadlineGroup {
    name: String,
    deadline: ChildSlot,
    children: Vec<ChildSlot>,
    requirements: Vec<SubsystemId>,
    interruptible: bool,
    finished: bool,
}

impl ParallelDeadlineGroup {
    pub fn new(deadline: Box<dyn Command>, children: Vec<Box<dyn Command>>) -> TalosResult<Self> {
        let mut all = Vec::with_capacity(children.len() + 1);
        all.push(deadline);
        all.extend(children);
        let requirements = disjoint_requirements(&all)?;
        let interruptible = all_interruptible(&all);
        let mut slots: Vec<ChildSlot> = all.into_iter().map(ChildSlot::new).collect();
        let deadline = slots.remove(0);
        Ok(Self {
            name: "deadline".to_string(),
            deadline,
            children: slots,
            requirements,
            interruptible,
            finished: false,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn interrupt_running(&mut self, ctx: &mut TickContext) {
        if self.deadline.running {
            self.deadline.command.end(ctx, true);
            self.deadline.running = false;
        }
        for slot in &mut self.children {
            if slot.running {
                slot.command.end(ctx, true);
                slot.running = false;
            }
        }
    }
}

impl Command for ParallelDeadlineGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn interruptible(&self) -> bool {
        self.interruptible
    }

    fn initialize(&mut self, ctx: &mut TickContext) {
        self.finished = false;
        self.deadline.running = false;
        for slot in &mut self.children {
            slot.running = false;
        }
        self.deadline.command.initialize(ctx);
        self.deadline.running = true;
        for slot in &mut self.children {
            slot.command.initialize(ctx);
            slot.running = true;
        }
    }

    fn execute(&mut self, ctx: &mut TickContext) {
        if self.finished {
            return;
        }
        // Deadline child steps first: when it fires, the others are
        // interrupted before taking another step this tick.
        if self.deadline.running && tick_child(&mut self.deadline.command, ctx) {
            self.deadline.running = false;
            self.finished = true;
            self.interrupt_running(ctx);
            return;
        }
        for slot in &mut self.children {
            if !slot.running {
                continue;
            }
            if tick_child(&mut slot.command, ctx) {
                slot.running = false;
            }
        }
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.finished
    }

    fn end(&mut self, ctx: &mut TickContext, interrupted: bool) {
        if interrupted {
            self.interrupt_running(ctx);
        }
    }
}
