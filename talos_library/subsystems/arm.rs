//! The arm subsystem
//!
//! The arm lifts game pieces and hooks onto the pull-up bar. It runs on two
//! motors geared together, driven here as one motor pair.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use talos_core::command::{
    CommandExt, RunCommand, SequentialGroup, TickContext, WaitUntilCommand,
};
use talos_core::error::TalosResult;
use talos_core::scheduling::{Scheduler, SubsystemId};

use crate::drivers::motor::SimulationMotorDriver;
use crate::oi::signals;

/// Arm behavior constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArmConfig {
    /// Power that holds the arm in place against gravity
    #[serde(default = "default_hold_power")]
    pub hold_power: f64,
    /// Input below this reads as "no input"
    #[serde(default = "default_input_deadband")]
    pub input_deadband: f64,
    /// Scale applied to joystick input before the hold power is added, so
    /// full stick maps to full power without the arm ever going slack
    #[serde(default = "default_input_scale")]
    pub input_scale: f64,
    /// How long the arm falls slowly after input is released, in ticks
    #[serde(default = "default_drop_ticks")]
    pub drop_ticks: u64,
}

fn default_hold_power() -> f64 {
    0.2
}

fn default_input_deadband() -> f64 {
    0.08
}

fn default_input_scale() -> f64 {
    0.8
}

fn default_drop_ticks() -> u64 {
    88 // 1.75 s at the 20 ms tick
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            hold_power: default_hold_power(),
            input_deadband: default_input_deadband(),
            input_scale: default_input_scale(),
            drop_ticks: default_drop_ticks(),
        }
    }
}

/// Shared handle to the arm
pub type SharedArm = Arc<Mutex<Arm>>;

/// The arm subsystem
pub struct Arm {
    id: SubsystemId,
    config: ArmConfig,
    motors: SimulationMotorDriver,
}

impl Arm {
    /// Create the arm, registering it as a subsystem
    pub fn new(scheduler: &mut Scheduler, config: ArmConfig) -> TalosResult<SharedArm> {
        let id = scheduler.register_subsystem("arm")?;
        let mut motors = SimulationMotorDriver::new();
        motors.init()?;

        let arm = Arc::new(Mutex::new(Self { id, config, motors }));

        if let Some(dashboard) = scheduler.dashboard_mut() {
            let a = arm.clone();
            dashboard.add_number("arm/power", move || a.lock().power());
        }
        Ok(arm)
    }

    /// The subsystem id commands must require
    pub fn id(&self) -> SubsystemId {
        self.id
    }

    /// Power the arm motors, from -1 to 1
    pub fn set_power(&mut self, power: f64) {
        if let Err(e) = self.motors.set_power(power) {
            log::warn!("arm motors rejected power: {}", e);
        }
    }

    /// The last commanded motor power
    pub fn power(&self) -> f64 {
        self.motors.power()
    }

    // Command factories

    /// A command that powers the arm from the published arm signal, before
    /// slowly dropping it.
    ///
    /// Waits for input, follows the joystick while input is held (with the
    /// hold power mixed in so the arm never falls when the stick is let go
    /// quickly), then drops slowly for a while before cutting power. As a
    /// default command this repeats forever, since it is re-admitted
    /// whenever it finishes.
    pub fn default_command(this: &SharedArm) -> TalosResult<SequentialGroup> {
        let (id, config) = {
            let arm = this.lock();
            (arm.id, arm.config)
        };
        let input_detected =
            move |ctx: &TickContext| ctx.signal(signals::ARM_POWER) > config.input_deadband;

        let follow_arm = this.clone();
        let follow = RunCommand::new(move |ctx: &mut TickContext| {
            // Remap input to [0, input_scale] and add the hold power, so
            // there is always a little power on the motors
            let power = ctx.signal(signals::ARM_POWER) * config.input_scale + config.hold_power;
            follow_arm.lock().set_power(power);
        })
        .with_requirements(vec![id])
        .with_name("arm_follow_input")
        .until(move |ctx| !input_detected(ctx));

        let drop_arm = this.clone();
        let drop_slowly = RunCommand::new(move |_| {
            drop_arm.lock().set_power(config.hold_power);
        })
        .with_requirements(vec![id])
        .with_name("arm_drop_slowly")
        .with_timeout(config.drop_ticks)
        .until(input_detected);

        let group = SequentialGroup::new(vec![
            Box::new(WaitUntilCommand::new(input_detected).with_name("arm_wait_for_input")),
            Box::new(follow),
            Box::new(drop_slowly),
        ])?;

        let stop_arm = this.clone();
        Ok(group
            .and_then(move |_| stop_arm.lock().set_power(0.0))
            .with_name("arm_teleop"))
    }

    /// A command that holds the arm at its current height
    pub fn hold_position_command(this: &SharedArm) -> RunCommand {
        let (id, hold_power) = {
            let arm = this.lock();
            (arm.id, arm.config.hold_power)
        };
        let arm = this.clone();
        RunCommand::new(move |_| arm.lock().set_power(hold_power))
            .with_requirements(vec![id])
            .with_name("arm_hold")
    }
}
