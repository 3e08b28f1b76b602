//! The winch subsystem
//!
//! A winch winds a string around a rotating drum to pull or release a
//! mechanism. This winch pulls the arm downwards, letting the robot pull
//! itself up on a bar.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use talos_core::command::RunCommand;
use talos_core::error::TalosResult;
use talos_core::scheduling::{Scheduler, SubsystemId};

use crate::drivers::motor::{MotorConfig, SimulationMotorDriver};

/// Winch behavior constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WinchConfig {
    /// Invert the motor direction so positive power coils the string
    #[serde(default = "default_inverted")]
    pub inverted: bool,
    /// Power applied while winding or unwinding
    #[serde(default = "default_power")]
    pub power: f64,
}

fn default_inverted() -> bool {
    true
}

fn default_power() -> f64 {
    1.0
}

impl Default for WinchConfig {
    fn default() -> Self {
        Self {
            inverted: default_inverted(),
            power: default_power(),
        }
    }
}

/// Shared handle to the winch
pub type SharedWinch = Arc<Mutex<Winch>>;

/// The winch subsystem
pub struct Winch {
    id: SubsystemId,
    config: WinchConfig,
    motor: SimulationMotorDriver,
}

impl Winch {
    /// Create the winch, registering it as a subsystem
    pub fn new(scheduler: &mut Scheduler, config: WinchConfig) -> TalosResult<SharedWinch> {
        let id = scheduler.register_subsystem("winch")?;
        let mut motor = SimulationMotorDriver::with_config(MotorConfig {
            inverted: config.inverted,
            ..Default::default()
        });
        motor.init()?;
        Ok(Arc::new(Mutex::new(Self { id, config, motor })))
    }

    /// The subsystem id commands must require
    pub fn id(&self) -> SubsystemId {
        self.id
    }

    /// Power the winch motor. A positive value coils the string, pulling
    /// the arm down.
    pub fn set_power(&mut self, power: f64) {
        if let Err(e) = self.motor.set_power(power) {
            log::warn!("winch motor rejected power: {}", e);
        }
    }

    /// The last commanded motor power
    pub fn power(&self) -> f64 {
        self.motor.power()
    }

    // Command factories

    /// A command that winds the winch for as long as it is running, then
    /// stops the motor
    pub fn wind_command(this: &SharedWinch) -> RunCommand {
        Self::run_at(this, 1.0, "winch_wind")
    }

    /// A command that unwinds the winch for as long as it is running, then
    /// stops the motor
    pub fn unwind_command(this: &SharedWinch) -> RunCommand {
        Self::run_at(this, -1.0, "winch_unwind")
    }

    fn run_at(this: &SharedWinch, direction: f64, name: &str) -> RunCommand {
        let (id, power) = {
            let winch = this.lock();
            (winch.id, winch.config.power)
        };
        let winch = this.clone();
        let winch_end = this.clone();
        RunCommand::new(move |_| winch.lock().set_power(power * direction))
            .with_on_end(move |_| winch_end.lock().set_power(0.0))
            .with_requirements(vec![id])
            .with_name(name)
    }
}
