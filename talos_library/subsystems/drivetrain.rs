//! The drivetrain subsystem
//!
//! Differential drive: all motors on each side are chained together, and
//! turning applies more power to one side than the other. Encoders report
//! distance so autonomous routines can drive by the metre.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use talos_core::command::{Command, RunCommand, TickContext};
use talos_core::error::TalosResult;
use talos_core::scheduling::{Scheduler, SubsystemId};

use crate::drivers::encoder::{EncoderConfig, SimulationEncoderDriver};
use crate::drivers::motor::{MotorConfig, SimulationMotorDriver};
use crate::oi::signals;

/// Drive behavior constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Forward speed multiplier while the slow modifier is held
    #[serde(default = "default_slow_drive")]
    pub slow_drive_factor: f64,
    /// Turn speed multiplier while the slow modifier is held
    #[serde(default = "default_slow_turn")]
    pub slow_turn_factor: f64,
    /// Whether the left motor bank is inverted
    #[serde(default = "default_left_inverted")]
    pub left_inverted: bool,
    /// Whether the right motor bank is inverted
    #[serde(default)]
    pub right_inverted: bool,
    /// Simulated distance covered in one tick at full power, in metres
    #[serde(default = "default_metres_per_tick")]
    pub metres_per_tick: f64,
}

fn default_slow_drive() -> f64 {
    0.5
}

fn default_slow_turn() -> f64 {
    0.6
}

fn default_left_inverted() -> bool {
    true
}

fn default_metres_per_tick() -> f64 {
    0.05
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            slow_drive_factor: default_slow_drive(),
            slow_turn_factor: default_slow_turn(),
            left_inverted: default_left_inverted(),
            right_inverted: false,
            metres_per_tick: default_metres_per_tick(),
        }
    }
}

/// Shared handle to the drivetrain, as held by commands and dashboards
pub type SharedDrivetrain = Arc<Mutex<Drivetrain>>;

/// The drivetrain subsystem: drive motors and encoders, plus the commands
/// that interact with them. One instance per robot.
pub struct Drivetrain {
    id: SubsystemId,
    config: DriveConfig,
    left_motors: SimulationMotorDriver,
    right_motors: SimulationMotorDriver,
    left_encoder: SimulationEncoderDriver,
    right_encoder: SimulationEncoderDriver,
}

impl Drivetrain {
    /// Create the drivetrain, registering it as a subsystem and publishing
    /// its dashboard values
    pub fn new(scheduler: &mut Scheduler, config: DriveConfig) -> TalosResult<SharedDrivetrain> {
        let id = scheduler.register_subsystem("drivetrain")?;

        let mut left_motors = SimulationMotorDriver::with_config(MotorConfig {
            inverted: config.left_inverted,
            ..Default::default()
        });
        let mut right_motors = SimulationMotorDriver::with_config(MotorConfig {
            inverted: config.right_inverted,
            ..Default::default()
        });
        left_motors.init()?;
        right_motors.init()?;

        // Encoders count in the motor direction
        let mut left_encoder = SimulationEncoderDriver::with_config(EncoderConfig {
            metres_per_tick: config.metres_per_tick,
            inverted: false,
        });
        let mut right_encoder = SimulationEncoderDriver::with_config(EncoderConfig {
            metres_per_tick: config.metres_per_tick,
            inverted: false,
        });
        left_encoder.init()?;
        right_encoder.init()?;

        let drivetrain = Arc::new(Mutex::new(Self {
            id,
            config,
            left_motors,
            right_motors,
            left_encoder,
            right_encoder,
        }));

        if let Some(dashboard) = scheduler.dashboard_mut() {
            let dt = drivetrain.clone();
            dashboard.add_number("drivetrain/distance", move || dt.lock().distance_traveled());
            let dt = drivetrain.clone();
            dashboard.add_number("drivetrain/left_velocity", move || {
                dt.lock().left_encoder.velocity()
            });
            let dt = drivetrain.clone();
            dashboard.add_number("drivetrain/right_velocity", move || {
                dt.lock().right_encoder.velocity()
            });
        }

        Ok(drivetrain)
    }

    /// The subsystem id commands must require
    pub fn id(&self) -> SubsystemId {
        self.id
    }

    /// Drive with joystick-style controls
    ///
    /// `forward` moves along the Y axis and `rotation` turns around the Z
    /// axis, both from -1 to 1.
    pub fn arcade_drive(&mut self, forward: f64, rotation: f64) {
        let forward = forward.clamp(-1.0, 1.0);
        let rotation = rotation.clamp(-1.0, 1.0);
        let left = (forward + rotation).clamp(-1.0, 1.0);
        let right = (forward - rotation).clamp(-1.0, 1.0);

        if let Err(e) = self.left_motors.set_power(left) {
            log::warn!("drivetrain left motors rejected power: {}", e);
        }
        if let Err(e) = self.right_motors.set_power(right) {
            log::warn!("drivetrain right motors rejected power: {}", e);
        }
        self.left_encoder.update(left);
        self.right_encoder.update(right);
    }

    /// Stop the drive motors
    pub fn stop(&mut self) {
        self.left_motors.stop();
        self.right_motors.stop();
        self.left_encoder.update(0.0);
        self.right_encoder.update(0.0);
    }

    /// Reset the encoders' recorded position to zero
    pub fn zero_encoders(&mut self) {
        self.left_encoder.reset();
        self.right_encoder.reset();
    }

    /// The average distance travelled by the robot's wheels in metres
    pub fn distance_traveled(&self) -> f64 {
        (self.left_encoder.position() + self.right_encoder.position()) / 2.0
    }

    // Command factories

    /// A command that drives the robot from the published drive signals,
    /// for use as the drivetrain's default command. Holding the slow
    /// modifier scales both axes down; the motors stop when the command
    /// ends.
    pub fn default_command(this: &SharedDrivetrain) -> RunCommand {
        let id = this.lock().id;
        let dt = this.clone();
        let dt_end = this.clone();
        RunCommand::new(move |ctx: &mut TickContext| {
            let mut drivetrain = dt.lock();
            let (drive_factor, turn_factor) = if ctx.signal_bool(signals::DRIVE_SLOW) {
                (
                    drivetrain.config.slow_drive_factor,
                    drivetrain.config.slow_turn_factor,
                )
            } else {
                (1.0, 1.0)
            };
            let forward = ctx.signal(signals::DRIVE_FORWARD) * drive_factor;
            let turn = ctx.signal(signals::DRIVE_TURN) * turn_factor;
            drivetrain.arcade_drive(forward, turn);
        })
        .with_on_end(move |_| dt_end.lock().stop())
        .with_requirements(vec![id])
        .with_name("drive_teleop")
    }

    /// A command that drives a fixed distance at a fixed speed, finishing
    /// once the encoders report the distance covered
    pub fn drive_distance_command(
        this: &SharedDrivetrain,
        distance_metres: f64,
        speed: f64,
    ) -> DriveDistanceCommand {
        DriveDistanceCommand::new(this.clone(), distance_metres, speed)
    }
}

/// Drives straight for a fixed distance, measured by the encoders
pub struct DriveDistanceCommand {
    drivetrain: SharedDrivetrain,
    distance_metres: f64,
    speed: f64,
    requirements: Vec<SubsystemId>,
}

impl DriveDistanceCommand {
    pub fn new(drivetrain: SharedDrivetrain, distance_metres: f64, speed: f64) -> Self {
        let requirements = vec![drivetrain.lock().id];
        Self {
            drivetrain,
            distance_metres,
            speed,
            requirements,
        }
    }
}

impl Command for DriveDistanceCommand {
    fn name(&self) -> &str {
        "drive_distance"
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self, _ctx: &mut TickContext) {
        self.drivetrain.lock().zero_encoders();
    }

    fn execute(&mut self, _ctx: &mut TickContext) {
        let forward = self.speed.abs() * self.distance_metres.signum();
        self.drivetrain.lock().arcade_drive(forward, 0.0);
    }

    fn is_finished(&self, _ctx: &TickContext) -> bool {
        self.drivetrain.lock().distance_traveled().abs() >= self.distance_metres.abs()
    }

    fn end(&mut self, _ctx: &mut TickContext, _interrupted: bool) {
        self.drivetrain.lock().stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use talos_core::command::CommandExt;

    fn make(scheduler: &mut Scheduler) -> SharedDrivetrain {
        Drivetrain::new(scheduler, DriveConfig::default()).unwrap()
    }

    #[test]
    fn test_arcade_drive_mixing() {
        let mut scheduler = Scheduler::new();
        let drivetrain = make(&mut scheduler);
        let mut dt = drivetrain.lock();

        dt.arcade_drive(1.0, 0.0);
        assert_relative_eq!(dt.left_motors.power(), 1.0);
        assert_relative_eq!(dt.right_motors.power(), 1.0);

        dt.arcade_drive(0.0, 1.0);
        assert_relative_eq!(dt.left_motors.power(), 1.0);
        assert_relative_eq!(dt.right_motors.power(), -1.0);

        dt.stop();
        assert_relative_eq!(dt.left_motors.power(), 0.0);
    }

    #[test]
    fn test_distance_averages_encoders() {
        let mut scheduler = Scheduler::new();
        let drivetrain = make(&mut scheduler);
        let mut dt = drivetrain.lock();

        dt.arcade_drive(1.0, 0.0);
        dt.arcade_drive(1.0, 0.0);
        assert_relative_eq!(dt.distance_traveled(), 0.1);

        dt.zero_encoders();
        assert_relative_eq!(dt.distance_traveled(), 0.0);
    }

    #[test]
    fn test_default_command_follows_signals() {
        let mut scheduler = Scheduler::new();
        let drivetrain = make(&mut scheduler);
        let id = drivetrain.lock().id();
        scheduler
            .set_default_command(id, Box::new(Drivetrain::default_command(&drivetrain)))
            .unwrap();

        scheduler.signals_mut().write(signals::DRIVE_FORWARD, 0.8);
        scheduler.signals_mut().write(signals::DRIVE_TURN, 0.0);
        scheduler.tick();
        assert_relative_eq!(drivetrain.lock().left_motors.power(), 0.8);

        // Slow modifier scales the axes down
        scheduler.signals_mut().write_bool(signals::DRIVE_SLOW, true);
        scheduler.tick();
        assert_relative_eq!(drivetrain.lock().left_motors.power(), 0.4);
    }

    #[test]
    fn test_drive_distance_finishes_and_stops() {
        let mut scheduler = Scheduler::new();
        let drivetrain = make(&mut scheduler);

        // 0.2 m at full power is four ticks at the default 0.05 m/tick
        let id = scheduler
            .schedule(Box::new(Drivetrain::drive_distance_command(
                &drivetrain,
                0.2,
                1.0,
            )))
            .unwrap();

        for _ in 0..4 {
            scheduler.tick();
            assert!(scheduler.is_scheduled(id));
        }
        scheduler.tick();
        assert!(!scheduler.is_scheduled(id));
        assert_relative_eq!(drivetrain.lock().left_motors.power(), 0.0);
        assert_relative_eq!(drivetrain.lock().distance_traveled(), 0.2);
    }

    #[test]
    fn test_drive_distance_backwards() {
        let mut scheduler = Scheduler::new();
        let drivetrain = make(&mut scheduler);

        let id = scheduler
            .schedule(Box::new(Drivetrain::drive_distance_command(
                &drivetrain,
                -0.1,
                0.5,
            )))
            .unwrap();
        for _ in 0..8 {
            scheduler.tick();
        }
        assert!(!scheduler.is_scheduled(id));
        assert!(drivetrain.lock().distance_traveled() <= -0.1);
    }

    #[test]
    fn test_drive_distance_with_timeout_cuts_off() {
        let mut scheduler = Scheduler::new();
        let drivetrain = make(&mut scheduler);

        // Far further than two ticks can cover; the timeout ends it
        let command =
            Drivetrain::drive_distance_command(&drivetrain, 100.0, 1.0).with_timeout(2);
        let id = scheduler.schedule(Box::new(command)).unwrap();

        for _ in 0..3 {
            scheduler.tick();
        }
        assert!(!scheduler.is_scheduled(id));
        assert_relative_eq!(drivetrain.lock().left_motors.power(), 0.0);
    }
}
