//! # TALOS Standard Library
//!
//! Reusable mechanisms built on `talos_core`:
//!
//! ```text
//! talos_library/
//! ── drivers/       # Hardware drivers (simulation backends)
//! ── oi/            # Operator input: action sets and control schemes
//! ── subsystems/    # Drivetrain, arm, winch and their commands
//! ── util.rs        # Small shared helpers
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use talos_core::Scheduler;
//! use talos_library::subsystems::{Drivetrain, DriveConfig};
//! use talos_library::oi::XboxDriver;
//!
//! let mut scheduler = Scheduler::new();
//! let drivetrain = Drivetrain::new(&mut scheduler, DriveConfig::default())?;
//! let id = drivetrain.lock().id();
//! scheduler.set_default_command(id, Box::new(Drivetrain::default_command(&drivetrain)))?;
//! ```

pub mod drivers;
pub mod oi;
pub mod subsystems;
pub mod util;

// Re-export the most commonly used types at the root for convenience
pub use drivers::encoder::{EncoderConfig, SimulationEncoderDriver};
pub use drivers::gamepad::{GamepadConfig, SimulationGamepadDriver};
pub use drivers::motor::{MotorConfig, SimulationMotorDriver};
pub use oi::{XboxDriver, XboxOperator};
pub use subsystems::arm::{Arm, ArmConfig, SharedArm};
pub use subsystems::drivetrain::{DriveConfig, Drivetrain, SharedDrivetrain};
pub use subsystems::winch::{SharedWinch, Winch, WinchConfig};
pub use util::CountdownTimer;
