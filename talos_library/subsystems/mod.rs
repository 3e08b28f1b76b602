//! Robot subsystems
//!
//! Each subsystem owns its drivers, registers itself as one schedulable
//! resource domain, and exposes command factories the way application code
//! expects to consume them. Subsystem instances are shared behind
//! `Arc<Mutex<_>>` so command closures and dashboard providers can reach
//! them from anywhere.

pub mod arm;
pub mod drivetrain;
pub mod winch;
