//! Demo robot: wires the standard subsystems, operator input, and the
//! record/replay system into a runnable control loop on the simulation
//! drivers.
//!
//! ```text
//! demo_robot                     # teleop from the synthetic stick pattern
//! demo_robot --auto              # run the scripted autonomous routine
//! demo_robot --record            # record the drive signals while running
//! demo_robot --replay <file>     # drive from a recorded session
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use talos::library::oi::{signals, XboxDriver, XboxOperator};
use talos::library::subsystems::arm::{Arm, ArmConfig};
use talos::library::subsystems::drivetrain::{DriveConfig, Drivetrain};
use talos::library::subsystems::winch::{Winch, WinchConfig};
use talos::library::util::ticks_from_seconds;
use talos::library::{CountdownTimer, SimulationGamepadDriver};
use talos::prelude::*;

/// Match length counted down on the dashboard
const MATCH_SECONDS: f64 = 150.0;

#[derive(Parser)]
#[command(name = "demo_robot", about = "TALOS demo robot on simulation drivers")]
struct Args {
    /// Scheduler config file (TOML or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run before shutting down
    #[arg(long, default_value_t = 250)]
    ticks: u64,

    /// Pace the loop at the configured tick period instead of free-running
    #[arg(long)]
    realtime: bool,

    /// Record the drive signals to a session file
    #[arg(long)]
    record: bool,

    /// Replay drive signals from a recorded session file
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Run the scripted autonomous routine instead of teleop
    #[arg(long)]
    auto: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SchedulerConfig::find_and_load().unwrap_or_default(),
    };

    let dashboard = Dashboard::new().with_sink(Box::new(LogSink));
    let mut scheduler = Scheduler::new()
        .with_config(&config)
        .with_dashboard(dashboard);

    // Subsystems
    let drivetrain = Drivetrain::new(&mut scheduler, DriveConfig::default())?;
    let arm = Arm::new(&mut scheduler, ArmConfig::default())?;
    let winch = Winch::new(&mut scheduler, WinchConfig::default())?;

    let drivetrain_id = drivetrain.lock().id();
    let arm_id = arm.lock().id();
    scheduler.set_default_command(
        drivetrain_id,
        Box::new(Drivetrain::default_command(&drivetrain)),
    )?;
    scheduler.set_default_command(arm_id, Box::new(Arm::default_command(&arm)?))?;

    // Operator input on simulated gamepads; the driver's pad sweeps a
    // synthetic stick pattern so the robot does something visible
    let mut driver_pad = SimulationGamepadDriver::new();
    driver_pad.init()?;
    driver_pad.enable_axis_pattern();
    let mut driver = XboxDriver::new(driver_pad);

    let mut operator_pad = SimulationGamepadDriver::new();
    operator_pad.init()?;
    let mut operator = XboxOperator::new(operator_pad);

    // Replay substitutes recorded drive signals for live driver input
    let replaying = args.replay.is_some();
    if let Some(path) = &args.replay {
        let playback = PlaybackCommand::from_file(path)
            .with_context(|| format!("loading recording from {}", path.display()))?;
        scheduler.schedule(Box::new(playback))?;
        println!("{}", format!("Replaying {}", path.display()).cyan());
    }

    let recorder_output = if args.record {
        let recorder = RecordCommand::new([
            signals::DRIVE_FORWARD,
            signals::DRIVE_TURN,
            signals::DRIVE_SLOW,
        ])
        .with_save(RecordingConfig::from_settings(&config.recording));
        let output = recorder.output();
        scheduler.schedule(Box::new(recorder))?;
        println!("{}", "Recording drive signals".green());
        Some(output)
    } else {
        None
    };

    if args.auto {
        let routine = autonomous_routine(&drivetrain, &arm)?;
        scheduler.schedule(Box::new(routine))?;
        println!("{}", "Autonomous routine scheduled".green());
    }

    let tick_period = scheduler.tick_period();
    let mut countdown = CountdownTimer::new(ticks_from_seconds(MATCH_SECONDS, tick_period));
    countdown.start(scheduler.tick_index());

    // Main periodic loop; the winch runs while the operator holds the
    // d-pad, scheduled on press and cancelled on release
    let mut wind_id: Option<CommandId> = None;
    for _ in 0..args.ticks {
        if !replaying {
            driver.publish(scheduler.signals_mut());
        }
        operator.publish(scheduler.signals_mut());

        let remaining = countdown.remaining(scheduler.tick_index()) as f64;
        if let Some(dashboard) = scheduler.dashboard_mut() {
            dashboard.publish_number(
                "match/time_remaining_s",
                (remaining * tick_period.as_secs_f64()).floor(),
            );
        }

        let wind_held = scheduler.signals().read_bool(signals::WINCH_WIND);
        match (wind_held, wind_id) {
            (true, None) => {
                wind_id = Some(scheduler.schedule(Box::new(Winch::wind_command(&winch)))?);
            }
            (false, Some(id)) => {
                scheduler.cancel(id);
                wind_id = None;
            }
            _ => {}
        }

        scheduler.tick();

        if args.realtime {
            std::thread::sleep(scheduler.tick_period());
        }
    }

    scheduler.cancel_all();

    if let Some(output) = recorder_output {
        if let Some(buffer) = output.lock().as_ref() {
            println!(
                "{}",
                format!("Recorded {} samples", buffer.len()).green()
            );
        }
    }
    println!(
        "Ran {} ticks; drivetrain covered {:.2} m",
        scheduler.tick_index(),
        drivetrain.lock().distance_traveled()
    );
    Ok(())
}

/// The scripted autonomous routine: drive out, hold the arm while nudging
/// forward, then back away - each leg bounded by a timeout in case the
/// encoders fail.
fn autonomous_routine(
    drivetrain: &talos::library::SharedDrivetrain,
    arm: &talos::library::SharedArm,
) -> TalosResult<SequentialGroup> {
    let drive_out = Drivetrain::drive_distance_command(drivetrain, 1.0, 0.6).with_timeout(150);

    let hold_and_nudge = ParallelDeadlineGroup::new(
        Box::new(WaitCommand::new(25)),
        vec![
            Box::new(Arm::hold_position_command(arm)),
            Box::new(Drivetrain::drive_distance_command(drivetrain, 0.2, 0.3)),
        ],
    )?;

    let back_away = Drivetrain::drive_distance_command(drivetrain, -0.5, 0.6).with_timeout(150);

    SequentialGroup::new(vec![
        Box::new(drive_out),
        Box::new(hold_and_nudge),
        Box::new(back_away),
    ])
    .map(|group| group.with_name("demo_auto"))
}
