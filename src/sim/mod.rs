//! Robot simulation
//!
//! - [`physics`]: Differential-drive integrator and [`RobotPose`]
//! - [`sensors`]: Sensor geometry, calibration and the [`Surface`] trait
//! - [`surface`]: In-memory raster course
//! - [`config`]: TOML-loadable [`RobotConfig`]
//!
//! [`Simulation`] ties these to a running program. Each tick refreshes the
//! sensor channels, gives the scheduler its tick and then moves the robot.
//! A completed program leaves the robot standing where it finished. After a
//! fault the last wheel targets stay in effect and physics keeps running.

pub mod config;
pub mod physics;
pub mod sensors;
pub mod surface;

pub use config::{ConfigError, RobotConfig};
pub use physics::{PhysicsConfig, RobotPose};
pub use sensors::{Calibration, Polarity, Rgb, SensorChannel, Surface};
pub use surface::RasterSurface;

use crate::compiler::{compile, CompileError, CompiledProgram};
use crate::interpreter::bindings::{Actuator, RuntimeBindings};
use crate::interpreter::constants::{CHANNEL_COUNT, SLOT_COUNT};
use crate::interpreter::scheduler::{ExecutionState, Scheduler};
use physics::clamp_magnitude;
use std::time::Instant;
use tracing::{debug, info};

/// Wheel targets written by `motor(first, second)`.
///
/// The first argument drives the right wheel and the second the left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelTargets {
    pub left: f64,
    pub right: f64,
}

impl Actuator for WheelTargets {
    fn actuate(&mut self, first: f64, second: f64) {
        self.right = clamp_magnitude(first);
        self.left = clamp_magnitude(second);
    }
}

/// Observable result of one simulation tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub state: ExecutionState,
    pub pose: RobotPose,
    pub sensor_channels: [f64; CHANNEL_COUNT],
}

/// Host loop state: one robot, at most one running program
pub struct Simulation {
    config: RobotConfig,
    start_pose: RobotPose,
    pose: RobotPose,
    sensor_channels: [f64; CHANNEL_COUNT],
    scheduler: Option<Scheduler<WheelTargets>>,
}

impl Simulation {
    pub fn new(config: RobotConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            start_pose: RobotPose::default(),
            pose: RobotPose::default(),
            sensor_channels: [0.0; CHANNEL_COUNT],
            scheduler: None,
        })
    }

    /// Compile `source` and start it from `start_pose`.
    ///
    /// Any previous program is discarded first, so a failed compile leaves
    /// nothing running.
    pub fn start(&mut self, source: &str, start_pose: RobotPose) -> Result<(), CompileError> {
        self.scheduler = None;
        let program = compile(source)?;
        self.start_program(&program, start_pose);
        Ok(())
    }

    /// Start a fresh instance of an already compiled program
    pub fn start_program(&mut self, program: &CompiledProgram, start_pose: RobotPose) {
        self.start_pose = RobotPose::at(start_pose.x, start_pose.y, start_pose.heading);
        self.pose = self.start_pose;
        self.sensor_channels = [0.0; CHANNEL_COUNT];

        let bindings = RuntimeBindings::new(
            [0.0; CHANNEL_COUNT],
            [0.0; SLOT_COUNT],
            WheelTargets::default(),
            self.config.channels,
            1.0,
        );
        let instance = program.instantiate_with_limits(bindings, self.config.limits);
        self.scheduler = Some(Scheduler::new(instance));

        info!(
            x = self.pose.x,
            y = self.pose.y,
            heading = self.pose.heading,
            "simulation started"
        );
    }

    /// Advance one tick: sensors, then the program, then physics
    pub fn tick<S: Surface + ?Sized>(&mut self, now: Instant, surface: &S) -> TickReport {
        self.refresh_sensors(surface);

        let mut completed = false;
        if let Some(scheduler) = self.scheduler.as_mut() {
            completed = *scheduler.tick(now) == ExecutionState::Completed;
            let targets = *scheduler.bindings().actuator();
            self.pose.left_magnitude = targets.left;
            self.pose.right_magnitude = targets.right;
        }

        if completed {
            self.pose.left_magnitude = 0.0;
            self.pose.right_magnitude = 0.0;
        } else {
            self.pose = physics::integrate(&self.pose, &self.config.physics);
        }

        TickReport {
            state: self.state(),
            pose: self.pose,
            sensor_channels: self.sensor_channels,
        }
    }

    /// Update sensor readings without advancing anything else
    pub fn refresh_sensors<S: Surface + ?Sized>(&mut self, surface: &S) {
        sensors::read_channels(
            &self.pose,
            &self.config.sensors,
            &self.config.calibration,
            surface,
            &mut self.sensor_channels,
        );
        if let Some(scheduler) = self.scheduler.as_mut() {
            *scheduler.bindings_mut().sensor_channels_mut() = self.sensor_channels;
        }
    }

    /// Discard the running program and stop the wheels
    pub fn stop(&mut self) {
        if self.scheduler.take().is_some() {
            debug!("program discarded");
        }
        self.pose.left_magnitude = 0.0;
        self.pose.right_magnitude = 0.0;
    }

    /// Stop and put the robot back at its start pose
    pub fn reset(&mut self) {
        self.stop();
        self.pose = self.start_pose;
        self.sensor_channels = [0.0; CHANNEL_COUNT];
    }

    /// `Idle` when no program has been started
    pub fn state(&self) -> ExecutionState {
        self.scheduler
            .as_ref()
            .map_or(ExecutionState::Idle, |s| s.state().clone())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler
            .as_ref()
            .is_some_and(|s| !s.state().is_terminal())
    }

    pub fn pose(&self) -> &RobotPose {
        &self.pose
    }

    /// Move the robot, e.g. while it is being dragged
    pub fn set_pose(&mut self, pose: RobotPose) {
        self.pose = pose;
    }

    pub fn sensor_channels(&self) -> &[f64; CHANNEL_COUNT] {
        &self.sensor_channels
    }

    pub fn variable_slots(&self) -> Option<&[f64; SLOT_COUNT]> {
        self.scheduler.as_ref().map(|s| s.bindings().variable_slots())
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn white(_: f64, _: f64) -> Option<Rgb> {
        Some(Rgb::WHITE)
    }

    #[test]
    fn test_motor_arguments_are_swapped() {
        let mut targets = WheelTargets::default();
        targets.actuate(80.0, -20.0);
        assert_eq!(targets.right, 80.0);
        assert_eq!(targets.left, -20.0);

        targets.actuate(500.0, f64::NAN);
        assert_eq!(targets.right, 100.0);
        assert_eq!(targets.left, 0.0);
    }

    #[test]
    fn test_idle_without_program() {
        let mut sim = Simulation::new(RobotConfig::default()).unwrap();
        let report = sim.tick(Instant::now(), &white);

        assert_eq!(report.state, ExecutionState::Idle);
        assert_eq!(report.pose, RobotPose::default());
        assert!(!sim.is_running());
    }

    #[test]
    fn test_failed_compile_starts_nothing() {
        let mut sim = Simulation::new(RobotConfig::default()).unwrap();
        sim.start("void user_main(void) { motor(100, 100); }", RobotPose::default())
            .unwrap();
        assert!(sim.start("void user_main(void) {", RobotPose::default()).is_err());

        assert_eq!(sim.state(), ExecutionState::Idle);
        assert!(sim.variable_slots().is_none());
    }

    #[test]
    fn test_robot_stops_when_program_completes() {
        let mut sim = Simulation::new(RobotConfig::default()).unwrap();
        let start = RobotPose::at(0.0, 0.0, 0.0);
        sim.start("void user_main(void) { motor(100, 100); }", start).unwrap();
        let t0 = Instant::now();

        let report = sim.tick(t0, &white);
        assert_eq!(report.state, ExecutionState::Completed);
        assert_eq!(report.pose, start);

        for i in 1..100 {
            let report = sim.tick(t0 + Duration::from_millis(16 * i), &white);
            assert_eq!(report.state, ExecutionState::Completed);
        }
        assert_eq!(*sim.pose(), start);
    }

    #[test]
    fn test_robot_moves_until_program_completes() {
        let mut sim = Simulation::new(RobotConfig::default()).unwrap();
        sim.start(
            "void user_main(void) { motor(100, 100); wait_ms(32); }",
            RobotPose::at(0.0, 0.0, 0.0),
        )
        .unwrap();
        let t0 = Instant::now();

        sim.tick(t0, &white);
        sim.tick(t0 + Duration::from_millis(16), &white);
        assert!((sim.pose().x - 6.0).abs() < 1e-12);

        let report = sim.tick(t0 + Duration::from_millis(32), &white);
        assert_eq!(report.state, ExecutionState::Completed);
        assert!((report.pose.x - 6.0).abs() < 1e-12);
        assert_eq!(report.pose.left_magnitude, 0.0);

        sim.tick(t0 + Duration::from_millis(48), &white);
        assert!((sim.pose().x - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_stop_and_reset() {
        let mut sim = Simulation::new(RobotConfig::default()).unwrap();
        let start = RobotPose::at(10.0, 10.0, 0.5);
        sim.start("void user_main(void) { while (TRUE) { motor(60, 20); } }", start)
            .unwrap();
        let t0 = Instant::now();
        sim.tick(t0, &white);
        sim.tick(t0, &white);
        assert_ne!(*sim.pose(), start);

        sim.stop();
        let stopped = *sim.pose();
        sim.tick(t0, &white);
        assert_eq!((sim.pose().x, sim.pose().y), (stopped.x, stopped.y));

        sim.reset();
        assert_eq!(*sim.pose(), start);
    }

    #[test]
    fn test_sensors_feed_program() {
        let mut sim = Simulation::new(RobotConfig::default()).unwrap();
        sim.start(
            "void user_main(void) { while (TRUE) { gV[VAR_A] = gAD[CN2]; } }",
            RobotPose::at(50.0, 50.0, 0.0),
        )
        .unwrap();
        let black = |_: f64, _: f64| Some(Rgb::BLACK);
        let t0 = Instant::now();

        let report = sim.tick(t0, &black);
        assert_eq!(report.sensor_channels[2], 1023.0);

        sim.tick(t0, &black);
        assert_eq!(sim.variable_slots().unwrap()[0], 1023.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = RobotConfig::default();
        config.physics.wheel_base = -1.0;
        assert!(Simulation::new(config).is_err());
    }
}
