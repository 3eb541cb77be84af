//! Differential-drive physics
//!
//! One call to [`integrate`] is one simulation tick. Wheel magnitudes in
//! `[-100, 100]` scale linearly to a per-tick displacement of at most
//! `max_speed`. The heading is never wrapped.

use serde::{Deserialize, Serialize};

/// Largest wheel magnitude accepted from programs
pub const MAX_MAGNITUDE: f64 = 100.0;

/// Position, heading (radians) and current wheel magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotPose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub left_magnitude: f64,
    pub right_magnitude: f64,
}

impl RobotPose {
    /// Pose at rest
    pub fn at(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading,
            left_magnitude: 0.0,
            right_magnitude: 0.0,
        }
    }

    pub fn with_magnitudes(self, left: f64, right: f64) -> Self {
        Self {
            left_magnitude: clamp_magnitude(left),
            right_magnitude: clamp_magnitude(right),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Displacement per tick of a wheel at full magnitude
    pub max_speed: f64,
    /// Distance between the wheels
    pub wheel_base: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            wheel_base: 40.0,
        }
    }
}

/// Forward and angular velocity for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelMotion {
    pub forward: f64,
    pub angular: f64,
}

/// Clamp to `[-100, 100]`; NaN means stopped
pub fn clamp_magnitude(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-MAX_MAGNITUDE, MAX_MAGNITUDE)
    }
}

pub fn wheel_motion(left: f64, right: f64, config: &PhysicsConfig) -> WheelMotion {
    let v_left = left / MAX_MAGNITUDE * config.max_speed;
    let v_right = right / MAX_MAGNITUDE * config.max_speed;

    WheelMotion {
        forward: (v_left + v_right) / 2.0,
        angular: (v_right - v_left) / config.wheel_base,
    }
}

/// Advance the pose by one tick using its own wheel magnitudes.
///
/// Translation uses the heading from before the tick.
pub fn integrate(pose: &RobotPose, config: &PhysicsConfig) -> RobotPose {
    let motion = wheel_motion(pose.left_magnitude, pose.right_magnitude, config);

    RobotPose {
        x: pose.x + motion.forward * pose.heading.cos(),
        y: pose.y + motion.forward * pose.heading.sin(),
        heading: pose.heading + motion.angular,
        ..*pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_full_forward() {
        let pose = RobotPose::at(10.0, 20.0, 0.0).with_magnitudes(100.0, 100.0);
        let next = integrate(&pose, &PhysicsConfig::default());

        assert!((next.x - 13.0).abs() < EPSILON);
        assert!((next.y - 20.0).abs() < EPSILON);
        assert_eq!(next.heading, 0.0);
        assert_eq!(next.left_magnitude, 100.0);
    }

    #[test]
    fn test_spin_in_place() {
        let pose = RobotPose::at(5.0, 5.0, 1.0).with_magnitudes(-100.0, 100.0);
        let next = integrate(&pose, &PhysicsConfig::default());

        assert_eq!((next.x, next.y), (5.0, 5.0));
        assert!((next.heading - (1.0 + 6.0 / 40.0)).abs() < EPSILON);
    }

    #[test]
    fn test_forward_follows_heading() {
        let pose = RobotPose::at(0.0, 0.0, FRAC_PI_2).with_magnitudes(50.0, 50.0);
        let next = integrate(&pose, &PhysicsConfig::default());

        assert!(next.x.abs() < EPSILON);
        assert!((next.y - 1.5).abs() < EPSILON);
    }

    #[test]
    fn test_heading_is_not_wrapped() {
        let config = PhysicsConfig::default();
        let mut pose = RobotPose::at(0.0, 0.0, 0.0).with_magnitudes(100.0, -100.0);
        for _ in 0..100 {
            pose = integrate(&pose, &config);
        }
        assert!((pose.heading + 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_magnitude() {
        assert_eq!(clamp_magnitude(250.0), 100.0);
        assert_eq!(clamp_magnitude(-101.0), -100.0);
        assert_eq!(clamp_magnitude(f64::NAN), 0.0);
        assert_eq!(clamp_magnitude(42.5), 42.5);
    }
}
