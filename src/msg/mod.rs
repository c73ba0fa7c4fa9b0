//! Message and action types exchanged with trajectory clients
//!
//! Field names and layouts follow the ROS 2 interface packages they mirror so
//! goals captured from a live system can be replayed as JSON or YAML.

pub mod control_msgs;

/// Types from `builtin_interfaces`
pub mod builtin_interfaces {
    use serde::{Deserialize, Serialize};

    /// A point in time
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Time {
        pub sec: i32,
        pub nanosec: u32,
    }

    /// A signed span of time
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Duration {
        pub sec: i32,
        pub nanosec: u32,
    }

    impl Duration {
        pub fn from_secs_f64(seconds: f64) -> Self {
            let nanos = (seconds * 1e9).round() as i64;
            Duration {
                sec: nanos.div_euclid(1_000_000_000) as i32,
                nanosec: nanos.rem_euclid(1_000_000_000) as u32,
            }
        }

        pub fn as_secs_f64(&self) -> f64 {
            f64::from(self.sec) + f64::from(self.nanosec) * 1e-9
        }
    }
}

/// Types from `std_msgs`
pub mod std_msgs {
    use serde::{Deserialize, Serialize};

    use super::builtin_interfaces::Time;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Header {
        pub stamp: Time,
        pub frame_id: String,
    }
}

/// Types from `trajectory_msgs`
pub mod trajectory_msgs {
    use serde::{Deserialize, Serialize};

    use super::builtin_interfaces::Duration;
    use super::std_msgs::Header;

    /// A time-ordered sequence of joint targets
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct JointTrajectory {
        pub header: Header,
        pub joint_names: Vec<String>,
        pub points: Vec<JointTrajectoryPoint>,
    }

    /// Targets for every joint at one instant, relative to the trajectory start
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct JointTrajectoryPoint {
        pub positions: Vec<f64>,
        pub velocities: Vec<f64>,
        pub accelerations: Vec<f64>,
        pub effort: Vec<f64>,
        pub time_from_start: Duration,
    }
}

#[cfg(test)]
mod tests {
    use super::builtin_interfaces::Duration;

    #[test]
    fn duration_converts_fractional_seconds() {
        let duration = Duration::from_secs_f64(1.25);
        assert_eq!(duration, Duration { sec: 1, nanosec: 250_000_000 });
        assert!((duration.as_secs_f64() - 1.25).abs() < 1e-9);
    }
}
