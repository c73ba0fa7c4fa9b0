//! `control_msgs` types, including the `FollowJointTrajectory` action

use serde::{Deserialize, Serialize};

use super::builtin_interfaces::Duration;
use super::trajectory_msgs::JointTrajectory;
use crate::action::Action;

/// Allowed deviation for a single joint; zero means the controller default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JointTolerance {
    pub name: String,
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

/// Goal of a `FollowJointTrajectory` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowJointTrajectoryGoal {
    pub trajectory: JointTrajectory,
    pub path_tolerance: Vec<JointTolerance>,
    pub goal_tolerance: Vec<JointTolerance>,
    pub goal_time_tolerance: Duration,
}

/// Result of a `FollowJointTrajectory` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowJointTrajectoryResult {
    pub error_code: i32,
    pub error_string: String,
}

impl FollowJointTrajectoryResult {
    pub const SUCCESSFUL: i32 = 0;
    pub const INVALID_GOAL: i32 = -1;
    pub const INVALID_JOINTS: i32 = -2;
    pub const OLD_HEADER_TIMESTAMP: i32 = -3;
    pub const PATH_TOLERANCE_VIOLATED: i32 = -4;
    pub const GOAL_TOLERANCE_VIOLATED: i32 = -5;

    pub fn successful() -> Self {
        FollowJointTrajectoryResult {
            error_code: Self::SUCCESSFUL,
            error_string: String::new(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error_code == Self::SUCCESSFUL
    }
}

/// The `control_msgs/action/FollowJointTrajectory` action
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowJointTrajectory;

impl Action for FollowJointTrajectory {
    type Goal = FollowJointTrajectoryGoal;
    type Result = FollowJointTrajectoryResult;

    const TYPE_NAME: &'static str = "control_msgs/action/FollowJointTrajectory";
}
