//! Callbacks that pretend to execute joint trajectories

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::action::{ActionServerCallbacks, CancelResponse, GoalResponse, ServerGoalHandle};
use crate::msg::control_msgs::{
    FollowJointTrajectory, FollowJointTrajectoryGoal, FollowJointTrajectoryResult,
};

/// Accepts every trajectory, reports it successful at once and agrees to
/// every cancellation. Goals are never inspected.
#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    node_name: String,
}

impl ExecutionSimulator {
    pub fn new(node_name: &str) -> Self {
        ExecutionSimulator {
            node_name: node_name.to_string(),
        }
    }
}

#[async_trait]
impl ActionServerCallbacks<FollowJointTrajectory> for ExecutionSimulator {
    fn on_goal_request(&self, _goal: &FollowJointTrajectoryGoal) -> GoalResponse {
        info!(node = %self.node_name, "Received goal request");
        GoalResponse::Accept
    }

    fn on_cancel_request(
        &self,
        goal_handle: &ServerGoalHandle<FollowJointTrajectory>,
    ) -> CancelResponse {
        info!(
            node = %self.node_name,
            goal_id = %goal_handle.goal_id(),
            "Received request to cancel goal"
        );
        CancelResponse::Accept
    }

    async fn on_execute(
        &self,
        goal_handle: Arc<ServerGoalHandle<FollowJointTrajectory>>,
    ) -> FollowJointTrajectoryResult {
        let goal_id = goal_handle.goal_id();
        info!(node = %self.node_name, %goal_id, "Executing goal");

        let result = FollowJointTrajectoryResult::successful();
        if let Err(err) = goal_handle.succeed() {
            warn!(node = %self.node_name, %goal_id, %err, "Could not mark goal succeeded");
        }

        info!(node = %self.node_name, %goal_id, "Goal succeeded");
        result
    }
}
