//! Action protocol: goal, cancel and execute callbacks over an in-process transport
//!
//! An action is a long running, cancellable request. A server decides whether
//! to accept each goal, runs accepted goals to a terminal status and answers
//! cancellation requests. The transport here keeps the same contract as the
//! ROS 2 action layer without leaving the process.

pub mod client;
pub mod goal_handle;
pub mod server;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

pub use self::client::{ActionClient, ClientGoalHandle};
pub use self::goal_handle::ServerGoalHandle;
pub use self::server::{ActionServer, ActionServerOptions};

/// An action type: the request a client sends and the result it gets back
pub trait Action: Send + Sync + 'static {
    type Goal: Clone + fmt::Debug + Send + Sync + 'static;
    type Result: Clone + fmt::Debug + Send + Sync + 'static;

    /// Fully qualified interface name, e.g. `control_msgs/action/FollowJointTrajectory`
    const TYPE_NAME: &'static str;
}

/// Decision on an incoming goal request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalResponse {
    Reject,
    Accept,
}

/// Decision on an incoming cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelResponse {
    Reject,
    Accept,
}

/// Unique identifier assigned to every goal the transport receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalId(Uuid);

impl GoalId {
    pub fn new() -> Self {
        GoalId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GoalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Status of a goal, numbered as in `action_msgs/msg/GoalStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum GoalStatus {
    Unknown = 0,
    Accepted = 1,
    Executing = 2,
    Canceling = 3,
    Succeeded = 4,
    Canceled = 5,
    Aborted = 6,
}

impl GoalStatus {
    /// Succeeded, canceled and aborted goals never change again
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GoalStatus::Succeeded | GoalStatus::Canceled | GoalStatus::Aborted
        )
    }

    pub fn is_active(self) -> bool {
        matches!(
            self,
            GoalStatus::Accepted | GoalStatus::Executing | GoalStatus::Canceling
        )
    }

    /// Transitions allowed by the action goal state machine
    pub fn can_transition_to(self, next: GoalStatus) -> bool {
        use GoalStatus::*;

        matches!(
            (self, next),
            (Accepted, Executing)
                | (Accepted, Canceling)
                | (Executing, Canceling)
                | (Executing, Succeeded)
                | (Executing, Aborted)
                | (Canceling, Succeeded)
                | (Canceling, Aborted)
                | (Canceling, Canceled)
        )
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GoalStatus::Unknown => "unknown",
            GoalStatus::Accepted => "accepted",
            GoalStatus::Executing => "executing",
            GoalStatus::Canceling => "canceling",
            GoalStatus::Succeeded => "succeeded",
            GoalStatus::Canceled => "canceled",
            GoalStatus::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Callbacks an action server is built from.
///
/// `on_goal_request` always runs before `on_execute` for the same goal. Each
/// accepted goal gets its own task, so `on_execute` may suspend without
/// holding up other goals.
#[async_trait]
pub trait ActionServerCallbacks<A: Action>: Send + Sync + 'static {
    /// Decide whether to accept a new goal
    fn on_goal_request(&self, goal: &A::Goal) -> GoalResponse;

    /// Decide whether to cancel a goal the server knows about
    fn on_cancel_request(&self, goal_handle: &ServerGoalHandle<A>) -> CancelResponse;

    /// Run an accepted goal and produce its result
    async fn on_execute(&self, goal_handle: Arc<ServerGoalHandle<A>>) -> A::Result;
}
