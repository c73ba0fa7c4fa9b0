//! Server side handle for a single goal

use tokio::sync::watch;

use super::{Action, GoalId, GoalStatus};
use crate::error::{Error, Result};

type Outcome<A> = Option<(GoalStatus, <A as Action>::Result)>;

/// Live reference to an in-flight goal.
///
/// Created by the transport when it accepts a goal and kept until the result
/// expires. The execute callback drives it to a terminal status with
/// [`succeed`](Self::succeed), [`abort`](Self::abort) or
/// [`canceled`](Self::canceled).
pub struct ServerGoalHandle<A: Action> {
    goal_id: GoalId,
    goal: A::Goal,
    status: watch::Sender<GoalStatus>,
    outcome: watch::Sender<Outcome<A>>,
}

impl<A: Action> ServerGoalHandle<A> {
    pub(crate) fn new(goal_id: GoalId, goal: A::Goal) -> Self {
        ServerGoalHandle {
            goal_id,
            goal,
            status: watch::Sender::new(GoalStatus::Accepted),
            outcome: watch::Sender::new(None),
        }
    }

    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }

    pub fn goal(&self) -> &A::Goal {
        &self.goal
    }

    pub fn status(&self) -> GoalStatus {
        *self.status.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// True once a cancellation request for this goal has been accepted
    pub fn is_cancel_requested(&self) -> bool {
        self.status() == GoalStatus::Canceling
    }

    /// Mark the goal as succeeded
    pub fn succeed(&self) -> Result<()> {
        self.transition(GoalStatus::Succeeded)
    }

    /// Mark the goal as aborted
    pub fn abort(&self) -> Result<()> {
        self.transition(GoalStatus::Aborted)
    }

    /// Confirm a requested cancellation
    pub fn canceled(&self) -> Result<()> {
        self.transition(GoalStatus::Canceled)
    }

    pub(crate) fn execute(&self) -> Result<()> {
        self.transition(GoalStatus::Executing)
    }

    pub(crate) fn request_cancel(&self) -> Result<()> {
        self.transition(GoalStatus::Canceling)
    }

    /// Publish the final status together with the result returned by execute
    pub(crate) fn complete(&self, result: A::Result) {
        let status = self.status();
        self.outcome.send_replace(Some((status, result)));
    }

    pub(crate) fn subscribe_status(&self) -> watch::Receiver<GoalStatus> {
        self.status.subscribe()
    }

    pub(crate) fn subscribe_outcome(&self) -> watch::Receiver<Outcome<A>> {
        self.outcome.subscribe()
    }

    fn transition(&self, next: GoalStatus) -> Result<()> {
        let mut outcome = Ok(());
        self.status.send_if_modified(|status| {
            if status.can_transition_to(next) {
                *status = next;
                true
            } else {
                outcome = Err(Error::InvalidTransition {
                    goal_id: self.goal_id,
                    from: *status,
                    to: next,
                });
                false
            }
        });
        outcome
    }
}
