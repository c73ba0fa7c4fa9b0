//! Action client: sends goals to whichever server owns a name

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use tokio::sync::watch;

use super::server::ServerCore;
use super::{Action, CancelResponse, GoalId, GoalStatus};
use crate::error::{Error, Result};
use crate::node::ActionRegistry;

/// Client bound to an action name.
///
/// The name is resolved on every request, so a client may be created before
/// its server exists.
pub struct ActionClient<A: Action> {
    action_name: String,
    registry: Arc<ActionRegistry>,
    _action: PhantomData<fn() -> A>,
}

impl<A: Action> ActionClient<A> {
    pub(crate) fn new(registry: Arc<ActionRegistry>, action_name: String) -> Self {
        ActionClient {
            action_name,
            registry,
            _action: PhantomData,
        }
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Whether a server of the right type is registered under the name
    pub fn server_is_ready(&self) -> bool {
        self.server().is_ok()
    }

    /// Send a goal; fails when no server is reachable or the goal is rejected
    pub async fn send_goal(&self, goal: A::Goal) -> Result<ClientGoalHandle<A>> {
        let server = self.server()?;
        let handle = server.handle_goal_request(goal)?;

        Ok(ClientGoalHandle {
            goal_id: handle.goal_id(),
            action_name: self.action_name.clone(),
            server: Arc::downgrade(&server),
            status: handle.subscribe_status(),
            outcome: handle.subscribe_outcome(),
        })
    }

    /// Request cancellation of a goal by id
    pub async fn cancel_goal(&self, goal_id: GoalId) -> Result<CancelResponse> {
        self.server()?.handle_cancel_request(goal_id)
    }

    fn server(&self) -> Result<Arc<ServerCore<A>>> {
        let entry = self
            .registry
            .lookup(&self.action_name)
            .ok_or_else(|| Error::ServerUnavailable(self.action_name.clone()))?;

        entry
            .downcast::<ServerCore<A>>()
            .map_err(|_| Error::ActionTypeMismatch {
                name: self.action_name.clone(),
                expected: A::TYPE_NAME,
            })
    }
}

/// Client side view of an accepted goal
pub struct ClientGoalHandle<A: Action> {
    goal_id: GoalId,
    action_name: String,
    server: Weak<ServerCore<A>>,
    status: watch::Receiver<GoalStatus>,
    outcome: watch::Receiver<Option<(GoalStatus, A::Result)>>,
}

impl<A: Action> ClientGoalHandle<A> {
    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }

    /// Most recent status reported by the server
    pub fn status(&self) -> GoalStatus {
        *self.status.borrow()
    }

    /// Wait for the goal to finish and return its terminal status and result
    pub async fn get_result(&self) -> Result<(GoalStatus, A::Result)> {
        let mut outcome = self.outcome.clone();
        let finished = outcome
            .wait_for(Option::is_some)
            .await
            .map_err(|_| Error::ServerShutdown(self.action_name.clone()))?;

        finished
            .clone()
            .ok_or_else(|| Error::ServerShutdown(self.action_name.clone()))
    }

    /// Ask the server that accepted this goal to cancel it
    pub async fn cancel(&self) -> Result<CancelResponse> {
        let server = self
            .server
            .upgrade()
            .ok_or_else(|| Error::ServerUnavailable(self.action_name.clone()))?;
        server.handle_cancel_request(self.goal_id)
    }
}
