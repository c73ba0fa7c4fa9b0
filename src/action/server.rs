//! Action server: owns the callbacks and the goals accepted under one name

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use super::{
    Action, ActionServerCallbacks, CancelResponse, GoalId, GoalResponse, GoalStatus,
    ServerGoalHandle,
};
use crate::error::{Error, Result};
use crate::node::ActionRegistry;

/// Tunables for an action server
#[derive(Debug, Clone)]
pub struct ActionServerOptions {
    /// How long a finished goal stays queryable (results and cancel requests)
    pub result_timeout: Duration,
}

impl Default for ActionServerOptions {
    fn default() -> Self {
        ActionServerOptions {
            result_timeout: Duration::from_secs(15 * 60),
        }
    }
}

/// Shared state reachable from clients through the registry
pub(crate) struct ServerCore<A: Action> {
    action_name: String,
    node_name: String,
    callbacks: Arc<dyn ActionServerCallbacks<A>>,
    goals: Mutex<HashMap<GoalId, Arc<ServerGoalHandle<A>>>>,
    options: ActionServerOptions,
}

impl<A: Action> ServerCore<A> {
    pub(crate) fn action_name(&self) -> &str {
        &self.action_name
    }

    /// Ask the callbacks about a new goal and start executing it when accepted
    pub(crate) fn handle_goal_request(
        self: &Arc<Self>,
        goal: A::Goal,
    ) -> Result<Arc<ServerGoalHandle<A>>> {
        if self.callbacks.on_goal_request(&goal) == GoalResponse::Reject {
            debug!(node = %self.node_name, action = %self.action_name, "Goal rejected");
            return Err(Error::GoalRejected(self.action_name.clone()));
        }

        let handle = Arc::new(ServerGoalHandle::new(GoalId::new(), goal));
        debug!(
            node = %self.node_name,
            action = %self.action_name,
            goal_id = %handle.goal_id(),
            "Goal accepted"
        );
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.goal_id(), Arc::clone(&handle));
        self.spawn_execute(Arc::clone(&handle));

        Ok(handle)
    }

    /// Consult the cancel callback for any goal still held by the server
    pub(crate) fn handle_cancel_request(&self, goal_id: GoalId) -> Result<CancelResponse> {
        let handle = self.goal(goal_id).ok_or(Error::UnknownGoal(goal_id))?;

        let response = self.callbacks.on_cancel_request(&handle);
        if response == CancelResponse::Accept {
            // A finished goal keeps its terminal status; the cancel is only acknowledged.
            if let Err(err) = handle.request_cancel() {
                debug!(
                    node = %self.node_name,
                    %goal_id,
                    %err,
                    "Cancel acknowledged without effect"
                );
            }
        }
        Ok(response)
    }

    pub(crate) fn goal(&self, goal_id: GoalId) -> Option<Arc<ServerGoalHandle<A>>> {
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&goal_id)
            .cloned()
    }

    fn spawn_execute(self: &Arc<Self>, handle: Arc<ServerGoalHandle<A>>) {
        let callbacks = Arc::clone(&self.callbacks);
        let core: Weak<Self> = Arc::downgrade(self);
        let node_name = self.node_name.clone();
        let result_timeout = self.options.result_timeout;

        tokio::spawn(async move {
            let goal_id = handle.goal_id();

            // A goal canceled before its task started goes straight to execute in Canceling.
            if handle.status() == GoalStatus::Accepted {
                if let Err(err) = handle.execute() {
                    debug!(node = %node_name, %goal_id, %err, "Goal left accepted state early");
                }
            }

            let result = callbacks.on_execute(Arc::clone(&handle)).await;

            if handle.is_active() {
                warn!(node = %node_name, %goal_id, "Goal state not set, assuming aborted");
                if let Err(err) = handle.abort() {
                    warn!(node = %node_name, %goal_id, %err, "Failed to abort goal");
                }
            }
            handle.complete(result);
            drop(handle);
            drop(callbacks);

            tokio::time::sleep(result_timeout).await;
            if let Some(core) = core.upgrade() {
                core.goals
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&goal_id);
                debug!(node = %node_name, %goal_id, "Expired goal result");
            }
        });
    }
}

/// Handle owning a registered action server.
///
/// The name stays registered until [`shutdown`](Self::shutdown) is called or
/// the handle is dropped.
pub struct ActionServer<A: Action> {
    core: Arc<ServerCore<A>>,
    registry: Arc<ActionRegistry>,
    registered: bool,
}

impl<A: Action> ActionServer<A> {
    pub(crate) fn register(
        registry: Arc<ActionRegistry>,
        node_name: &str,
        action_name: String,
        callbacks: Arc<dyn ActionServerCallbacks<A>>,
        options: ActionServerOptions,
    ) -> Result<Self> {
        let core = Arc::new(ServerCore {
            action_name,
            node_name: node_name.to_string(),
            callbacks,
            goals: Mutex::new(HashMap::new()),
            options,
        });
        let entry: Arc<dyn Any + Send + Sync> = core.clone();
        registry.register(&core.action_name, entry)?;
        debug!(
            node = %node_name,
            action = %core.action_name,
            type_name = A::TYPE_NAME,
            "Registered action server"
        );

        Ok(ActionServer {
            core,
            registry,
            registered: true,
        })
    }

    /// Fully resolved name the server is reachable under
    pub fn action_name(&self) -> &str {
        self.core.action_name()
    }

    pub fn goal_status(&self, goal_id: GoalId) -> Option<GoalStatus> {
        self.core.goal(goal_id).map(|handle| handle.status())
    }

    /// Stop serving; clients can no longer reach this server by name
    pub fn shutdown(&mut self) {
        if self.registered {
            self.registry
                .unregister(self.action_name(), Arc::as_ptr(&self.core) as *const ());
            self.registered = false;
            debug!(action = %self.core.action_name, "Unregistered action server");
        }
    }
}

impl<A: Action> Drop for ActionServer<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::node::{Context, Node, ParameterOverrides};

    struct Doubler;

    impl Action for Doubler {
        type Goal = u32;
        type Result = u32;
        const TYPE_NAME: &'static str = "test_msgs/action/Doubler";
    }

    struct Echo;

    impl Action for Echo {
        type Goal = String;
        type Result = String;
        const TYPE_NAME: &'static str = "test_msgs/action/Echo";
    }

    /// Accepts even goals only, refuses cancels and never sets a terminal status
    struct EvenOnly;

    #[async_trait]
    impl ActionServerCallbacks<Doubler> for EvenOnly {
        fn on_goal_request(&self, goal: &u32) -> GoalResponse {
            if goal % 2 == 0 {
                GoalResponse::Accept
            } else {
                GoalResponse::Reject
            }
        }

        fn on_cancel_request(&self, _goal_handle: &ServerGoalHandle<Doubler>) -> CancelResponse {
            CancelResponse::Reject
        }

        async fn on_execute(&self, goal_handle: Arc<ServerGoalHandle<Doubler>>) -> u32 {
            goal_handle.goal() * 2
        }
    }

    /// Keeps a marker alive for as long as anything holds the callbacks
    struct Tracked {
        _marker: Arc<()>,
    }

    #[async_trait]
    impl ActionServerCallbacks<Doubler> for Tracked {
        fn on_goal_request(&self, _goal: &u32) -> GoalResponse {
            GoalResponse::Accept
        }

        fn on_cancel_request(&self, _goal_handle: &ServerGoalHandle<Doubler>) -> CancelResponse {
            CancelResponse::Accept
        }

        async fn on_execute(&self, goal_handle: Arc<ServerGoalHandle<Doubler>>) -> u32 {
            goal_handle.succeed().unwrap();
            *goal_handle.goal()
        }
    }

    fn node() -> Node {
        Context::new()
            .create_node("transport_test", ParameterOverrides::default())
            .unwrap()
    }

    #[tokio::test]
    async fn rejected_goal_is_reported_to_client() {
        let node = node();
        let _server = node.create_action_server::<Doubler, _>("doubler", EvenOnly).unwrap();
        let client = node.create_action_client::<Doubler>("doubler").unwrap();

        assert!(matches!(
            client.send_goal(3).await,
            Err(Error::GoalRejected(name)) if name == "/doubler"
        ));
    }

    #[tokio::test]
    async fn goal_without_terminal_status_is_aborted() {
        let node = node();
        let _server = node.create_action_server::<Doubler, _>("doubler", EvenOnly).unwrap();
        let client = node.create_action_client::<Doubler>("doubler").unwrap();

        let handle = client.send_goal(4).await.unwrap();
        assert_eq!(handle.get_result().await.unwrap(), (GoalStatus::Aborted, 8));
    }

    #[tokio::test]
    async fn rejected_cancel_leaves_goal_untouched() {
        let node = node();
        let server = node.create_action_server::<Doubler, _>("doubler", EvenOnly).unwrap();
        let client = node.create_action_client::<Doubler>("doubler").unwrap();

        let handle = client.send_goal(2).await.unwrap();
        assert_eq!(handle.cancel().await.unwrap(), CancelResponse::Reject);
        assert_eq!(server.goal_status(handle.goal_id()), Some(GoalStatus::Accepted));
    }

    #[tokio::test]
    async fn client_of_another_action_type_is_refused() {
        let node = node();
        let _server = node.create_action_server::<Doubler, _>("doubler", EvenOnly).unwrap();
        let client = node.create_action_client::<Echo>("/doubler").unwrap();

        assert!(!client.server_is_ready());
        assert!(matches!(
            client.send_goal("hello".to_string()).await,
            Err(Error::ActionTypeMismatch { expected: "test_msgs/action/Echo", .. })
        ));
    }

    #[tokio::test]
    async fn finished_goals_expire_after_result_timeout() {
        let node = node();
        let options = ActionServerOptions {
            result_timeout: Duration::from_millis(1),
        };
        let server = node
            .create_action_server_with_options::<Doubler, _>("doubler", EvenOnly, options)
            .unwrap();
        let client = node.create_action_client::<Doubler>("doubler").unwrap();

        let handle = client.send_goal(6).await.unwrap();
        handle.get_result().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(server.goal_status(handle.goal_id()), None);
        assert!(matches!(
            handle.cancel().await,
            Err(Error::UnknownGoal(id)) if id == handle.goal_id()
        ));
    }

    #[tokio::test]
    async fn shutdown_releases_callbacks_while_results_are_retained() {
        let node = node();
        let marker = Arc::new(());
        let mut server = node
            .create_action_server::<Doubler, _>(
                "tracked",
                Tracked {
                    _marker: Arc::clone(&marker),
                },
            )
            .unwrap();
        let client = node.create_action_client::<Doubler>("tracked").unwrap();

        let handle = client.send_goal(5).await.unwrap();
        assert_eq!(handle.get_result().await.unwrap(), (GoalStatus::Succeeded, 5));
        tokio::task::yield_now().await;

        server.shutdown();
        drop(server);
        assert_eq!(Arc::strong_count(&marker), 1);
    }
}
