//! Simulated robot execution node
pub mod execution;

use tracing::info;

use self::execution::ExecutionSimulator;
use crate::action::ActionServer;
use crate::config::{SimulatorConfig, DEFAULT_FJT_ACTION, FJT_ACTION_PARAM};
use crate::error::{Error, Result};
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::msg::control_msgs::FollowJointTrajectory;
use crate::node::{Context, Node};

/// Node serving `FollowJointTrajectory` through [`ExecutionSimulator`]
pub struct ExecutionSimulatorNode {
    base: LifecycleNodeBase,
    node: Node,
    action_name: Option<String>,
    server: Option<ActionServer<FollowJointTrajectory>>,
}

impl ExecutionSimulatorNode {
    /// Create the node in the unconfigured state
    pub fn new(context: &Context, config: SimulatorConfig) -> Result<Self> {
        let node = context.create_node(&config.node_name, config.parameter_overrides)?;

        Ok(ExecutionSimulatorNode {
            base: LifecycleNodeBase::new(&config.node_name),
            node,
            action_name: None,
            server: None,
        })
    }

    /// Create, configure and activate the node
    pub fn start(context: &Context, config: SimulatorConfig) -> Result<Self> {
        let mut simulator = Self::new(context, config)?;
        simulator.on_configure()?;
        simulator.on_activate()?;
        info!(node = %simulator.node.name(), "Started simulated robot execution node");
        Ok(simulator)
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.on_shutdown()
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn state(&self) -> State {
        self.base.get_state()
    }

    /// Configured action name, as given by the parameter
    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    /// Resolved name the server is currently registered under
    pub fn served_action_name(&self) -> Option<&str> {
        self.server.as_ref().map(ActionServer::action_name)
    }
}

impl LifecycleNode for ExecutionSimulatorNode {
    fn on_configure(&mut self) -> Result<()> {
        self.base.check_transition(State::Inactive)?;

        let value = self
            .node
            .declare_parameter(FJT_ACTION_PARAM, DEFAULT_FJT_ACTION)?;
        let action_name = value
            .as_str()
            .ok_or_else(|| Error::ParameterTypeMismatch {
                name: FJT_ACTION_PARAM.to_string(),
                expected: "string",
                actual: value.type_name(),
            })?
            .to_string();
        info!(node = %self.node.name(), %action_name, "Configured execution simulator");

        self.action_name = Some(action_name);
        self.base.set_state(State::Inactive)
    }

    fn on_activate(&mut self) -> Result<()> {
        self.base.check_transition(State::Active)?;

        let action_name = self.action_name.as_deref().unwrap_or(DEFAULT_FJT_ACTION);
        let server = self.node.create_action_server::<FollowJointTrajectory, _>(
            action_name,
            ExecutionSimulator::new(self.node.name()),
        )?;
        info!(
            node = %self.node.name(),
            action = %server.action_name(),
            "Serving trajectory action"
        );

        self.server = Some(server);
        self.base.set_state(State::Active)
    }

    fn on_deactivate(&mut self) -> Result<()> {
        self.base.check_transition(State::Inactive)?;
        self.server = None;
        info!(node = %self.node.name(), "Stopped serving trajectory action");
        self.base.set_state(State::Inactive)
    }

    fn on_cleanup(&mut self) -> Result<()> {
        self.base.check_transition(State::Unconfigured)?;
        self.node.undeclare_parameter(FJT_ACTION_PARAM);
        self.action_name = None;
        self.base.set_state(State::Unconfigured)
    }

    fn on_shutdown(&mut self) -> Result<()> {
        self.base.check_transition(State::Finalized)?;
        self.server = None;
        self.action_name = None;
        info!(node = %self.node.name(), "Shut down simulated robot execution node");
        self.base.set_state(State::Finalized)
    }
}
