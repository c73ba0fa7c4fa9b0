//! Startup configuration for the execution simulator node

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::node::{ParameterOverrides, ParameterValue};

/// Node name used when none is given on the command line
pub const DEFAULT_NODE_NAME: &str = "motion_execution_server_sim";

/// Parameter holding the action name the simulator serves
pub const FJT_ACTION_PARAM: &str = "follow_joint_trajectory_action";

/// Default value of [`FJT_ACTION_PARAM`]
pub const DEFAULT_FJT_ACTION: &str = "joint_trajectory_action";

/// Node name plus the parameter overrides applied when it starts.
///
/// Sources are layered in call order; later calls replace earlier values.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub node_name: String,
    pub parameter_overrides: ParameterOverrides,
}

impl SimulatorConfig {
    pub fn new(node_name: impl Into<String>) -> Self {
        SimulatorConfig {
            node_name: node_name.into(),
            parameter_overrides: ParameterOverrides::default(),
        }
    }

    /// Serve the trajectory action under `action_name`
    pub fn with_action_name(self, action_name: &str) -> Self {
        self.with_parameter(FJT_ACTION_PARAM, action_name)
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.parameter_overrides.insert(name, value);
        self
    }

    /// Layer the entries a ROS 2 params file holds for this node
    pub fn with_params_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ParamsFileIo {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides = ParameterOverrides::from_params_yaml(&contents, &self.node_name)?;
        self.parameter_overrides.merge(overrides);
        Ok(self)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_NAME)
    }
}
