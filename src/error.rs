//! Error types for the simulated execution node and its in-process transport

use std::path::PathBuf;

use thiserror::Error;

use crate::action::{GoalId, GoalStatus};
use crate::lifecycle::State;

/// Errors raised by the node, parameter, action and lifecycle layers.
///
/// The simulator callbacks never produce one of these themselves; they only
/// surface from the plumbing around them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid node name '{0}'")]
    InvalidNodeName(String),

    #[error("invalid action name '{0}'")]
    InvalidActionName(String),

    #[error("parameter '{0}' is already declared")]
    ParameterAlreadyDeclared(String),

    /// An override does not match the type of the declared default.
    #[error("parameter '{name}' expects a {expected} value, got {actual}")]
    ParameterTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid parameter assignment '{0}', expected NAME:=VALUE")]
    InvalidParameterAssignment(String),

    #[error("unsupported value for parameter '{0}'")]
    UnsupportedParameterValue(String),

    #[error("failed to read params file {path}: {source}")]
    ParamsFileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse params file: {0}")]
    ParamsFileParse(#[from] serde_yaml::Error),

    #[error("action name '{0}' is already in use")]
    ActionNameInUse(String),

    #[error("no action server available under '{0}'")]
    ServerUnavailable(String),

    #[error("action server '{name}' does not serve {expected}")]
    ActionTypeMismatch { name: String, expected: &'static str },

    #[error("goal rejected by action server '{0}'")]
    GoalRejected(String),

    #[error("unknown goal {0}")]
    UnknownGoal(GoalId),

    #[error("invalid transition from {from} to {to} for goal {goal_id}")]
    InvalidTransition {
        goal_id: GoalId,
        from: GoalStatus,
        to: GoalStatus,
    },

    #[error("action server '{0}' shut down before the goal finished")]
    ServerShutdown(String),

    #[error("invalid lifecycle transition for '{node}' from {from:?} to {to:?}")]
    InvalidLifecycleTransition { node: String, from: State, to: State },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
