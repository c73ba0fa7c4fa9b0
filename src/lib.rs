//! Simulated robot motion execution
//!
//! Serves the `FollowJointTrajectory` action without touching hardware: every
//! goal is accepted and reported successful straight away, and every
//! cancellation is acknowledged. Intended as a stand-in for a real trajectory
//! controller when testing the planning and execution pipeline.

pub mod action;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod msg;
pub mod node;
pub mod simulator;

pub use crate::config::SimulatorConfig;
pub use crate::error::{Error, Result};
pub use crate::node::{Context, Node};
pub use crate::simulator::execution::ExecutionSimulator;
pub use crate::simulator::ExecutionSimulatorNode;
