//! Lifecycle management for nodes with explicit startup and shutdown

use crate::error::{Error, Result};

/// Trait for components that follow a lifecycle pattern
pub trait LifecycleNode: Send + Sync {
    /// Configure the node
    fn on_configure(&mut self) -> Result<()>;

    /// Activate the node
    fn on_activate(&mut self) -> Result<()>;

    /// Deactivate the node
    fn on_deactivate(&mut self) -> Result<()>;

    /// Clean up the node
    fn on_cleanup(&mut self) -> Result<()>;

    /// Release everything the node holds; no transition is possible afterwards
    fn on_shutdown(&mut self) -> Result<()>;
}

/// Base implementation for lifecycle nodes
#[derive(Debug)]
pub struct LifecycleNodeBase {
    pub name: String,
    state: State,
}

/// State of a lifecycle node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unconfigured,
    Inactive,
    Active,
    Finalized,
}

impl State {
    /// Whether a node in this state may move to `next`
    pub fn can_transition_to(self, next: State) -> bool {
        matches!(
            (self, next),
            (State::Unconfigured, State::Inactive)
                | (State::Inactive, State::Active)
                | (State::Active, State::Inactive)
                | (State::Inactive, State::Unconfigured)
                | (State::Unconfigured, State::Finalized)
                | (State::Inactive, State::Finalized)
                | (State::Active, State::Finalized)
        )
    }
}

impl LifecycleNodeBase {
    /// Create a new lifecycle node base
    pub fn new(name: &str) -> Self {
        LifecycleNodeBase {
            name: name.to_string(),
            state: State::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> State {
        self.state
    }

    /// Check that `next` is reachable without changing state
    pub fn check_transition(&self, next: State) -> Result<()> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::InvalidLifecycleTransition {
                node: self.name.clone(),
                from: self.state,
                to: next,
            })
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn set_state(&mut self, next: State) -> Result<()> {
        self.check_transition(next)?;
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_full_lifecycle() {
        let mut base = LifecycleNodeBase::new("sim");
        base.set_state(State::Inactive).unwrap();
        base.set_state(State::Active).unwrap();
        base.set_state(State::Inactive).unwrap();
        base.set_state(State::Unconfigured).unwrap();
        base.set_state(State::Finalized).unwrap();
        assert_eq!(base.get_state(), State::Finalized);
    }

    #[test]
    fn rejects_activation_before_configure() {
        let mut base = LifecycleNodeBase::new("sim");
        let err = base.set_state(State::Active).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLifecycleTransition {
                from: State::Unconfigured,
                to: State::Active,
                ..
            }
        ));
        assert_eq!(base.get_state(), State::Unconfigured);
    }

    #[test]
    fn finalized_is_terminal() {
        let mut base = LifecycleNodeBase::new("sim");
        base.set_state(State::Finalized).unwrap();
        assert!(base.set_state(State::Inactive).is_err());
        assert!(base.set_state(State::Finalized).is_err());
    }
}
