//! Explicit context and node objects
//!
//! A [`Context`] replaces process-wide middleware state: it owns the table of
//! registered action names and the shutdown signal. Nodes are created from a
//! context, carry their own parameters and create action servers and clients.

pub mod parameters;

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::action::{
    Action, ActionClient, ActionServer, ActionServerCallbacks, ActionServerOptions,
};
use crate::error::{Error, Result};

pub use self::parameters::{ParameterOverrides, ParameterValue};

/// Action servers reachable by fully resolved name
#[derive(Default)]
pub(crate) struct ActionRegistry {
    entries: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl ActionRegistry {
    pub(crate) fn register(&self, name: &str, entry: Arc<dyn Any + Send + Sync>) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.contains_key(name) {
            return Err(Error::ActionNameInUse(name.to_string()));
        }
        entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Remove `name` only if it still points at `owner`
    pub(crate) fn unregister(&self, name: &str, owner: *const ()) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let owned = entries
            .get(name)
            .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(entry) as *const (), owner));
        if owned {
            entries.remove(name);
        }
    }
}

struct ContextInner {
    registry: Arc<ActionRegistry>,
    shutdown: watch::Sender<bool>,
}

/// Explicitly constructed middleware context
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            inner: Arc::new(ContextInner {
                registry: Arc::new(ActionRegistry::default()),
                shutdown: watch::Sender::new(false),
            }),
        }
    }

    /// Create a node with the given parameter overrides
    pub fn create_node(&self, name: &str, overrides: ParameterOverrides) -> Result<Node> {
        validate_node_name(name)?;
        debug!(node = %name, "Created node");

        Ok(Node {
            name: name.to_string(),
            registry: Arc::clone(&self.inner.registry),
            overrides,
            parameters: Mutex::new(BTreeMap::new()),
        })
    }

    /// False once shutdown has been requested
    pub fn ok(&self) -> bool {
        !*self.inner.shutdown.borrow()
    }

    pub fn shutdown(&self) {
        if !self.inner.shutdown.send_replace(true) {
            debug!("Context shut down");
        }
    }

    /// Resolves once [`shutdown`](Self::shutdown) has been called
    pub async fn wait_for_shutdown(&self) {
        let mut shutdown = self.inner.shutdown.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = shutdown.wait_for(|requested| *requested).await;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// A named participant holding parameters and action endpoints
pub struct Node {
    name: String,
    registry: Arc<ActionRegistry>,
    overrides: ParameterOverrides,
    parameters: Mutex<BTreeMap<String, ParameterValue>>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a parameter and return its effective value.
    ///
    /// An override supplied at node creation wins over `default`, but it must
    /// have the same type.
    pub fn declare_parameter(
        &self,
        name: &str,
        default: impl Into<ParameterValue>,
    ) -> Result<ParameterValue> {
        let default = default.into();
        let mut parameters = self.parameters.lock().unwrap_or_else(PoisonError::into_inner);
        if parameters.contains_key(name) {
            return Err(Error::ParameterAlreadyDeclared(name.to_string()));
        }

        if self.overrides.is_unsupported(name) {
            return Err(Error::UnsupportedParameterValue(name.to_string()));
        }

        let value = match self.overrides.get(name) {
            Some(value) if value.type_name() != default.type_name() => {
                return Err(Error::ParameterTypeMismatch {
                    name: name.to_string(),
                    expected: default.type_name(),
                    actual: value.type_name(),
                });
            }
            Some(value) => value.clone(),
            None => default,
        };
        debug!(node = %self.name, parameter = %name, %value, "Declared parameter");
        parameters.insert(name.to_string(), value.clone());
        Ok(value)
    }

    pub fn undeclare_parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn get_parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Register an action server under `action_name`
    pub fn create_action_server<A, C>(
        &self,
        action_name: &str,
        callbacks: C,
    ) -> Result<ActionServer<A>>
    where
        A: Action,
        C: ActionServerCallbacks<A>,
    {
        self.create_action_server_with_options(
            action_name,
            callbacks,
            ActionServerOptions::default(),
        )
    }

    pub fn create_action_server_with_options<A, C>(
        &self,
        action_name: &str,
        callbacks: C,
        options: ActionServerOptions,
    ) -> Result<ActionServer<A>>
    where
        A: Action,
        C: ActionServerCallbacks<A>,
    {
        let resolved = resolve_action_name(action_name)?;
        ActionServer::register(
            Arc::clone(&self.registry),
            &self.name,
            resolved,
            Arc::new(callbacks),
            options,
        )
    }

    pub fn create_action_client<A: Action>(&self, action_name: &str) -> Result<ActionClient<A>> {
        let resolved = resolve_action_name(action_name)?;
        Ok(ActionClient::new(Arc::clone(&self.registry), resolved))
    }
}

/// A name token starts with a letter or underscore and holds only
/// alphanumerics and underscores
fn is_valid_token(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn validate_node_name(name: &str) -> Result<()> {
    if is_valid_token(name) {
        Ok(())
    } else {
        Err(Error::InvalidNodeName(name.to_string()))
    }
}

/// Resolve a relative or absolute action name to its absolute form.
///
/// Nodes have no namespace, so private (`~`) names are rejected.
pub fn resolve_action_name(name: &str) -> Result<String> {
    let relative = name.strip_prefix('/').unwrap_or(name);
    let valid = !relative.is_empty() && relative.split('/').all(is_valid_token);

    if valid {
        Ok(format!("/{relative}"))
    } else {
        Err(Error::InvalidActionName(name.to_string()))
    }
}
