#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Checks shipped with the grader.
pub mod builtin;

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    connector::Session,
    error::{CheckError, PluginResolutionError},
};

/// One automated comparison between a submitted query and a reference query.
pub trait Check: Send {
    /// Identifier the check is registered under.
    fn id(&self) -> &str;

    /// Scores the submitted query against the reference query. The outcome is
    /// expected in `[0, 1]`; the scoring engine clamps anything else.
    fn evaluate(
        &self,
        submitted: &str,
        reference: &str,
        session: &mut dyn Session,
    ) -> Result<f64, CheckError>;
}

/// Builds a fresh check instance, or explains why it cannot.
type CheckConstructor = Arc<dyn Fn() -> Result<Box<dyn Check>, String> + Send + Sync + 'static>;

/// Maps check identifiers to constructors. Populated at start-up; lookups
/// never go beyond what was registered.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    /// Constructors by identifier.
    constructors: BTreeMap<String, CheckConstructor>,
}

impl CheckRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every check in [`builtin`].
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    /// Registers `constructor` under `id`, replacing any earlier registration.
    pub fn register<F>(&mut self, id: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Check>, String> + Send + Sync + 'static,
    {
        let id = id.into();
        if self
            .constructors
            .insert(id.clone(), Arc::new(constructor))
            .is_some()
        {
            tracing::debug!("Check `{id}` re-registered");
        }
        self
    }

    /// Builds the check registered under `id`.
    pub fn resolve(&self, id: &str) -> Result<Box<dyn Check>, PluginResolutionError> {
        let constructor = self
            .constructors
            .get(id)
            .ok_or_else(|| PluginResolutionError::Unknown(id.to_string()))?;
        constructor().map_err(|reason| PluginResolutionError::Construction {
            check: id.to_string(),
            reason,
        })
    }

    /// Whether anything is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("checks", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}
