//! The reloadable capability and its registry.

use std::fmt;
use std::sync::Arc;

use crate::config::MonitorConfig;

/// Error returned by a subsystem that rejects a configuration.
pub type ApplyError = Box<dyn std::error::Error + Send + Sync>;

/// Something that can change its internal state to match a new configuration
/// and handle failure gracefully.
///
/// Called repeatedly over the process lifetime, in registration order but
/// without any ordering guarantee relative to other reloadables' side effects.
pub trait Reloadable: Send + Sync {
    /// Name used in logs and aggregate errors.
    fn name(&self) -> &str;

    /// Adopt `config`. On error the subsystem keeps its previous state.
    fn apply_config(&self, config: &Arc<MonitorConfig>) -> Result<(), ApplyError>;
}

/// Ordered, append-only list of reloadables built during startup.
#[derive(Default, Clone)]
pub struct Reloadables {
    entries: Vec<Arc<dyn Reloadable>>,
}

impl Reloadables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reloadable. Order of registration is the order of application.
    pub fn register(&mut self, reloadable: Arc<dyn Reloadable>) -> &mut Self {
        tracing::debug!(reloadable = reloadable.name(), "Reloadable registered");
        self.entries.push(reloadable);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Reloadable>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|r| r.name().to_string()).collect()
    }
}

impl fmt::Debug for Reloadables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
