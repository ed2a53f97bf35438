//! Replication classification config.
//!
//! Which action kinds stay local, which designation kinds this layer
//! replicates itself (so the host's generic mechanism must skip them), and
//! which of those are re-dispatched under a substitute designation. Data,
//! not code: hosts ship it as YAML next to their other rule files.

use std::collections::{BTreeMap, BTreeSet};

use menusync_protocol::DesignationKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("substituted designation `{0}` must also be listed in skip_generic")]
    SubstitutionNotSkipped(String),

    #[error("pickup designation `{0}` must also be listed in skip_generic")]
    PickupNotSkipped(String),
}

/// Classification sets. Empty by default: everything replicates and nothing
/// is suppressed until the host says otherwise.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Action kinds with no simulation effect (pure selection, placeholders).
    /// Triggered directly, never broadcast, no modifier capture.
    pub local_actions: BTreeSet<String>,

    /// Designation kinds this layer replicates itself; the host's generic
    /// designation-replication mechanism must not replicate them again.
    pub skip_generic: BTreeSet<String>,

    /// Kinds whose designation scope first runs the host's pickup callback
    /// (promote the designator to the active selection) before suppressing.
    pub pickup_on_skip: BTreeSet<String>,

    /// Kind → inert substitute kind handed to the generic mechanism instead.
    pub substitutions: BTreeMap<String, String>,
}

impl SyncConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SyncConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// A substitution or pickup entry for a kind the generic mechanism is not
    /// told to skip would never take effect; reject the config instead.
    fn validate(&self) -> Result<(), ConfigError> {
        for kind in self.substitutions.keys() {
            if !self.skip_generic.contains(kind) {
                return Err(ConfigError::SubstitutionNotSkipped(kind.clone()));
            }
        }
        for kind in &self.pickup_on_skip {
            if !self.skip_generic.contains(kind) {
                return Err(ConfigError::PickupNotSkipped(kind.clone()));
            }
        }
        Ok(())
    }

    pub fn is_local_action(&self, kind: &str) -> bool {
        self.local_actions.contains(kind)
    }

    pub fn is_locally_handled(&self, kind: &str) -> bool {
        self.skip_generic.contains(kind)
    }

    pub fn substitute_for(&self, kind: &str) -> Option<DesignationKind> {
        self.substitutions
            .get(kind)
            .map(|tag| DesignationKind::new(tag.clone()))
    }
}
