//! Opt-out gate for the host's generic designation replication.
//!
//! Some designations are replicated by this layer and must not also be
//! replicated by the host's generic cell/area mechanism. The gate raises a
//! suppression flag for exactly one designation call at a time: the host
//! opens a scope around the call, the generic mechanism reads the flag, and
//! dropping the scope restores it. Classification is per invocation, never
//! global.

use std::cell::Cell;

use menusync_protocol::DesignationKind;

use crate::config::SyncConfig;

type PickupHook = Box<dyn Fn(&str)>;

/// Per-invocation suppression state plus the optional pickup callback that
/// runs when a scope opens for a kind in the configured pickup set.
#[derive(Default)]
pub struct OptOutGate {
    suppressed: Cell<bool>,
    pickup: Option<PickupHook>,
}

impl OptOutGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pickup<F>(&mut self, hook: F)
    where
        F: Fn(&str) + 'static,
    {
        self.pickup = Some(Box::new(hook));
    }

    /// Is the generic mechanism currently told to skip? True only inside a
    /// scope opened for a locally-handled kind.
    pub fn suppressed(&self) -> bool {
        self.suppressed.get()
    }

    /// Open a scope around one designation call. For kinds this layer
    /// handles itself the suppression flag goes up until the scope drops;
    /// for every other kind the scope is inert.
    pub fn scope<'a>(&'a self, config: &SyncConfig, kind: &str) -> DesignationScope<'a> {
        if !config.is_locally_handled(kind) {
            return DesignationScope {
                slot: None,
                previous: false,
            };
        }

        if config.pickup_on_skip.contains(kind) {
            if let Some(hook) = &self.pickup {
                hook(kind);
            }
        }

        let previous = self.suppressed.replace(true);
        DesignationScope {
            slot: Some(&self.suppressed),
            previous,
        }
    }

    /// Substitute designation for the generic mechanism, when configured.
    pub fn translate(&self, config: &SyncConfig, kind: &str) -> Option<DesignationKind> {
        config.substitute_for(kind)
    }
}

/// Restores the suppression flag when the designation call completes,
/// on every exit path.
pub struct DesignationScope<'a> {
    slot: Option<&'a Cell<bool>>,
    previous: bool,
}

impl DesignationScope<'_> {
    /// Whether this scope actually raised the flag.
    pub fn is_suppressing(&self) -> bool {
        self.slot.is_some()
    }
}

impl Drop for DesignationScope<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot {
            slot.set(self.previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn config() -> SyncConfig {
        SyncConfig::from_yaml_str(
            r#"
skip_generic:
  - select_similar
  - strip_mine
pickup_on_skip:
  - select_similar
substitutions:
  strip_mine: mine
"#,
        )
        .unwrap()
    }

    #[test]
    fn scope_raises_and_restores_the_flag() {
        let config = config();
        let gate = OptOutGate::new();
        assert!(!gate.suppressed());

        {
            let scope = gate.scope(&config, "strip_mine");
            assert!(scope.is_suppressing());
            assert!(gate.suppressed());
        }
        assert!(!gate.suppressed());
    }

    #[test]
    fn unrelated_kind_leaves_the_flag_down() {
        let config = config();
        let gate = OptOutGate::new();

        let scope = gate.scope(&config, "harvest");
        assert!(!scope.is_suppressing());
        assert!(!gate.suppressed());
    }

    #[test]
    fn classification_is_idempotent() {
        let config = config();
        assert_eq!(
            config.is_locally_handled("select_similar"),
            config.is_locally_handled("select_similar")
        );

        let gate = OptOutGate::new();
        {
            let _scope = gate.scope(&config, "select_similar");
        }
        // Evaluating an unrelated kind afterwards starts from "not skipped".
        let scope = gate.scope(&config, "harvest");
        assert!(!scope.is_suppressing());
        assert!(!gate.suppressed());
    }

    #[test]
    fn pickup_hook_fires_once_per_scope_for_configured_kinds_only() {
        let config = config();
        let picked: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = picked.clone();

        let mut gate = OptOutGate::new();
        gate.set_pickup(move |kind| sink.borrow_mut().push(kind.to_owned()));

        {
            let _scope = gate.scope(&config, "select_similar");
        }
        {
            let _scope = gate.scope(&config, "strip_mine");
        }
        assert_eq!(*picked.borrow(), ["select_similar"]);
    }

    #[test]
    fn translation_comes_from_config() {
        let config = config();
        let gate = OptOutGate::new();
        assert_eq!(
            gate.translate(&config, "strip_mine"),
            Some(DesignationKind::from("mine"))
        );
        assert_eq!(gate.translate(&config, "select_similar"), None);
    }
}
