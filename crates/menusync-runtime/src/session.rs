//! Participant-local replication session.
//!
//! The session is the single entry point UI code calls when a user activates
//! a menu action, and the single delivery point for envelopes received from
//! other participants. It decides per trigger whether to broadcast, apply
//! directly, or abort, and guarantees each logical action runs exactly once
//! on this participant.
//!
//! Guard flags are owned here and nowhere else. Every flag transition is
//! scoped and restored on all exit paths, so a failing handler cannot leak
//! replay state into unrelated later calls.

use std::cell::{Cell, RefCell};

use menusync_protocol::{DesignationKind, MenuEntryId, ModifierSnapshot};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog::{ActionHandle, ActionReport, CatalogSource, MenuRegistry};
use crate::classifier::{DesignationScope, OptOutGate};
use crate::codec::{self, DecodeError, EncodeError};
use crate::config::SyncConfig;
use crate::designation::{Designation, DesignationKinds};
use crate::modifiers::{ModifierOverlay, ModifierSource, OverrideGuard};
use crate::transport::{Broadcast, BroadcastOutcome, TransportError};

/// Cooperative signalling state gating behaviour at call sites outside this
/// layer's control. Mutated only by the session.
#[derive(Default)]
struct GuardFlags {
    /// A remote replay is being applied; modifier queries are overridden and
    /// nested triggers must never broadcast.
    replaying_remote: Cell<bool>,
    /// The current execution is not locally meaningful; informational
    /// output is dropped.
    suppress_output: Cell<bool>,
    /// The broadcast was vetoed; the originating call must abort before
    /// touching the handler.
    pending_cancel: Cell<bool>,
}

impl GuardFlags {
    fn is_replaying_remote(&self) -> bool {
        self.replaying_remote.get()
    }

    fn should_suppress_output(&self) -> bool {
        self.suppress_output.get()
    }

    fn mark_pending_cancel(&self) {
        self.pending_cancel.set(true);
    }

    fn take_pending_cancel(&self) -> bool {
        self.pending_cancel.replace(false)
    }
}

/// Raises the replay flags and installs the captured modifier snapshot;
/// restores all three on drop, whatever the handler did.
struct ReplayScope<'a> {
    flags: &'a GuardFlags,
    _modifiers: OverrideGuard<'a>,
}

impl<'a> ReplayScope<'a> {
    fn enter(
        flags: &'a GuardFlags,
        overlay: &'a ModifierOverlay,
        snapshot: ModifierSnapshot,
    ) -> Self {
        flags.replaying_remote.set(true);
        flags.suppress_output.set(true);
        Self {
            flags,
            _modifiers: overlay.force(snapshot),
        }
    }
}

impl Drop for ReplayScope<'_> {
    fn drop(&mut self) {
        self.flags.replaying_remote.set(false);
        self.flags.suppress_output.set(false);
    }
}

/// How a trigger was disposed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Broadcast accepted; applied locally as the originating copy.
    Applied,
    /// Classified as locally meaningful only; applied without broadcast.
    Local,
    /// Broadcast vetoed by the authority; the handler never ran here.
    Vetoed,
    /// Nested trigger during a remote replay; applied without re-broadcast.
    NestedReplay,
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One replicated application, for diagnosis after the fact.
#[derive(Clone, Debug)]
pub struct AppliedAction {
    pub entry: MenuEntryId,
    pub action_kind: String,
    pub designation: DesignationKind,
    pub remote: bool,
    pub modifiers: ModifierSnapshot,
}

/// Per-participant replication state: catalog registry, modifier overlay,
/// guard flags, designation factories, classification config, opt-out gate,
/// and the broadcast transport.
pub struct SyncSession {
    registry: RefCell<MenuRegistry>,
    modifiers: ModifierOverlay,
    flags: GuardFlags,
    kinds: DesignationKinds,
    config: SyncConfig,
    gate: OptOutGate,
    transport: RefCell<Box<dyn Broadcast>>,
    journal: RefCell<Vec<AppliedAction>>,
}

impl SyncSession {
    pub fn new(
        catalog: Box<dyn CatalogSource>,
        input: Box<dyn ModifierSource>,
        kinds: DesignationKinds,
        config: SyncConfig,
        transport: Box<dyn Broadcast>,
    ) -> Self {
        Self {
            registry: RefCell::new(MenuRegistry::new(catalog)),
            modifiers: ModifierOverlay::new(input),
            flags: GuardFlags::default(),
            kinds,
            config,
            gate: OptOutGate::new(),
            transport: RefCell::new(transport),
            journal: RefCell::new(Vec::new()),
        }
    }

    /// Install the host callback run when a designation scope opens for a
    /// kind in the configured pickup set.
    pub fn set_pickup<F>(&mut self, hook: F)
    where
        F: Fn(&str) + 'static,
    {
        self.gate.set_pickup(hook);
    }

    /// Entry point for a user-activated menu action.
    ///
    /// Replicable actions are captured, encoded and broadcast before the
    /// local application; excluded kinds apply directly; a veto aborts
    /// without running the handler. Encode failures abort this one trigger
    /// and leave every flag at its prior value.
    pub fn trigger(
        &self,
        handler: &ActionHandle,
        designation: &dyn Designation,
    ) -> Result<TriggerOutcome, TriggerError> {
        if self.flags.is_replaying_remote() {
            // Already applying a remote copy: re-broadcasting would loop.
            self.apply(handler, designation);
            return Ok(TriggerOutcome::NestedReplay);
        }

        if self.config.is_local_action(handler.kind()) {
            self.apply(handler, designation);
            return Ok(TriggerOutcome::Local);
        }

        let modifiers = self.modifiers.capture();
        let (envelope, bytes) = {
            let mut registry = self.registry.borrow_mut();
            codec::encode(&mut registry, handler, designation, modifiers)?
        };

        let outcome = self.transport.borrow_mut().broadcast(&bytes)?;
        if outcome == BroadcastOutcome::Vetoed {
            self.flags.mark_pending_cancel();
        }
        if self.flags.take_pending_cancel() {
            debug!(entry = %envelope.entry, "broadcast vetoed; aborting local application");
            return Ok(TriggerOutcome::Vetoed);
        }

        self.journal.borrow_mut().push(AppliedAction {
            entry: envelope.entry.clone(),
            action_kind: handler.kind().to_owned(),
            designation: envelope.designation.clone(),
            remote: false,
            modifiers,
        });
        self.apply(handler, designation);
        Ok(TriggerOutcome::Applied)
    }

    /// Delivery callback for one received envelope. Decode failures are
    /// logged and dropped: the other participants already applied the
    /// action, and taking this session down would only add a desync to a
    /// desync. No retry.
    pub fn deliver(&self, bytes: &[u8]) {
        if let Err(err) = self.try_deliver(bytes) {
            error!("dropping undeliverable action envelope: {err}");
        }
    }

    /// [`deliver`](Self::deliver) with the failure surfaced, for callers
    /// that track divergence themselves.
    pub fn try_deliver(&self, bytes: &[u8]) -> Result<(), DecodeError> {
        let decoded = {
            let mut registry = self.registry.borrow_mut();
            codec::decode(&mut registry, &self.kinds, bytes)?
        };

        let _scope = ReplayScope::enter(&self.flags, &self.modifiers, decoded.envelope.modifiers);
        self.journal.borrow_mut().push(AppliedAction {
            entry: decoded.envelope.entry.clone(),
            action_kind: decoded.handler.kind().to_owned(),
            designation: decoded.envelope.designation.clone(),
            remote: true,
            modifiers: decoded.envelope.modifiers,
        });
        self.apply(&decoded.handler, decoded.designation.as_ref());
        Ok(())
    }

    fn apply(&self, handler: &ActionHandle, designation: &dyn Designation) {
        let report = handler.activate(designation, self);
        self.emit(handler.kind(), report);
    }

    fn emit(&self, action_kind: &str, report: ActionReport) {
        if self.flags.should_suppress_output() {
            return;
        }
        if let Some(notice) = report.notice {
            info!(action = action_kind, "{notice}");
        }
    }

    // Read accessors for handler bodies and host call sites.

    pub fn is_replaying_remote(&self) -> bool {
        self.flags.is_replaying_remote()
    }

    pub fn should_suppress_output(&self) -> bool {
        self.flags.should_suppress_output()
    }

    pub fn shift_held(&self) -> bool {
        self.modifiers.shift_held()
    }

    pub fn alt_held(&self) -> bool {
        self.modifiers.alt_held()
    }

    pub fn ctrl_held(&self) -> bool {
        self.modifiers.ctrl_held()
    }

    /// Effective modifier state: the replayed snapshot during a replay,
    /// live input otherwise.
    pub fn capture_modifiers(&self) -> ModifierSnapshot {
        self.modifiers.capture()
    }

    // Catalog maintenance.

    /// Signal that the external provider catalog changed shape. The mapping
    /// is rebuilt on next use under a new epoch; ids from the old epoch stop
    /// resolving.
    pub fn invalidate_catalog(&self) {
        self.registry.borrow_mut().invalidate();
    }

    pub fn catalog_epoch(&self) -> u64 {
        self.registry.borrow().epoch()
    }

    /// Deterministic catalog-shape digest for cross-peer comparison.
    pub fn catalog_digest(&self) -> u64 {
        self.registry.borrow_mut().digest()
    }

    /// Replicated applications so far, origin and replay alike.
    pub fn journal(&self) -> Vec<AppliedAction> {
        self.journal.borrow().clone()
    }

    // Opt-out surface for the host's generic designation replication.

    /// Does this layer replicate the given designation kind itself?
    pub fn is_locally_handled(&self, kind: &str) -> bool {
        self.config.is_locally_handled(kind)
    }

    /// Inert substitute the generic mechanism should replicate instead,
    /// when one is configured.
    pub fn translate_for_generic(&self, kind: &str) -> Option<DesignationKind> {
        self.gate.translate(&self.config, kind)
    }

    /// Open a per-invocation scope around one designation call.
    pub fn designation_scope(&self, kind: &str) -> DesignationScope<'_> {
        self.gate.scope(&self.config, kind)
    }

    /// Flag the generic mechanism reads while a designation call is in
    /// flight.
    pub fn generic_replication_suppressed(&self) -> bool {
        self.gate.suppressed()
    }
}
