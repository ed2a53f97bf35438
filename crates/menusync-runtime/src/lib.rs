//! Deterministic replication of menu actions for lockstep simulations.
//!
//! One participant triggers a menu action; every participant executes it
//! exactly once, with the keyboard-modifier state the originator had at
//! trigger time. Handlers are addressed by stable catalog position, payloads
//! are rebuilt from registered factories, and a guard state machine keeps the
//! originator from double-applying what it broadcast.

pub mod catalog;
pub mod classifier;
pub mod codec;
pub mod config;
pub mod designation;
pub mod loopback;
pub mod modifiers;
pub mod session;
pub mod transport;

pub use catalog::{
    ActionHandle, ActionHandler, ActionReport, CatalogError, CatalogSource, MenuProvider,
    MenuRegistry, StaticProvider,
};
pub use classifier::{DesignationScope, OptOutGate};
pub use codec::{DecodeError, DecodedAction, EncodeError};
pub use config::{ConfigError, SyncConfig};
pub use designation::{Designation, DesignationKinds};
pub use loopback::{LoopbackHub, LoopbackTransport};
pub use modifiers::{ModifierOverlay, ModifierSource, OverrideGuard};
pub use session::{AppliedAction, SyncSession, TriggerError, TriggerOutcome};
pub use transport::{Broadcast, BroadcastOutcome, TransportError};
