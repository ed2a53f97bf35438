//! Wire-safe data model for lockstep menu-action replication.
//!
//! A participant that triggers a menu action broadcasts an [`ActionEnvelope`]
//! naming the handler by stable catalog position plus the keyboard-modifier
//! state captured at trigger time. Every other participant re-executes the
//! action from the decoded envelope.

mod envelope;
mod ids;
pub mod wire;

pub use crate::envelope::{ActionEnvelope, ModifierSnapshot};
pub use crate::ids::{DesignationKind, MenuEntryId, ProviderKind};
pub use crate::wire::WireError;
