use serde::{Deserialize, Serialize};

use crate::ids::{DesignationKind, MenuEntryId};

/// Keyboard-modifier state captured at the moment an action was triggered.
///
/// Immutable once captured; replayed participants observe exactly this triple
/// instead of their own live input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSnapshot {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl ModifierSnapshot {
    pub const fn new(shift: bool, alt: bool, ctrl: bool) -> Self {
        Self { shift, alt, ctrl }
    }

    /// True when no modifier was held.
    pub const fn is_plain(&self) -> bool {
        !self.shift && !self.alt && !self.ctrl
    }
}

/// One replicated menu activation: which handler, which payload kind, and the
/// ambient modifier state the originator saw.
///
/// `remote` distinguishes an envelope being applied because it arrived off the
/// wire from the originator's own local copy. It is never serialized; the
/// decode path forces it to `true`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    pub entry: MenuEntryId,
    pub designation: DesignationKind,
    pub modifiers: ModifierSnapshot,
    #[serde(skip)]
    pub remote: bool,
}

impl ActionEnvelope {
    /// Envelope for a locally originating activation.
    pub fn local(
        entry: MenuEntryId,
        designation: DesignationKind,
        modifiers: ModifierSnapshot,
    ) -> Self {
        Self {
            entry,
            designation,
            modifiers,
            remote: false,
        }
    }
}
