//! Envelope encode/decode against the live catalog.
//!
//! Encoding requires the handler to be resolvable right now; decoding
//! resolves the wire id back to a handler and rebuilds a fresh designation
//! payload. A decoded action is always marked remote.

use menusync_protocol::{wire, ActionEnvelope, DesignationKind, ModifierSnapshot, WireError};
use thiserror::Error;

use crate::catalog::{ActionHandle, CatalogError, MenuRegistry};
use crate::designation::{Designation, DesignationKinds};

#[derive(Debug, Error)]
pub enum EncodeError {
    /// The handler is not in the current catalog; the action cannot be
    /// referenced on the wire.
    #[error("cannot replicate unresolvable action: {0}")]
    Unresolvable(#[from] CatalogError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Any way an incoming envelope can fail to become a runnable action.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("envelope names an unknown entry: {0}")]
    UnknownEntry(#[from] CatalogError),

    #[error("no designation factory registered for `{0}`")]
    UnknownDesignation(DesignationKind),
}

/// A received envelope resolved into everything needed to run it.
pub struct DecodedAction {
    pub handler: ActionHandle,
    pub designation: Box<dyn Designation>,
    pub envelope: ActionEnvelope,
}

/// Envelope plus wire bytes for a locally triggered action.
pub fn encode(
    registry: &mut MenuRegistry,
    handler: &ActionHandle,
    designation: &dyn Designation,
    modifiers: ModifierSnapshot,
) -> Result<(ActionEnvelope, Vec<u8>), EncodeError> {
    let entry = registry.resolve(handler)?;
    let envelope = ActionEnvelope::local(
        entry,
        DesignationKind::from(designation.kind()),
        modifiers,
    );
    let bytes = wire::serialize_envelope(&envelope)?;
    Ok((envelope, bytes))
}

/// Resolve wire bytes into a runnable remote action.
pub fn decode(
    registry: &mut MenuRegistry,
    kinds: &DesignationKinds,
    bytes: &[u8],
) -> Result<DecodedAction, DecodeError> {
    let envelope = wire::deserialize_envelope(bytes)?;
    let handler = registry.lookup(&envelope.entry)?;
    let designation = kinds
        .create(&envelope.designation)
        .ok_or_else(|| DecodeError::UnknownDesignation(envelope.designation.clone()))?;

    Ok(DecodedAction {
        handler,
        designation,
        envelope,
    })
}
