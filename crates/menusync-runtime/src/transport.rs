//! Broadcast seam.
//!
//! The replication layer is transport-agnostic: the session hands encoded
//! envelope bytes to a [`Broadcast`] implementation and acts on the outcome.
//! A veto is a normal outcome, not an error: it means an external authority
//! rejected the action before any participant applied it, and the originator
//! must abort its own application too.

use thiserror::Error;

/// What the transport's authority decided about a broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Delivered (or queued) to every other participant; the originator
    /// proceeds to direct local application.
    Accepted,
    /// Rejected before application anywhere; nobody runs the action.
    Vetoed,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("broadcast failed: {0}")]
    Broadcast(String),
}

/// Outbound half of the transport, one per participant.
pub trait Broadcast {
    fn broadcast(&mut self, bytes: &[u8]) -> Result<BroadcastOutcome, TransportError>;
}
