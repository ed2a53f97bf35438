//! In-memory transport hub for deterministic multi-participant runs.
//!
//! Every registered participant gets a mailbox; a broadcast fans out to all
//! the *other* mailboxes (the originator applies its own copy directly). An
//! optional scripted authority can veto broadcasts, which is how tests model
//! the external rejection path without a network.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::session::SyncSession;
use crate::transport::{Broadcast, BroadcastOutcome, TransportError};

type Authority = Box<dyn FnMut(&[u8]) -> BroadcastOutcome>;

struct HubInner {
    mailboxes: RefCell<Vec<VecDeque<Vec<u8>>>>,
    authority: RefCell<Option<Authority>>,
}

/// Connects N participants in one process.
pub struct LoopbackHub {
    inner: Rc<HubInner>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(HubInner {
                mailboxes: RefCell::new(Vec::new()),
                authority: RefCell::new(None),
            }),
        }
    }

    /// Add a participant; the returned transport goes into its session.
    /// Registration order is the delivery order used by [`pump`](Self::pump).
    pub fn register(&self) -> LoopbackTransport {
        let mut mailboxes = self.inner.mailboxes.borrow_mut();
        mailboxes.push(VecDeque::new());
        LoopbackTransport {
            hub: self.inner.clone(),
            index: mailboxes.len() - 1,
        }
    }

    /// Script the broadcast authority. Every subsequent broadcast is passed
    /// through it before fan-out.
    pub fn set_authority<F>(&self, authority: F)
    where
        F: FnMut(&[u8]) -> BroadcastOutcome + 'static,
    {
        *self.inner.authority.borrow_mut() = Some(Box::new(authority));
    }

    pub fn clear_authority(&self) {
        *self.inner.authority.borrow_mut() = None;
    }

    /// Envelopes queued and not yet delivered.
    pub fn pending(&self) -> usize {
        self.inner.mailboxes.borrow().iter().map(VecDeque::len).sum()
    }

    /// Deliver queued envelopes into their sessions until every mailbox is
    /// drained. `sessions` must be in registration order. Returns how many
    /// envelopes were delivered.
    pub fn pump(&self, sessions: &[&SyncSession]) -> usize {
        let mut delivered = 0;
        loop {
            let mut progressed = false;
            for (i, session) in sessions.iter().enumerate() {
                let next = self.inner.mailboxes.borrow_mut()[i].pop_front();
                if let Some(bytes) = next {
                    session.deliver(&bytes);
                    delivered += 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
        delivered
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One participant's outbound half.
pub struct LoopbackTransport {
    hub: Rc<HubInner>,
    index: usize,
}

impl Broadcast for LoopbackTransport {
    fn broadcast(&mut self, bytes: &[u8]) -> Result<BroadcastOutcome, TransportError> {
        if let Some(authority) = self.hub.authority.borrow_mut().as_mut() {
            if authority(bytes) == BroadcastOutcome::Vetoed {
                return Ok(BroadcastOutcome::Vetoed);
            }
        }

        let mut mailboxes = self.hub.mailboxes.borrow_mut();
        for (i, mailbox) in mailboxes.iter_mut().enumerate() {
            if i != self.index {
                mailbox.push_back(bytes.to_vec());
            }
        }
        Ok(BroadcastOutcome::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use menusync_protocol::{ModifierSnapshot, ProviderKind};

    use super::*;
    use crate::catalog::{ActionHandle, ActionHandler, ActionReport, MenuProvider, StaticProvider};
    use crate::config::SyncConfig;
    use crate::designation::{Designation, DesignationKinds};
    use crate::session::TriggerOutcome;

    struct CellDesignation;

    impl Designation for CellDesignation {
        fn kind(&self) -> &str {
            "cell"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct CountAction {
        runs: Rc<Cell<u32>>,
    }

    impl ActionHandler for CountAction {
        fn kind(&self) -> &str {
            "harvest_marked"
        }

        fn activate(&self, _designation: &dyn Designation, _session: &SyncSession) -> ActionReport {
            self.runs.set(self.runs.get() + 1);
            ActionReport::silent()
        }
    }

    fn participant(hub: &LoopbackHub) -> (SyncSession, ActionHandle, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let handler: ActionHandle = Arc::new(CountAction { runs: runs.clone() });
        let providers: Vec<Arc<dyn MenuProvider>> = vec![Arc::new(StaticProvider::new(
            ProviderKind::from("DesignatorHarvest"),
            vec![handler.clone()],
        ))];

        let mut kinds = DesignationKinds::new();
        kinds.register("cell", || Box::new(CellDesignation));

        let session = SyncSession::new(
            Box::new(providers),
            Box::new(Rc::new(Cell::new(ModifierSnapshot::default()))),
            kinds,
            SyncConfig::default(),
            Box::new(hub.register()),
        );
        (session, handler, runs)
    }

    #[test]
    fn one_broadcast_applies_exactly_once_per_participant() {
        let hub = LoopbackHub::new();
        let (s0, h0, r0) = participant(&hub);
        let (s1, _, r1) = participant(&hub);
        let (s2, _, r2) = participant(&hub);

        let outcome = s0.trigger(&h0, &CellDesignation).unwrap();
        assert_eq!(outcome, TriggerOutcome::Applied);
        // Originator applied directly; the others only after delivery.
        assert_eq!((r0.get(), r1.get(), r2.get()), (1, 0, 0));

        let delivered = hub.pump(&[&s0, &s1, &s2]);
        assert_eq!(delivered, 2);
        assert_eq!((r0.get(), r1.get(), r2.get()), (1, 1, 1));

        // Nothing left over; pumping again is a no-op.
        assert_eq!(hub.pending(), 0);
        assert_eq!(hub.pump(&[&s0, &s1, &s2]), 0);
        assert_eq!((r0.get(), r1.get(), r2.get()), (1, 1, 1));
    }

    #[test]
    fn scripted_veto_stops_everyone_including_the_originator() {
        let hub = LoopbackHub::new();
        let (s0, h0, r0) = participant(&hub);
        let (s1, _, r1) = participant(&hub);
        hub.set_authority(|_| BroadcastOutcome::Vetoed);

        let outcome = s0.trigger(&h0, &CellDesignation).unwrap();
        assert_eq!(outcome, TriggerOutcome::Vetoed);
        assert_eq!(hub.pending(), 0);
        assert_eq!((r0.get(), r1.get()), (0, 0));

        // Lifting the veto restores normal replication.
        hub.clear_authority();
        s0.trigger(&h0, &CellDesignation).unwrap();
        hub.pump(&[&s0, &s1]);
        assert_eq!((r0.get(), r1.get()), (1, 1));
    }

    #[test]
    fn peers_with_identical_catalogs_agree_on_digest() {
        let hub = LoopbackHub::new();
        let (s0, _, _) = participant(&hub);
        let (s1, _, _) = participant(&hub);

        assert_eq!(s0.catalog_digest(), s1.catalog_digest());
        assert_eq!(s0.catalog_epoch(), s1.catalog_epoch());
    }
}
