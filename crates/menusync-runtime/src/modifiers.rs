//! Keyboard-modifier capture and replay override.
//!
//! The live input source is an injected capability. During a remote replay
//! the overlay holds the originator's captured snapshot, and every modifier
//! query made by code reached from the replayed handler observes that
//! snapshot instead of live input. Outside a replay, queries fall through.

use std::cell::Cell;
use std::rc::Rc;

use menusync_protocol::ModifierSnapshot;

/// Live modifier-key state, three independent queries.
pub trait ModifierSource {
    fn shift_held(&self) -> bool;
    fn alt_held(&self) -> bool;
    fn ctrl_held(&self) -> bool;
}

/// Shared-cell source, convenient for hosts that poll input once per frame
/// (and for tests and demos).
impl ModifierSource for Rc<Cell<ModifierSnapshot>> {
    fn shift_held(&self) -> bool {
        self.get().shift
    }

    fn alt_held(&self) -> bool {
        self.get().alt
    }

    fn ctrl_held(&self) -> bool {
        self.get().ctrl
    }
}

/// Live source plus a single override slot.
pub struct ModifierOverlay {
    live: Box<dyn ModifierSource>,
    forced: Cell<Option<ModifierSnapshot>>,
}

impl ModifierOverlay {
    pub fn new(live: Box<dyn ModifierSource>) -> Self {
        Self {
            live,
            forced: Cell::new(None),
        }
    }

    pub fn shift_held(&self) -> bool {
        match self.forced.get() {
            Some(snapshot) => snapshot.shift,
            None => self.live.shift_held(),
        }
    }

    pub fn alt_held(&self) -> bool {
        match self.forced.get() {
            Some(snapshot) => snapshot.alt,
            None => self.live.alt_held(),
        }
    }

    pub fn ctrl_held(&self) -> bool {
        match self.forced.get() {
            Some(snapshot) => snapshot.ctrl,
            None => self.live.ctrl_held(),
        }
    }

    /// Snapshot of the effective state. No side effects; observes an
    /// installed override, so a capture during replay sees the replayed
    /// values.
    pub fn capture(&self) -> ModifierSnapshot {
        ModifierSnapshot::new(self.shift_held(), self.alt_held(), self.ctrl_held())
    }

    pub fn is_forced(&self) -> bool {
        self.forced.get().is_some()
    }

    /// Install `snapshot` as the effective state until the guard drops. A
    /// nested install wins for its lifetime; the outer value is restored
    /// afterwards.
    pub fn force(&self, snapshot: ModifierSnapshot) -> OverrideGuard<'_> {
        let previous = self.forced.replace(Some(snapshot));
        OverrideGuard {
            slot: &self.forced,
            previous,
        }
    }
}

/// Restores the previous override slot value on drop, on every exit path.
pub struct OverrideGuard<'a> {
    slot: &'a Cell<Option<ModifierSnapshot>>,
    previous: Option<ModifierSnapshot>,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        self.slot.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay_with_live(snapshot: ModifierSnapshot) -> (ModifierOverlay, Rc<Cell<ModifierSnapshot>>) {
        let live = Rc::new(Cell::new(snapshot));
        (ModifierOverlay::new(Box::new(live.clone())), live)
    }

    #[test]
    fn queries_fall_through_to_live_input() {
        let (overlay, live) = overlay_with_live(ModifierSnapshot::new(true, false, false));
        assert!(overlay.shift_held());
        assert!(!overlay.ctrl_held());

        live.set(ModifierSnapshot::new(false, false, true));
        assert!(!overlay.shift_held());
        assert!(overlay.ctrl_held());
    }

    #[test]
    fn forced_snapshot_shadows_live_input_until_dropped() {
        let (overlay, live) = overlay_with_live(ModifierSnapshot::new(false, true, false));

        {
            let _guard = overlay.force(ModifierSnapshot::new(true, false, true));
            // Live state keeps changing underneath; the override wins.
            live.set(ModifierSnapshot::default());
            assert_eq!(overlay.capture(), ModifierSnapshot::new(true, false, true));
            assert!(overlay.is_forced());
        }

        assert!(!overlay.is_forced());
        assert_eq!(overlay.capture(), ModifierSnapshot::default());
    }

    #[test]
    fn nested_override_restores_the_outer_one() {
        let (overlay, _live) = overlay_with_live(ModifierSnapshot::default());

        let outer = ModifierSnapshot::new(true, true, false);
        let inner = ModifierSnapshot::new(false, false, true);

        let _outer_guard = overlay.force(outer);
        {
            let _inner_guard = overlay.force(inner);
            assert_eq!(overlay.capture(), inner);
        }
        assert_eq!(overlay.capture(), outer);
    }

    #[test]
    fn guard_restores_on_panic() {
        let (overlay, _live) = overlay_with_live(ModifierSnapshot::default());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = overlay.force(ModifierSnapshot::new(true, true, true));
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert!(!overlay.is_forced());
    }
}
