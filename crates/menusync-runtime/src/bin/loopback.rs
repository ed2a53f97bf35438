//! Three in-process participants replicating a menu action over the
//! loopback hub. Run with `RUST_LOG=info` (default) or `debug` for the
//! guard's veto/abort traces.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use menusync_protocol::{ModifierSnapshot, ProviderKind};
use menusync_runtime::{
    ActionHandle, ActionHandler, ActionReport, Designation, DesignationKinds, LoopbackHub,
    MenuProvider, StaticProvider, SyncConfig, SyncSession,
};
use tracing::info;

struct CellDesignation;

impl Designation for CellDesignation {
    fn kind(&self) -> &str {
        "cell"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct HarvestAction {
    name: &'static str,
}

impl ActionHandler for HarvestAction {
    fn kind(&self) -> &str {
        "harvest_marked"
    }

    fn activate(&self, _designation: &dyn Designation, session: &SyncSession) -> ActionReport {
        let modifiers = session.capture_modifiers();
        info!(
            participant = self.name,
            replay = session.is_replaying_remote(),
            shift = modifiers.shift,
            alt = modifiers.alt,
            ctrl = modifiers.ctrl,
            "harvest action executed"
        );
        ActionReport::with_notice("marked growth harvested")
    }
}

fn participant(
    hub: &LoopbackHub,
    name: &'static str,
) -> (SyncSession, ActionHandle, Rc<Cell<ModifierSnapshot>>) {
    let handler: ActionHandle = Arc::new(HarvestAction { name });
    let providers: Vec<Arc<dyn MenuProvider>> = vec![Arc::new(StaticProvider::new(
        ProviderKind::from("DesignatorHarvest"),
        vec![handler.clone()],
    ))];

    let mut kinds = DesignationKinds::new();
    kinds.register("cell", || Box::new(CellDesignation));

    let input = Rc::new(Cell::new(ModifierSnapshot::default()));
    let session = SyncSession::new(
        Box::new(providers),
        Box::new(input.clone()),
        kinds,
        SyncConfig::default(),
        Box::new(hub.register()),
    );
    (session, handler, input)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let hub = LoopbackHub::new();
    let (alpha, handler, input) = participant(&hub, "alpha");
    let (beta, _, _) = participant(&hub, "beta");
    let (gamma, _, _) = participant(&hub, "gamma");

    info!(
        "participants share catalog shape {:016x}",
        alpha.catalog_digest()
    );

    // The user on alpha holds shift while activating the menu entry.
    input.set(ModifierSnapshot::new(true, false, false));
    alpha
        .trigger(&handler, &CellDesignation)
        .expect("loopback broadcast cannot fail");

    let delivered = hub.pump(&[&alpha, &beta, &gamma]);
    info!(delivered, "replication pass complete");

    for (name, session) in [("alpha", &alpha), ("beta", &beta), ("gamma", &gamma)] {
        for entry in session.journal() {
            info!(
                participant = name,
                entry = %entry.entry,
                remote = entry.remote,
                shift = entry.modifiers.shift,
                "journal"
            );
        }
    }
}
