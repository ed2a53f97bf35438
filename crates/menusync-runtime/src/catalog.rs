//! Handler identity catalog.
//!
//! Menu-action handlers are live objects with no wire representation. The
//! registry assigns each one a stable `(provider, index)` position by walking
//! the provider catalog in order, and resolves positions back to handlers on
//! the receiving side. The mapping is rebuilt lazily, as a whole, and every
//! build generation is a distinct epoch: ids from an old epoch fail loudly
//! instead of resolving against a reshaped catalog.

use std::collections::HashMap;
use std::sync::Arc;

use menusync_protocol::{wire::hash_bytes_fnv1a64, MenuEntryId, ProviderKind};
use thiserror::Error;

use crate::designation::Designation;
use crate::session::SyncSession;

/// Outcome a handler reports back to the session after running.
///
/// A notice is the "show the user what happened" side effect; the session
/// drops it when the execution is a remote replay.
#[derive(Clone, Debug, Default)]
pub struct ActionReport {
    pub notice: Option<String>,
}

impl ActionReport {
    pub fn silent() -> Self {
        Self { notice: None }
    }

    pub fn with_notice(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
        }
    }
}

/// One menu-action handler. Identity is the `Arc` pointer; providers must
/// hand out the same `Arc`s for the lifetime of a catalog epoch.
pub trait ActionHandler {
    /// Stable tag used for classification (replicate or keep local).
    fn kind(&self) -> &str;

    /// Execute the action against a designation payload. Handler bodies that
    /// vary informational behaviour during replays read
    /// [`SyncSession::is_replaying_remote`] and
    /// [`SyncSession::should_suppress_output`].
    fn activate(&self, designation: &dyn Designation, session: &SyncSession) -> ActionReport;
}

pub type ActionHandle = Arc<dyn ActionHandler>;

/// One provider of menu actions: an ordered, enumerable handler list under a
/// stable provider tag.
pub trait MenuProvider {
    fn kind(&self) -> ProviderKind;
    fn entries(&self) -> Vec<ActionHandle>;
}

/// The external provider catalog the registry builds from.
pub trait CatalogSource {
    fn providers(&self) -> Vec<Arc<dyn MenuProvider>>;
}

impl CatalogSource for Vec<Arc<dyn MenuProvider>> {
    fn providers(&self) -> Vec<Arc<dyn MenuProvider>> {
        self.clone()
    }
}

/// Provider backed by a fixed handler list.
pub struct StaticProvider {
    kind: ProviderKind,
    entries: Vec<ActionHandle>,
}

impl StaticProvider {
    pub fn new(kind: impl Into<ProviderKind>, entries: Vec<ActionHandle>) -> Self {
        Self {
            kind: kind.into(),
            entries,
        }
    }
}

impl MenuProvider for StaticProvider {
    fn kind(&self) -> ProviderKind {
        self.kind.clone()
    }

    fn entries(&self) -> Vec<ActionHandle> {
        self.entries.clone()
    }
}

/// Identity resolution failures. All of them mean the envelope and the local
/// catalog disagree about shape or generation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("handler `{kind}` is not in the current catalog")]
    UnknownHandler { kind: String },

    #[error("no provider `{0}` in the current catalog")]
    UnknownProvider(ProviderKind),

    #[error("entry index {index} out of range for provider `{provider}` ({len} entries)")]
    IndexOutOfRange {
        provider: ProviderKind,
        index: u16,
        len: usize,
    },

    #[error("entry from catalog epoch {entry} cannot resolve against epoch {current}")]
    EpochMismatch { entry: u64, current: u64 },
}

struct CatalogIndex {
    /// Handler pointer identity → assigned id.
    forward: HashMap<usize, MenuEntryId>,
    /// Provider tag → ordered handler list.
    reverse: HashMap<ProviderKind, Vec<ActionHandle>>,
    /// Provider tags in catalog order, for deterministic digests.
    order: Vec<ProviderKind>,
}

fn handle_key(handle: &ActionHandle) -> usize {
    Arc::as_ptr(handle).cast::<()>() as usize
}

/// Bidirectional handler ↔ id mapping, rebuilt lazily per epoch.
pub struct MenuRegistry {
    source: Box<dyn CatalogSource>,
    index: Option<CatalogIndex>,
    epoch: u64,
}

impl MenuRegistry {
    pub fn new(source: Box<dyn CatalogSource>) -> Self {
        Self {
            source,
            index: None,
            epoch: 1,
        }
    }

    /// Current catalog generation. Lockstep peers that build and invalidate
    /// in step agree on this value.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Drop the built index and open a new epoch. Ids handed out earlier no
    /// longer resolve.
    pub fn invalidate(&mut self) {
        self.index = None;
        self.epoch += 1;
    }

    fn ensure_built(&mut self) -> &CatalogIndex {
        let source = &self.source;
        let epoch = self.epoch;
        self.index.get_or_insert_with(|| {
            let mut forward = HashMap::new();
            let mut reverse = HashMap::new();
            let mut order = Vec::new();

            for provider in source.providers() {
                let kind = provider.kind();
                let entries = provider.entries();
                for (i, handle) in entries.iter().enumerate() {
                    forward.insert(
                        handle_key(handle),
                        MenuEntryId::new(kind.clone(), i as u16, epoch),
                    );
                }
                order.push(kind.clone());
                reverse.insert(kind, entries);
            }

            CatalogIndex {
                forward,
                reverse,
                order,
            }
        })
    }

    /// Stable id for a live handler, or `UnknownHandler` for references the
    /// current catalog does not contain (e.g. held over from a prior epoch).
    pub fn resolve(&mut self, handler: &ActionHandle) -> Result<MenuEntryId, CatalogError> {
        let key = handle_key(handler);
        let kind = handler.kind().to_owned();
        self.ensure_built()
            .forward
            .get(&key)
            .cloned()
            .ok_or(CatalogError::UnknownHandler { kind })
    }

    /// Handler for a wire id. Epoch is checked before shape so stale ids are
    /// reported as such even when the position would still be in range.
    pub fn lookup(&mut self, id: &MenuEntryId) -> Result<ActionHandle, CatalogError> {
        let current = self.epoch;
        let index = self.ensure_built();

        if id.epoch != current {
            return Err(CatalogError::EpochMismatch {
                entry: id.epoch,
                current,
            });
        }

        let entries = index
            .reverse
            .get(&id.provider)
            .ok_or_else(|| CatalogError::UnknownProvider(id.provider.clone()))?;

        entries
            .get(id.index as usize)
            .cloned()
            .ok_or_else(|| CatalogError::IndexOutOfRange {
                provider: id.provider.clone(),
                index: id.index,
                len: entries.len(),
            })
    }

    /// Deterministic digest of the catalog shape: provider tags and handler
    /// kinds in catalog order. Peers that built identical catalogs agree on
    /// this value; a disagreement is a desync worth surfacing before any
    /// envelope fails to resolve.
    pub fn digest(&mut self) -> u64 {
        let index = self.ensure_built();
        let mut bytes = Vec::new();
        for kind in &index.order {
            bytes.extend_from_slice(kind.as_str().as_bytes());
            bytes.push(0);
            for handle in &index.reverse[kind] {
                bytes.extend_from_slice(handle.kind().as_bytes());
                bytes.push(0);
            }
        }
        hash_bytes_fnv1a64(&bytes)
    }
}
