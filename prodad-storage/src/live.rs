//! Change notification bus.
//!
//! Every store mutation emits one `ChangeEvent`. Readers that want live
//! results subscribe explicitly and re-run their query when an event for
//! their collection arrives. There is no hidden reactivity and no diffing;
//! the event only says *what kind* of change hit *which collection*.

use prodad_model::Collection;

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    /// A whole collection (or the whole store) was cleared.
    Cleared,
}

/// One store mutation, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: ChangedCollection,
    pub kind: ChangeKind,
    /// Id of the affected record; `None` for clears and chat messages
    /// (chat ids are strings and subscribers re-fetch the log anyway).
    pub id: Option<i64>,
}

/// The collection a change landed in. Chat messages live outside the
/// integer-keyed [`Collection`] set, so they get their own arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangedCollection {
    Records(Collection),
    Chat,
}

impl ChangeEvent {
    pub(crate) fn record(collection: Collection, kind: ChangeKind, id: Option<i64>) -> Self {
        Self {
            collection: ChangedCollection::Records(collection),
            kind,
            id,
        }
    }

    pub(crate) fn chat(kind: ChangeKind) -> Self {
        Self {
            collection: ChangedCollection::Chat,
            kind,
            id: None,
        }
    }

    /// True when this event affects the given integer-keyed collection.
    pub fn touches(&self, collection: Collection) -> bool {
        self.collection == ChangedCollection::Records(collection)
    }
}
