//! Sentinel audit notes, kept in account storage as a 20-entry ring.
//!
//! Layout under [`NOTES_SLOT`]: offset 0 holds the ring cursor, offset 1 the
//! fill level, offsets `2..2+NOTE_CAPACITY` the transaction ids. Note bodies
//! live at `NOTES_SLOT.keyed(tx_id)` as JSON. Rewriting an existing note
//! updates the body only; a new note that overwrites the oldest ring entry
//! also clears that entry's body.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::layout::NOTES_SLOT;
use crate::ring::RingPosition;
use crate::storage::{Slot, StateStore, StoreExt};
use crate::types::{Annotation, TxId};

/// Number of audit notes retained per account.
pub const NOTE_CAPACITY: usize = 20;

const CURSOR_SLOT: Slot = NOTES_SLOT.offset(0);
const SIZE_SLOT: Slot = NOTES_SLOT.offset(1);
const ENTRIES_OFFSET: u64 = 2;

/// An audit note attached to a transaction by the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxNote {
    /// Reviewer notes.
    #[serde(flatten)]
    pub annotation: Annotation,
    /// Host time of the last write; zero when no note exists.
    pub updated_at: u64,
}

impl TxNote {
    /// Whether a note was ever written for this transaction.
    pub fn exists(&self) -> bool {
        self.updated_at != 0
    }
}

fn capacity() -> NonZeroUsize {
    NonZeroUsize::new(NOTE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn entry_slot(physical: usize) -> Slot {
    let index = u64::try_from(physical).unwrap_or(u64::MAX);
    NOTES_SLOT.offset(ENTRIES_OFFSET.saturating_add(index))
}

fn body_slot(tx: &TxId) -> Slot {
    NOTES_SLOT.keyed(tx.as_bytes())
}

fn position(store: &dyn StateStore) -> RingPosition {
    let cursor = usize::try_from(store.read_u64(&CURSOR_SLOT)).unwrap_or(0);
    let size = usize::try_from(store.read_u64(&SIZE_SLOT)).unwrap_or(0);
    RingPosition::restore(cursor, size, capacity())
}

fn save_position(store: &mut dyn StateStore, pos: &RingPosition) {
    store.write_u64(CURSOR_SLOT, u64::try_from(pos.cursor()).unwrap_or(0));
    store.write_u64(SIZE_SLOT, u64::try_from(pos.len()).unwrap_or(0));
}

/// Note stored for `tx`; an empty note when none exists.
pub fn read(store: &dyn StateStore, tx: &TxId) -> TxNote {
    store
        .read(&body_slot(tx))
        .and_then(|raw| serde_json::from_slice(raw).ok())
        .unwrap_or_default()
}

/// Insert or update the note for `tx`.
pub fn write(store: &mut dyn StateStore, tx: TxId, annotation: Annotation, now: u64) {
    let existing = read(store, &tx).exists();
    if !existing {
        let mut pos = position(store);
        let was_full = pos.is_full();
        let slot = entry_slot(pos.advance());
        if was_full {
            let evicted = store.read_tx_id(&slot);
            store.clear(&body_slot(&evicted));
        }
        store.write_tx_id(slot, tx);
        save_position(store, &pos);
    }

    let note = TxNote {
        annotation,
        // A zero timestamp would read back as "no note".
        updated_at: now.max(1),
    };
    match serde_json::to_vec(&note) {
        Ok(body) => store.write(body_slot(&tx), body),
        Err(e) => tracing::error!(%tx, error = %e, "failed to encode audit note"),
    }
}

/// Transaction ids with notes, newest first.
pub fn recent(store: &dyn StateStore) -> Vec<TxId> {
    let pos = position(store);
    (0..pos.len())
        .filter_map(|i| pos.physical(i))
        .map(|physical| store.read_tx_id(&entry_slot(physical)))
        .collect()
}

/// Transaction id at newest-first `index`, or `None` past the end.
pub fn recent_at(store: &dyn StateStore, index: usize) -> Option<TxId> {
    let pos = position(store);
    pos.physical(index)
        .map(|physical| store.read_tx_id(&entry_slot(physical)))
}

/// Number of notes currently retained.
pub fn len(store: &dyn StateStore) -> usize {
    position(store).len()
}
