//! Fixed-capacity circular buffers with newest-first logical indexing.
//!
//! Both the registry's recent-pair history and the guard's audit-note log
//! address their slots through [`physical_index`], so the wraparound rule
//! lives in exactly one place. The registry keeps its entries in memory
//! ([`RingBuffer`]); the guard keeps only a [`RingPosition`] and stores the
//! entries in account storage.

use std::num::NonZeroUsize;

/// Map a newest-first logical `index` to a physical slot.
///
/// While the buffer has not wrapped (`size < capacity`) the newest entry sits
/// at `size - 1`; once full, it sits just behind `cursor`. Returns `None` when
/// `index >= size`.
pub fn physical_index(cursor: usize, size: usize, capacity: usize, index: usize) -> Option<usize> {
    if index >= size || capacity == 0 {
        return None;
    }
    if size < capacity {
        return size.checked_sub(1)?.checked_sub(index);
    }
    cursor
        .checked_add(capacity)?
        .checked_sub(1)?
        .checked_sub(index)?
        .checked_rem(capacity)
}

/// Cursor and fill level of a ring buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingPosition {
    cursor: usize,
    size: usize,
    capacity: NonZeroUsize,
}

impl RingPosition {
    /// Empty position for a buffer of `capacity` slots.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cursor: 0,
            size: 0,
            capacity,
        }
    }

    /// Rebuild a position from persisted fields, clamping out-of-range values.
    pub fn restore(cursor: usize, size: usize, capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        Self {
            cursor: cursor.checked_rem(cap).unwrap_or(0),
            size: size.min(cap),
            capacity,
        }
    }

    /// Next physical slot to be written.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Whether every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.size == self.capacity.get()
    }

    /// Total slots.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Physical slot of the newest-first logical `index`.
    pub fn physical(&self, index: usize) -> Option<usize> {
        physical_index(self.cursor, self.size, self.capacity.get(), index)
    }

    /// Claim the slot for a new entry and advance. Returns the claimed slot.
    ///
    /// When the buffer is full the claimed slot holds the oldest entry, which
    /// the caller overwrites.
    pub fn advance(&mut self) -> usize {
        let cap = self.capacity.get();
        let slot = self.cursor;
        self.cursor = slot.checked_add(1).and_then(|n| n.checked_rem(cap)).unwrap_or(0);
        if self.size < cap {
            self.size = self.size.saturating_add(1);
        }
        slot
    }
}

/// In-memory ring buffer whose oldest entry is overwritten when full.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    position: RingPosition,
}

impl<T: Clone> RingBuffer<T> {
    /// Empty buffer with room for `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: vec![None; capacity.get()],
            position: RingPosition::new(capacity),
        }
    }

    /// Append `value`, returning the evicted oldest entry if the buffer was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let slot = self.position.advance();
        self.slots.get_mut(slot).and_then(|s| s.replace(value))
    }

    /// Entry at newest-first `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        let slot = self.position.physical(index)?;
        self.slots.get(slot)?.as_ref()
    }

    /// All entries, newest first.
    pub fn newest_first(&self) -> Vec<T> {
        (0..self.position.len())
            .filter_map(|i| self.get(i).cloned())
            .collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.position.len()
    }

    /// Whether the buffer holds nothing.
    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    /// Maximum number of entries retained.
    pub fn capacity(&self) -> usize {
        self.position.capacity()
    }
}
