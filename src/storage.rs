//! Account key-value storage shared by the guard and the active module.
//!
//! Keys are 32-byte [`Slot`]s. Guard-owned state lives under slots derived
//! from a fixed namespace hash (see [`crate::guard::layout`]), far away from
//! the small sequential slots a naive module picks with [`Slot::from_index`].
//! Nothing here enforces isolation: a module holding a `&mut dyn StateStore`
//! can write any slot, and no host-side remapping can change that.
//!
//! Values are raw bytes. The typed helpers in [`StoreExt`] decode the way a
//! word-addressed machine would: short values are left-padded, long values
//! keep their low-order bytes, and a missing slot reads as zero. Decoding
//! never fails.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

use crate::types::{Address, TxId};

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// 32-byte storage key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot([u8; 32]);

impl Slot {
    /// Wrap raw bytes. `const` so namespace slots can be compile-time constants.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Small sequential slot `index`, the way a naive module lays out its fields.
    pub fn from_index(index: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&index.to_be_bytes());
        Self(bytes)
    }

    /// SHA-256 of a namespace string.
    pub fn derive(namespace: &str) -> Self {
        Self(Sha256::digest(namespace.as_bytes()).into())
    }

    /// Slot `n` positions after this one (big-endian add, wrapping at 2^256).
    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
    pub const fn offset(&self, n: u64) -> Self {
        let mut out = self.0;
        let addend = n.to_be_bytes();
        let mut carry = 0u16;
        let mut i = 32usize;
        while i > 0 {
            i = i.wrapping_sub(1);
            let add = if i >= 24 {
                addend[i.wrapping_sub(24)] as u16
            } else {
                0
            };
            let sum = (out[i] as u16).wrapping_add(add).wrapping_add(carry);
            out[i] = (sum & 0xff) as u8;
            carry = sum >> 8;
        }
        Self(out)
    }

    /// Slot for a keyed entry under this base: `sha256(key || base)`.
    pub fn keyed(&self, key: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.update(self.0);
        Self(hasher.finalize().into())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({self})")
    }
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// Persistent key-value state of one account.
pub trait StateStore {
    /// Bytes stored at `slot`, if any.
    fn read(&self, slot: &Slot) -> Option<&[u8]>;

    /// Store `value` at `slot`. An empty value clears the slot.
    fn write(&mut self, slot: Slot, value: Vec<u8>);

    /// Remove whatever is stored at `slot`.
    fn clear(&mut self, slot: &Slot);
}

/// Ordered in-memory [`StateStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    slots: BTreeMap<Slot, Vec<u8>>,
}

impl MemoryStore {
    /// Empty store.
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Number of non-empty slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot holds a value.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate occupied slots in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Slot, &Vec<u8>)> {
        self.slots.iter()
    }
}

impl StateStore for MemoryStore {
    fn read(&self, slot: &Slot) -> Option<&[u8]> {
        self.slots.get(slot).map(Vec::as_slice)
    }

    fn write(&mut self, slot: Slot, value: Vec<u8>) {
        if value.is_empty() {
            self.slots.remove(&slot);
        } else {
            self.slots.insert(slot, value);
        }
    }

    fn clear(&mut self, slot: &Slot) {
        self.slots.remove(slot);
    }
}

// ---------------------------------------------------------------------------
// Typed access
// ---------------------------------------------------------------------------

/// Copy the low-order `N` bytes of `raw` into a left-padded array.
fn right_aligned<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let take = raw.len().min(N);
    let src_start = raw.len().saturating_sub(take);
    let dst_start = N.saturating_sub(take);
    if let (Some(dst), Some(src)) = (out.get_mut(dst_start..), raw.get(src_start..)) {
        dst.copy_from_slice(src);
    }
    out
}

/// Typed reads and writes over any [`StateStore`].
pub trait StoreExt: StateStore {
    /// Address at `slot`; zero when unset.
    fn read_address(&self, slot: &Slot) -> Address {
        Address::new(right_aligned(self.read(slot).unwrap_or_default()))
    }

    /// Store an address; the zero address clears the slot.
    fn write_address(&mut self, slot: Slot, value: Address) {
        if value.is_zero() {
            self.clear(&slot);
        } else {
            self.write(slot, value.as_bytes().to_vec());
        }
    }

    /// Boolean at `slot`: true when any stored byte is non-zero.
    fn read_bool(&self, slot: &Slot) -> bool {
        self.read(slot)
            .is_some_and(|raw| raw.iter().any(|b| *b != 0))
    }

    /// Store a boolean; `false` clears the slot.
    fn write_bool(&mut self, slot: Slot, value: bool) {
        if value {
            self.write(slot, vec![1]);
        } else {
            self.clear(&slot);
        }
    }

    /// Unsigned integer at `slot` (big-endian); zero when unset.
    fn read_u64(&self, slot: &Slot) -> u64 {
        u64::from_be_bytes(right_aligned(self.read(slot).unwrap_or_default()))
    }

    /// Store an unsigned integer; zero clears the slot.
    fn write_u64(&mut self, slot: Slot, value: u64) {
        if value == 0 {
            self.clear(&slot);
        } else {
            self.write(slot, value.to_be_bytes().to_vec());
        }
    }

    /// UTF-8 text at `slot`, lossily decoded; empty when unset.
    fn read_string(&self, slot: &Slot) -> String {
        self.read(slot)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .unwrap_or_default()
    }

    /// Store text; the empty string clears the slot.
    fn write_string(&mut self, slot: Slot, value: &str) {
        self.write(slot, value.as_bytes().to_vec());
    }

    /// Transaction id at `slot`; all-zero when unset.
    fn read_tx_id(&self, slot: &Slot) -> TxId {
        TxId::new(right_aligned(self.read(slot).unwrap_or_default()))
    }

    /// Store a transaction id.
    fn write_tx_id(&mut self, slot: Slot, value: TxId) {
        self.write(slot, value.as_bytes().to_vec());
    }
}

impl<S: StateStore + ?Sized> StoreExt for S {}
