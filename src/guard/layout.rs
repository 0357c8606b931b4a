//! Where the guard keeps its state inside account storage.
//!
//! Three namespace slots, each the SHA-256 of a fixed string, fixed at
//! compile time so the layout cannot drift between versions:
//!
//! | base                  | namespace                      | contents                                  |
//! |-----------------------|--------------------------------|-------------------------------------------|
//! | [`IMPLEMENTATION_SLOT`] | `aegis.guard.implementation` | active module address                     |
//! | [`CONFIG_SLOT`]         | `aegis.guard.config`         | frozen, recovery, sentinel, nonce, reason |
//! | [`NOTES_SLOT`]          | `aegis.guard.notes`          | audit-note ring (see `notes`)             |
//!
//! A module that writes `Slot::from_index(0..)` never lands here by accident.
//! A module that writes these slots on purpose is caught by [`ConfigSnapshot`].

use serde::Serialize;

use crate::storage::{Slot, StateStore, StoreExt};
use crate::types::Address;

/// Active module pointer: `sha256("aegis.guard.implementation")`.
pub const IMPLEMENTATION_SLOT: Slot = Slot::from_bytes([
    0x31, 0x7e, 0x0d, 0xb2, 0xda, 0x46, 0xb7, 0x63, 0x3f, 0xb2, 0x4e, 0xff, 0x38, 0x8b, 0x30, 0xed,
    0x48, 0x1b, 0xf0, 0x97, 0xb2, 0xba, 0x44, 0x99, 0xff, 0xd9, 0x1b, 0x82, 0x81, 0x33, 0xb4, 0xd1,
]);

/// Guard configuration base: `sha256("aegis.guard.config")`.
pub const CONFIG_SLOT: Slot = Slot::from_bytes([
    0x6c, 0x31, 0xd5, 0x43, 0x4d, 0xf2, 0x44, 0x9c, 0x9e, 0x6a, 0x26, 0x3d, 0x83, 0x1b, 0xac, 0x50,
    0xb0, 0x63, 0xfd, 0x8b, 0x76, 0x4b, 0x5f, 0x44, 0xef, 0xb9, 0xea, 0xdf, 0x32, 0xe5, 0x4c, 0x0b,
]);

/// Audit-note base: `sha256("aegis.guard.notes")`.
pub const NOTES_SLOT: Slot = Slot::from_bytes([
    0x8f, 0x6f, 0xc1, 0x30, 0x53, 0x6d, 0xb5, 0xa7, 0x30, 0xf3, 0x8c, 0x42, 0x2d, 0x5f, 0x74, 0xf2,
    0x7f, 0x2b, 0xed, 0xb4, 0x23, 0xed, 0xed, 0x1e, 0xaf, 0x4b, 0xb7, 0x54, 0x6b, 0x78, 0x7b, 0xed,
]);

/// Frozen flag.
pub const FROZEN_SLOT: Slot = CONFIG_SLOT.offset(0);
/// Recovery principal.
pub const RECOVERY_SLOT: Slot = CONFIG_SLOT.offset(1);
/// Sentinel principal.
pub const SENTINEL_SLOT: Slot = CONFIG_SLOT.offset(2);
/// Reserved replay nonce.
pub const NONCE_SLOT: Slot = CONFIG_SLOT.offset(3);
/// Freeze reason text.
pub const FREEZE_REASON_SLOT: Slot = CONFIG_SLOT.offset(4);

/// Guard-owned slots covered by the post-call mutation check, with labels.
pub const GUARDED_SLOTS: [(&str, Slot); 6] = [
    ("implementation", IMPLEMENTATION_SLOT),
    ("frozen", FROZEN_SLOT),
    ("recovery", RECOVERY_SLOT),
    ("sentinel", SENTINEL_SLOT),
    ("config_nonce", NONCE_SLOT),
    ("freeze_reason", FREEZE_REASON_SLOT),
];

/// Decoded per-account guard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GuardConfig {
    /// Whether forwarding is blocked.
    pub frozen: bool,
    /// Why the account was frozen; empty when not frozen.
    pub freeze_reason: String,
    /// Principal allowed to unfreeze and to rotate recovery while frozen.
    pub recovery: Address,
    /// Optional monitoring principal allowed to freeze and write notes.
    pub sentinel: Address,
    /// Reserved replay counter.
    pub config_nonce: u64,
}

impl GuardConfig {
    /// Read the configuration out of account storage.
    pub fn load(store: &dyn StateStore) -> Self {
        Self {
            frozen: store.read_bool(&FROZEN_SLOT),
            freeze_reason: store.read_string(&FREEZE_REASON_SLOT),
            recovery: store.read_address(&RECOVERY_SLOT),
            sentinel: store.read_address(&SENTINEL_SLOT),
            config_nonce: store.read_u64(&NONCE_SLOT),
        }
    }
}

/// Raw bytes of every guarded slot at one point in time.
///
/// Comparison is byte-exact, so rewriting a slot with a differently encoded
/// but equal-looking value still counts as a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    slots: Vec<Option<Vec<u8>>>,
}

impl ConfigSnapshot {
    /// Capture the guarded slots.
    pub fn capture(store: &dyn StateStore) -> Self {
        Self {
            slots: GUARDED_SLOTS
                .iter()
                .map(|(_, slot)| store.read(slot).map(<[u8]>::to_vec))
                .collect(),
        }
    }

    /// Labels of the slots that differ between `self` and `later`.
    pub fn changed_fields(&self, later: &ConfigSnapshot) -> Vec<&'static str> {
        GUARDED_SLOTS
            .iter()
            .zip(self.slots.iter().zip(later.slots.iter()))
            .filter(|(_, (before, after))| before != after)
            .map(|((label, _), _)| *label)
            .collect()
    }
}
