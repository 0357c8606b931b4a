//! Shared safety-verdict registry.
//!
//! Records are addressed by `(module, content-hash)`, so redeploying or
//! changing the code at an address yields a fresh, `Unknown` pair until it is
//! reviewed again. Only publishers write; the owner curates the publisher
//! list. Every record write is remembered in a bounded newest-first history.
//!
//! Swap records form a second, independent namespace answering "is migrating
//! from X to Y safe". The guard never consults them; [`crate::adoption`] does.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::module::CodeSource;
use crate::ring::RingBuffer;
use crate::types::{Address, Annotation, CodeHash, Verdict};

/// Recent-pair history length used when none is configured.
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A module identity bound to one version of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModulePair {
    /// Module address.
    pub module: Address,
    /// Content-hash of the reviewed code.
    pub code_hash: CodeHash,
}

impl ModulePair {
    /// Pair a module with a content-hash.
    pub fn new(module: Address, code_hash: CodeHash) -> Self {
        Self { module, code_hash }
    }

    /// Pair a module with its live content-hash.
    pub fn current(code: &dyn CodeSource, module: Address) -> Self {
        Self::new(module, code.code_hash(&module))
    }
}

/// Key of a migration-compatibility record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapKey {
    /// Module being migrated away from.
    pub from: ModulePair,
    /// Module being migrated to.
    pub to: ModulePair,
}

/// A stored verdict with reviewer notes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Review outcome.
    pub verdict: Verdict,
    /// Reviewer notes.
    #[serde(flatten)]
    pub annotation: Annotation,
    /// Host time of the last write; zero for never-written records.
    pub updated_at: u64,
}

impl Record {
    /// Whether this record was ever written.
    pub fn exists(&self) -> bool {
        self.updated_at != 0 || self.verdict != Verdict::Unknown
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Caller is not the registry owner.
    #[error("{caller} is not the registry owner")]
    NotOwner {
        /// Rejected caller.
        caller: Address,
    },

    /// Caller is not on the publisher allowlist.
    #[error("{caller} is not an allowed publisher")]
    NotPublisher {
        /// Rejected caller.
        caller: Address,
    },

    /// A module or owner argument was the zero address.
    #[error("zero address")]
    ZeroAddress,

    /// The module has no deployed code to hash.
    #[error("no code deployed at {module}")]
    NoCode {
        /// Module that was looked up.
        module: Address,
    },

    /// History index past the number of stored entries.
    #[error("index {index} out of bounds for {len} entries")]
    IndexOutOfBounds {
        /// Requested newest-first index.
        index: usize,
        /// Number of stored entries.
        len: usize,
    },
}

// ---------------------------------------------------------------------------
// VerdictRegistry
// ---------------------------------------------------------------------------

/// Publisher-gated store of module and swap verdicts.
#[derive(Debug, Clone)]
pub struct VerdictRegistry {
    owner: Address,
    publishers: HashSet<Address>,
    records: HashMap<ModulePair, Record>,
    swaps: HashMap<SwapKey, Record>,
    recent: RingBuffer<ModulePair>,
}

impl VerdictRegistry {
    /// Registry owned by `owner`, who starts as the only publisher.
    pub fn new(owner: Address, recent_capacity: NonZeroUsize) -> Self {
        let mut publishers = HashSet::new();
        publishers.insert(owner);
        Self {
            owner,
            publishers,
            records: HashMap::new(),
            swaps: HashMap::new(),
            recent: RingBuffer::new(recent_capacity),
        }
    }

    /// Registry with the default history length.
    pub fn with_default_capacity(owner: Address) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_RECENT_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::new(owner, capacity)
    }

    // ── Administration ──

    /// Current owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether `who` may write verdicts.
    pub fn is_publisher(&self, who: Address) -> bool {
        self.publishers.contains(&who)
    }

    /// Add or remove a publisher.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotOwner`] unless `caller` is the owner.
    pub fn set_publisher(
        &mut self,
        caller: Address,
        publisher: Address,
        allowed: bool,
    ) -> Result<(), RegistryError> {
        self.require_owner(caller)?;
        if allowed {
            self.publishers.insert(publisher);
        } else {
            self.publishers.remove(&publisher);
        }
        info!(%publisher, allowed, "registry publisher updated");
        Ok(())
    }

    /// Hand the registry to `new_owner`. Publisher rights are not transferred.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotOwner`] unless `caller` is the owner;
    /// [`RegistryError::ZeroAddress`] for a zero `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        info!(from = %self.owner, to = %new_owner, "registry ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    // ── Module records ──

    /// Write the verdict for an explicit `(module, code_hash)` pair.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotPublisher`] for unauthorised callers;
    /// [`RegistryError::ZeroAddress`] for a zero module.
    pub fn set_record(
        &mut self,
        caller: Address,
        pair: ModulePair,
        verdict: Verdict,
        annotation: Annotation,
        now: u64,
    ) -> Result<(), RegistryError> {
        self.require_publisher(caller)?;
        if pair.module.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.records.insert(
            pair,
            Record {
                verdict,
                annotation,
                updated_at: now,
            },
        );
        self.recent.push(pair);
        info!(
            module = %pair.module,
            code_hash = %pair.code_hash,
            ?verdict,
            "registry record written"
        );
        Ok(())
    }

    /// Write the verdict for `module`'s live code. Returns the pair written.
    ///
    /// # Errors
    ///
    /// As [`set_record`](Self::set_record), plus [`RegistryError::NoCode`]
    /// when nothing is deployed at `module`.
    pub fn set_record_current(
        &mut self,
        caller: Address,
        code: &dyn CodeSource,
        module: Address,
        verdict: Verdict,
        annotation: Annotation,
        now: u64,
    ) -> Result<ModulePair, RegistryError> {
        self.require_publisher(caller)?;
        let pair = self.live_pair(code, module)?;
        self.set_record(caller, pair, verdict, annotation, now)?;
        Ok(pair)
    }

    /// Record for a pair; an empty `Unknown` record when never written.
    pub fn record(&self, pair: &ModulePair) -> Record {
        self.records.get(pair).cloned().unwrap_or_default()
    }

    /// Record for `module`'s live code, with the resolved pair.
    pub fn record_current(&self, code: &dyn CodeSource, module: Address) -> (Record, ModulePair) {
        let pair = ModulePair::current(code, module);
        (self.record(&pair), pair)
    }

    /// Verdict for a pair.
    pub fn verdict(&self, pair: &ModulePair) -> Verdict {
        self.records
            .get(pair)
            .map_or(Verdict::Unknown, |r| r.verdict)
    }

    /// Whether a pair is cleared to run.
    pub fn is_safe(&self, pair: &ModulePair) -> bool {
        self.verdict(pair) == Verdict::Safe
    }

    /// Whether `module`'s live code is cleared to run. This is the guard's check.
    pub fn is_safe_current(&self, code: &dyn CodeSource, module: Address) -> bool {
        let pair = ModulePair::current(code, module);
        let safe = self.is_safe(&pair);
        debug!(%module, code_hash = %pair.code_hash, safe, "registry safety lookup");
        safe
    }

    // ── History ──

    /// Last written pairs, newest first.
    pub fn recent_pairs(&self) -> Vec<ModulePair> {
        self.recent.newest_first()
    }

    /// Pair at newest-first `index`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::IndexOutOfBounds`] when `index` is past the history.
    pub fn recent_pair_at(&self, index: usize) -> Result<ModulePair, RegistryError> {
        self.recent
            .get(index)
            .copied()
            .ok_or(RegistryError::IndexOutOfBounds {
                index,
                len: self.recent.len(),
            })
    }

    /// Recent pairs joined with their current records, newest first.
    pub fn recent_records(&self) -> Vec<(ModulePair, Record)> {
        self.recent
            .newest_first()
            .into_iter()
            .map(|pair| {
                let record = self.record(&pair);
                (pair, record)
            })
            .collect()
    }

    /// History length.
    pub fn recent_capacity(&self) -> usize {
        self.recent.capacity()
    }

    // ── Swap records ──

    /// Write a migration verdict for an explicit key.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotPublisher`] for unauthorised callers;
    /// [`RegistryError::ZeroAddress`] when either module is zero.
    pub fn set_swap_record(
        &mut self,
        caller: Address,
        key: SwapKey,
        verdict: Verdict,
        annotation: Annotation,
        now: u64,
    ) -> Result<(), RegistryError> {
        self.require_publisher(caller)?;
        if key.from.module.is_zero() || key.to.module.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.swaps.insert(
            key,
            Record {
                verdict,
                annotation,
                updated_at: now,
            },
        );
        info!(
            from = %key.from.module,
            to = %key.to.module,
            ?verdict,
            "registry swap record written"
        );
        Ok(())
    }

    /// Write a migration verdict between the live code of two modules.
    ///
    /// # Errors
    ///
    /// As [`set_swap_record`](Self::set_swap_record), plus
    /// [`RegistryError::NoCode`] when either module has no code.
    #[allow(clippy::too_many_arguments)]
    pub fn set_swap_record_current(
        &mut self,
        caller: Address,
        code: &dyn CodeSource,
        from: Address,
        to: Address,
        verdict: Verdict,
        annotation: Annotation,
        now: u64,
    ) -> Result<SwapKey, RegistryError> {
        self.require_publisher(caller)?;
        let key = SwapKey {
            from: self.live_pair(code, from)?,
            to: self.live_pair(code, to)?,
        };
        self.set_swap_record(caller, key, verdict, annotation, now)?;
        Ok(key)
    }

    /// Migration record for a key; empty `Unknown` record when never written.
    pub fn swap_record(&self, key: &SwapKey) -> Record {
        self.swaps.get(key).cloned().unwrap_or_default()
    }

    /// Migration record between the live code of two modules, with the key.
    pub fn swap_record_current(
        &self,
        code: &dyn CodeSource,
        from: Address,
        to: Address,
    ) -> (Record, SwapKey) {
        let key = SwapKey {
            from: ModulePair::current(code, from),
            to: ModulePair::current(code, to),
        };
        (self.swap_record(&key), key)
    }

    // ── Internals ──

    fn live_pair(&self, code: &dyn CodeSource, module: Address) -> Result<ModulePair, RegistryError> {
        if module.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        let pair = ModulePair::current(code, module);
        if pair.code_hash.is_zero() {
            return Err(RegistryError::NoCode { module });
        }
        Ok(pair)
    }

    fn require_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(RegistryError::NotOwner { caller })
        }
    }

    fn require_publisher(&self, caller: Address) -> Result<(), RegistryError> {
        if self.is_publisher(caller) {
            Ok(())
        } else {
            Err(RegistryError::NotPublisher { caller })
        }
    }
}
