//! In-process host for guarded accounts.
//!
//! Owns every account's storage, the deployed modules, the token ledger, the
//! registry, the fee policy and a clock. Each guard entry runs inside a
//! checkpoint: the account's storage and the token ledger are cloned before
//! the call and restored if it returns an error, so a failed call leaves no
//! trace, fee included.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::adoption::{self, AdoptionError, AdoptionPlan, InitParams};
use crate::config::AegisConfig;
use crate::fee::FeePolicy;
use crate::guard::{Guard, GuardEnv, GuardError, GuardView};
use crate::module::{Invocation, Module, ModuleTable};
use crate::registry::{ModulePair, RegistryError, VerdictRegistry};
use crate::storage::{MemoryStore, StateStore};
use crate::token::TokenLedger;
use crate::types::{Address, Annotation, CodeHash, Verdict};

static EMPTY_STORE: MemoryStore = MemoryStore::new();

/// Host state for any number of guarded accounts.
#[derive(Debug)]
pub struct Runtime {
    accounts: HashMap<Address, MemoryStore>,
    modules: ModuleTable,
    tokens: TokenLedger,
    registry: VerdictRegistry,
    fees: FeePolicy,
    timestamp: u64,
}

impl Runtime {
    /// Host with the given registry and fee policy, clock set to now.
    pub fn new(registry: VerdictRegistry, fees: FeePolicy) -> Self {
        let timestamp = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(1);
        Self {
            accounts: HashMap::new(),
            modules: ModuleTable::new(),
            tokens: TokenLedger::new(),
            registry,
            fees,
            timestamp,
        }
    }

    /// Host built from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration does not validate.
    pub fn from_config(config: &AegisConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let owner = config.registry.owner;
        let mut registry = VerdictRegistry::new(owner, config.recent_capacity());
        for publisher in &config.registry.publishers {
            registry.set_publisher(owner, *publisher, true)?;
        }

        let fee_owner = if config.fees.owner.is_zero() {
            owner
        } else {
            config.fees.owner
        };
        let mut fees = FeePolicy::new(fee_owner, config.fees.default_triple());
        for operator in &config.fees.operators {
            fees.set_operator(fee_owner, *operator, true)?;
        }

        tracing::info!(
            %owner,
            recent_capacity = registry.recent_capacity(),
            fees_enabled = config.fees.default_triple().is_enabled(),
            "runtime configured"
        );
        Ok(Self::new(registry, fees))
    }

    // ── Clock ──

    /// Current host time, seconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Move the clock forward.
    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    // ── Code ──

    /// Deploy `module` at `address`. Returns its content-hash.
    pub fn deploy(&mut self, address: Address, module: Arc<dyn Module>) -> CodeHash {
        let code_hash = self.modules.deploy(address, module);
        debug!(%address, %code_hash, "module deployed");
        code_hash
    }

    /// Remove the code at `address`.
    pub fn destroy(&mut self, address: &Address) -> bool {
        self.modules.destroy(address).is_some()
    }

    /// Deployed modules.
    pub fn modules(&self) -> &ModuleTable {
        &self.modules
    }

    // ── Shared state ──

    /// Token balances.
    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    /// Token balances, for funding fixtures.
    pub fn tokens_mut(&mut self) -> &mut TokenLedger {
        &mut self.tokens
    }

    /// The verdict registry.
    pub fn registry(&self) -> &VerdictRegistry {
        &self.registry
    }

    /// The verdict registry, for administration.
    pub fn registry_mut(&mut self) -> &mut VerdictRegistry {
        &mut self.registry
    }

    /// The fee policy.
    pub fn fees(&self) -> &FeePolicy {
        &self.fees
    }

    /// The fee policy, for administration.
    pub fn fees_mut(&mut self) -> &mut FeePolicy {
        &mut self.fees
    }

    /// Storage of `account`; empty if never touched.
    pub fn storage(&self, account: &Address) -> &dyn StateStore {
        self.accounts.get(account).unwrap_or(&EMPTY_STORE)
    }

    /// Storage of `account`, created on first use.
    pub fn storage_mut(&mut self, account: Address) -> &mut MemoryStore {
        self.accounts.entry(account).or_default()
    }

    /// Read-only guard accessors for `account`.
    pub fn view(&self, account: Address) -> GuardView<'_> {
        GuardView::new(account, self.storage(&account), &self.fees)
    }

    // ── Guarded calls ──

    /// Send `invocation` from `caller` to `account`, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Whatever the guard returns; every effect is rolled back first.
    pub fn call(
        &mut self,
        caller: Address,
        account: Address,
        invocation: &Invocation,
    ) -> Result<serde_json::Value, GuardError> {
        self.transact(caller, account, |guard| guard.dispatch(invocation))
    }

    /// Run `f` against the guard of `account`, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns; every effect is rolled back first.
    pub fn transact<T>(
        &mut self,
        caller: Address,
        account: Address,
        f: impl FnOnce(&mut Guard<'_>) -> Result<T, GuardError>,
    ) -> Result<T, GuardError> {
        let storage = self.accounts.entry(account).or_default();
        let storage_checkpoint = storage.clone();
        let tokens_checkpoint = self.tokens.clone();

        let mut guard = Guard::new(GuardEnv {
            account,
            caller,
            timestamp: self.timestamp,
            storage,
            registry: &self.registry,
            fees: &self.fees,
            modules: &self.modules,
            tokens: &mut self.tokens,
        });
        let result = f(&mut guard);

        if let Err(err) = &result {
            debug!(%account, %caller, error = %err, "call reverted; restoring checkpoint");
            self.accounts.insert(account, storage_checkpoint);
            self.tokens = tokens_checkpoint;
        }
        result
    }

    // ── Registry shortcuts ──

    /// Publish a verdict for `module`'s live code at the host clock.
    ///
    /// # Errors
    ///
    /// As [`VerdictRegistry::set_record_current`].
    pub fn publish(
        &mut self,
        publisher: Address,
        module: Address,
        verdict: Verdict,
        annotation: Annotation,
    ) -> Result<ModulePair, RegistryError> {
        self.registry.set_record_current(
            publisher,
            &self.modules,
            module,
            verdict,
            annotation,
            self.timestamp,
        )
    }

    /// Plan adopting `candidate` on `account` from the account's current state.
    ///
    /// # Errors
    ///
    /// As [`adoption::plan_adoption`].
    pub fn plan_adoption(
        &self,
        account: Address,
        candidate: Address,
        init: InitParams,
    ) -> Result<AdoptionPlan, AdoptionError> {
        let current = self.view(account).implementation();
        adoption::plan_adoption(&self.registry, &self.modules, current, candidate, init)
    }
}
