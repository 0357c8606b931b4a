//! The per-account gatekeeper.
//!
//! An account delegates to the guard; the guard keeps a pointer to the
//! active module and forwards every invocation it does not handle itself
//! into that module, with the account's own storage as the module's storage.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──init──▶ Active ──freeze / mutation──▶ Frozen
//!                            ▲                            │
//!                            └──────── unfreeze ──────────┘
//! ```
//!
//! `Frozen` blocks both forwarding paths and the self-call administration
//! methods, but never `freeze`, `unfreeze` or recovery rotation.
//!
//! # Containment, not prevention
//!
//! Before each forwarded call the guard snapshots its own slots (see
//! [`layout::GUARDED_SLOTS`]) and compares them once the module returns. A
//! difference freezes the account with [`MUTATION_FREEZE_REASON`], but the
//! triggering call still succeeds and every effect it had stays committed,
//! including the tampered slots. The freeze stops the *next* call. The check
//! only runs after a successful module call; a reverting module rolls
//! everything back through the host instead.
//!
//! # Atomicity
//!
//! Methods here may leave partial writes behind when they return `Err`
//! (the fee is charged before the module runs). Callers go through
//! [`crate::runtime::Runtime`], which restores the account storage and token
//! ledger on any error.

pub mod layout;
pub mod notes;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use self::layout::{
    ConfigSnapshot, GuardConfig, FREEZE_REASON_SLOT, FROZEN_SLOT, IMPLEMENTATION_SLOT,
    NONCE_SLOT, RECOVERY_SLOT, SENTINEL_SLOT,
};
use self::notes::TxNote;
use crate::fee::{FeeConfig, FeePolicy};
use crate::module::{CodeSource, Invocation, ModuleContext, ModuleRevert, ModuleTable};
use crate::registry::VerdictRegistry;
use crate::storage::{StateStore, StoreExt};
use crate::token::{TokenError, TokenLedger};
use crate::types::{Address, Annotation, CodeHash, TxId};

/// Freeze reason written when a module touches guard-owned slots.
pub const MUTATION_FREEZE_REASON: &str = "illegal config mutation by module";

/// Method names the guard handles itself. Anything else is forwarded.
pub mod methods {
    /// `init(module, recovery, sentinel)`.
    pub const INIT: &str = "aegis_init";
    /// `set_implementation(module)`.
    pub const SET_IMPLEMENTATION: &str = "aegis_setImplementation";
    /// `force_set_implementation(module)`.
    pub const FORCE_SET_IMPLEMENTATION: &str = "aegis_forceSetImplementation";
    /// `set_recovery(recovery)`.
    pub const SET_RECOVERY: &str = "aegis_setRecovery";
    /// `set_sentinel(sentinel)`.
    pub const SET_SENTINEL: &str = "aegis_setSentinel";
    /// `freeze(reason)`.
    pub const FREEZE: &str = "aegis_freeze";
    /// `unfreeze()`.
    pub const UNFREEZE: &str = "aegis_unfreeze";
    /// `force_execute(payload)`.
    pub const FORCE_EXECUTE: &str = "aegis_forceExecute";
    /// `set_tx_note(tx_id, annotation)`.
    pub const SET_TX_NOTE: &str = "aegis_setTxNote";
    /// `freeze_with_tx_note(tx_id, annotation, reason)`.
    pub const FREEZE_WITH_TX_NOTE: &str = "aegis_freezeWithTxNote";
    /// Active module address.
    pub const GET_IMPLEMENTATION: &str = "aegis_getImplementation";
    /// Frozen flag.
    pub const IS_FROZEN: &str = "aegis_isFrozen";
    /// Freeze reason.
    pub const GET_FREEZE_REASON: &str = "aegis_getFreezeReason";
    /// Recovery principal.
    pub const GET_RECOVERY: &str = "aegis_getRecovery";
    /// Sentinel principal.
    pub const GET_SENTINEL: &str = "aegis_getSentinel";
    /// Fee triple applying to this account.
    pub const GET_FEE_CONFIG: &str = "aegis_getFeeConfig";
    /// Audit note for a transaction.
    pub const GET_TX_NOTE: &str = "aegis_getTxNote";
    /// Noted transactions, newest first.
    pub const GET_RECENT_TXS: &str = "aegis_getRecentTxs";
    /// Noted transaction at a newest-first index.
    pub const GET_RECENT_TX_AT: &str = "aegis_getRecentTxAt";
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a guard entrypoint rejected a call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GuardError {
    /// The account is frozen.
    #[error("account is frozen: {reason}")]
    Frozen {
        /// Stored freeze reason.
        reason: String,
    },

    /// The method is self-call only.
    #[error("{caller} is not the account itself")]
    NotSelf {
        /// Rejected caller.
        caller: Address,
    },

    /// The method needs the recovery principal.
    #[error("{caller} is not the recovery principal")]
    NotRecovery {
        /// Rejected caller.
        caller: Address,
    },

    /// The method needs the sentinel (or, for `freeze`, the account itself).
    #[error("{caller} is not the sentinel")]
    NotSentinel {
        /// Rejected caller.
        caller: Address,
    },

    /// The registry does not report the module's live code as safe.
    #[error("module {module} with code {code_hash} is not marked safe")]
    UnsafeImplementation {
        /// Module that was checked.
        module: Address,
        /// Its live content-hash.
        code_hash: CodeHash,
    },

    /// No module is active.
    #[error("no implementation set")]
    ImplementationNotSet,

    /// The per-call fee could not be charged.
    #[error("fee transfer failed: {0}")]
    FeeTransferFailed(#[source] TokenError),

    /// `init` already ran for this account.
    #[error("guard already initialized")]
    AlreadyInitialized,

    /// A module changed guard-owned slots during a forwarded call.
    #[error("illegal config mutation by module")]
    IllegalConfigMutation,

    /// A required address argument was zero.
    #[error("zero address")]
    ZeroAddress,

    /// Note history index past the number of stored notes.
    #[error("index {index} out of bounds for {len} entries")]
    IndexOutOfBounds {
        /// Requested newest-first index.
        index: usize,
        /// Number of stored notes.
        len: usize,
    },

    /// Arguments to a guard method did not decode.
    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments {
        /// Guard method name.
        method: String,
        /// Decoder message.
        reason: String,
    },

    /// The active module reverted; passed through unchanged.
    #[error(transparent)]
    Module(#[from] ModuleRevert),
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Everything one guard call can see and touch.
pub struct GuardEnv<'a> {
    /// The account the guard runs as.
    pub account: Address,
    /// Whoever called the account.
    pub caller: Address,
    /// Host clock, seconds.
    pub timestamp: u64,
    /// The account's storage, shared with the active module.
    pub storage: &'a mut dyn StateStore,
    /// Shared verdict registry.
    pub registry: &'a VerdictRegistry,
    /// Fee policy.
    pub fees: &'a FeePolicy,
    /// Deployed modules.
    pub modules: &'a ModuleTable,
    /// Token balances.
    pub tokens: &'a mut TokenLedger,
}

impl std::fmt::Debug for GuardEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardEnv")
            .field("account", &self.account)
            .field("caller", &self.caller)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// The guard bound to one account and one caller.
#[derive(Debug)]
pub struct Guard<'a> {
    env: GuardEnv<'a>,
}

impl<'a> Guard<'a> {
    /// Bind the guard to an environment.
    pub fn new(env: GuardEnv<'a>) -> Self {
        Self { env }
    }

    /// Read-only accessors over the same account.
    pub fn view(&self) -> GuardView<'_> {
        GuardView::new(self.env.account, &*self.env.storage, self.env.fees)
    }

    // ── Administration ──

    /// First-time setup: adopt `module` (which must be marked safe), set the
    /// recovery and sentinel principals, and clear any frozen state.
    ///
    /// # Errors
    ///
    /// `NotSelf`, `AlreadyInitialized`, `ZeroAddress` for a zero module or
    /// recovery, `UnsafeImplementation`.
    pub fn init(
        &mut self,
        module: Address,
        recovery: Address,
        sentinel: Address,
    ) -> Result<(), GuardError> {
        self.require_self()?;
        let storage = &*self.env.storage;
        if !storage.read_address(&RECOVERY_SLOT).is_zero()
            || !storage.read_address(&IMPLEMENTATION_SLOT).is_zero()
        {
            return Err(GuardError::AlreadyInitialized);
        }
        if module.is_zero() || recovery.is_zero() {
            return Err(GuardError::ZeroAddress);
        }
        self.require_safe(module)?;

        let storage = &mut *self.env.storage;
        storage.write_bool(FROZEN_SLOT, false);
        storage.write_string(FREEZE_REASON_SLOT, "");
        storage.write_address(RECOVERY_SLOT, recovery);
        storage.write_address(SENTINEL_SLOT, sentinel);
        storage.write_address(IMPLEMENTATION_SLOT, module);
        info!(
            account = %self.env.account,
            %module,
            %recovery,
            %sentinel,
            "guard initialized"
        );
        Ok(())
    }

    /// Switch to `module`, which must be marked safe for its live code.
    ///
    /// # Errors
    ///
    /// `NotSelf`, `Frozen`, `ZeroAddress`, `UnsafeImplementation`.
    pub fn set_implementation(&mut self, module: Address) -> Result<(), GuardError> {
        self.adopt(module, true)
    }

    /// Switch to `module` without consulting the registry.
    ///
    /// # Errors
    ///
    /// `NotSelf`, `Frozen`, `ZeroAddress`.
    pub fn force_set_implementation(&mut self, module: Address) -> Result<(), GuardError> {
        self.adopt(module, false)
    }

    /// Rotate the recovery principal. Self-call while active; only the
    /// current recovery principal while frozen.
    ///
    /// # Errors
    ///
    /// `NotSelf` or `NotRecovery` depending on state, `ZeroAddress`.
    pub fn set_recovery(&mut self, recovery: Address) -> Result<(), GuardError> {
        let config = self.config();
        if config.frozen {
            if self.env.caller != config.recovery {
                return Err(GuardError::NotRecovery {
                    caller: self.env.caller,
                });
            }
        } else {
            self.require_self()?;
        }
        if recovery.is_zero() {
            return Err(GuardError::ZeroAddress);
        }
        self.env.storage.write_address(RECOVERY_SLOT, recovery);
        info!(account = %self.env.account, %recovery, frozen = config.frozen, "recovery rotated");
        Ok(())
    }

    /// Replace the sentinel. The zero address disables it.
    ///
    /// # Errors
    ///
    /// `NotSelf`, `Frozen`.
    pub fn set_sentinel(&mut self, sentinel: Address) -> Result<(), GuardError> {
        self.require_self()?;
        self.require_not_frozen()?;
        self.env.storage.write_address(SENTINEL_SLOT, sentinel);
        info!(account = %self.env.account, %sentinel, "sentinel updated");
        Ok(())
    }

    /// Block forwarding until the recovery principal unfreezes. Calling it
    /// again on a frozen account just replaces the reason.
    ///
    /// # Errors
    ///
    /// `NotSentinel` unless the caller is the account or its sentinel.
    pub fn freeze(&mut self, reason: &str) -> Result<(), GuardError> {
        if self.env.caller != self.env.account && !self.is_sentinel() {
            return Err(GuardError::NotSentinel {
                caller: self.env.caller,
            });
        }
        self.write_frozen(reason);
        info!(account = %self.env.account, caller = %self.env.caller, reason, "account frozen");
        Ok(())
    }

    /// Lift a freeze and clear its reason.
    ///
    /// # Errors
    ///
    /// `NotRecovery` unless the caller is the recovery principal.
    pub fn unfreeze(&mut self) -> Result<(), GuardError> {
        let recovery = self.env.storage.read_address(&RECOVERY_SLOT);
        if recovery.is_zero() || self.env.caller != recovery {
            return Err(GuardError::NotRecovery {
                caller: self.env.caller,
            });
        }
        self.env.storage.write_bool(FROZEN_SLOT, false);
        self.env.storage.write_string(FREEZE_REASON_SLOT, "");
        info!(account = %self.env.account, "account unfrozen");
        Ok(())
    }

    // ── Audit notes ──

    /// Attach an audit note to a transaction.
    ///
    /// # Errors
    ///
    /// `NotSentinel` unless the caller is the configured sentinel.
    pub fn set_tx_note(&mut self, tx: TxId, annotation: Annotation) -> Result<(), GuardError> {
        self.require_sentinel()?;
        notes::write(&mut *self.env.storage, tx, annotation, self.env.timestamp);
        debug!(account = %self.env.account, %tx, "audit note written");
        Ok(())
    }

    /// Attach an audit note and freeze in one step.
    ///
    /// # Errors
    ///
    /// `NotSentinel` unless the caller is the configured sentinel.
    pub fn freeze_with_tx_note(
        &mut self,
        tx: TxId,
        annotation: Annotation,
        reason: &str,
    ) -> Result<(), GuardError> {
        self.require_sentinel()?;
        notes::write(&mut *self.env.storage, tx, annotation, self.env.timestamp);
        self.write_frozen(reason);
        info!(account = %self.env.account, %tx, reason, "account frozen with audit note");
        Ok(())
    }

    // ── Execution ──

    /// Forward an invocation to the active module after the registry check.
    ///
    /// # Errors
    ///
    /// `Frozen`, `ImplementationNotSet`, `UnsafeImplementation`,
    /// `FeeTransferFailed`, or the module's own revert.
    pub fn forward(&mut self, invocation: &Invocation) -> Result<Value, GuardError> {
        self.execute(invocation, true)
    }

    /// Forward an invocation without the registry check. Self-call only; the
    /// frozen gate, the fee and the mutation check still apply.
    ///
    /// # Errors
    ///
    /// `NotSelf`, then as [`forward`](Self::forward) minus
    /// `UnsafeImplementation`.
    pub fn force_execute(&mut self, payload: &Invocation) -> Result<Value, GuardError> {
        self.require_self()?;
        self.execute(payload, false)
    }

    /// Route an invocation: guard methods are handled here, everything else
    /// is forwarded to the active module.
    ///
    /// # Errors
    ///
    /// Whatever the selected method returns, or `InvalidArguments`.
    pub fn dispatch(&mut self, invocation: &Invocation) -> Result<Value, GuardError> {
        match invocation.method.as_str() {
            methods::INIT => {
                let args: InitArgs = decode(invocation)?;
                self.init(args.module, args.recovery, args.sentinel)?;
                Ok(Value::Null)
            }
            methods::SET_IMPLEMENTATION => {
                let args: ModuleArgs = decode(invocation)?;
                self.set_implementation(args.module)?;
                Ok(Value::Null)
            }
            methods::FORCE_SET_IMPLEMENTATION => {
                let args: ModuleArgs = decode(invocation)?;
                self.force_set_implementation(args.module)?;
                Ok(Value::Null)
            }
            methods::SET_RECOVERY => {
                let args: RecoveryArgs = decode(invocation)?;
                self.set_recovery(args.recovery)?;
                Ok(Value::Null)
            }
            methods::SET_SENTINEL => {
                let args: SentinelArgs = decode(invocation)?;
                self.set_sentinel(args.sentinel)?;
                Ok(Value::Null)
            }
            methods::FREEZE => {
                let args: FreezeArgs = decode_or_default(invocation)?;
                self.freeze(&args.reason)?;
                Ok(Value::Null)
            }
            methods::UNFREEZE => {
                self.unfreeze()?;
                Ok(Value::Null)
            }
            methods::FORCE_EXECUTE => {
                let args: ForceExecuteArgs = decode(invocation)?;
                self.force_execute(&args.payload)
            }
            methods::SET_TX_NOTE => {
                let args: TxNoteArgs = decode(invocation)?;
                self.set_tx_note(args.tx_id, args.annotation)?;
                Ok(Value::Null)
            }
            methods::FREEZE_WITH_TX_NOTE => {
                let args: TxNoteArgs = decode(invocation)?;
                self.freeze_with_tx_note(args.tx_id, args.annotation, &args.reason)?;
                Ok(Value::Null)
            }
            methods::GET_IMPLEMENTATION => Ok(json!(self.view().implementation())),
            methods::IS_FROZEN => Ok(json!(self.view().is_frozen())),
            methods::GET_FREEZE_REASON => Ok(json!(self.view().freeze_reason())),
            methods::GET_RECOVERY => Ok(json!(self.view().recovery())),
            methods::GET_SENTINEL => Ok(json!(self.view().sentinel())),
            methods::GET_FEE_CONFIG => Ok(json!(self.view().fee_config())),
            methods::GET_TX_NOTE => {
                let args: TxIdArgs = decode(invocation)?;
                Ok(json!(self.view().tx_note(&args.tx_id)))
            }
            methods::GET_RECENT_TXS => Ok(json!(self.view().recent_txs())),
            methods::GET_RECENT_TX_AT => {
                let args: IndexArgs = decode(invocation)?;
                Ok(json!(self.view().recent_tx_at(args.index)?))
            }
            _ => self.forward(invocation),
        }
    }

    // ── Internals ──

    fn execute(&mut self, payload: &Invocation, check_safety: bool) -> Result<Value, GuardError> {
        self.require_not_frozen()?;

        let module = self.env.storage.read_address(&IMPLEMENTATION_SLOT);
        if module.is_zero() {
            return Err(GuardError::ImplementationNotSet);
        }
        if check_safety {
            self.require_safe(module)?;
        }

        let before = ConfigSnapshot::capture(&*self.env.storage);

        self.charge_fee()?;

        debug!(
            account = %self.env.account,
            %module,
            method = %payload.method,
            checked = check_safety,
            "forwarding to module"
        );
        let result = match self.env.modules.get(&module) {
            Some(code) => {
                let mut ctx = ModuleContext {
                    account: self.env.account,
                    caller: self.env.caller,
                    timestamp: self.env.timestamp,
                    storage: &mut *self.env.storage,
                    tokens: &mut *self.env.tokens,
                };
                code.call(&mut ctx, payload)?
            }
            // Calling an address without code succeeds and does nothing.
            None => Value::Null,
        };

        let after = ConfigSnapshot::capture(&*self.env.storage);
        if let Err(err) = verify_unchanged(&before, &after, module) {
            self.write_frozen(&err.to_string());
        }
        Ok(result)
    }

    fn adopt(&mut self, module: Address, check_safety: bool) -> Result<(), GuardError> {
        self.require_self()?;
        self.require_not_frozen()?;
        if module.is_zero() {
            return Err(GuardError::ZeroAddress);
        }
        if check_safety {
            self.require_safe(module)?;
        }
        let previous = self.env.storage.read_address(&IMPLEMENTATION_SLOT);
        self.env.storage.write_address(IMPLEMENTATION_SLOT, module);
        info!(
            account = %self.env.account,
            from = %previous,
            to = %module,
            checked = check_safety,
            "implementation changed"
        );
        Ok(())
    }

    fn charge_fee(&mut self) -> Result<(), GuardError> {
        let fee = self.env.fees.fee_config(self.env.account);
        if !fee.is_enabled() {
            return Ok(());
        }
        self.env
            .tokens
            .transfer(fee.token, self.env.account, fee.recipient, fee.amount_per_call)
            .map_err(|e| {
                warn!(account = %self.env.account, error = %e, "fee charge failed");
                GuardError::FeeTransferFailed(e)
            })
    }

    fn write_frozen(&mut self, reason: &str) {
        self.env.storage.write_bool(FROZEN_SLOT, true);
        self.env.storage.write_string(FREEZE_REASON_SLOT, reason);
    }

    fn config(&self) -> GuardConfig {
        GuardConfig::load(&*self.env.storage)
    }

    fn is_sentinel(&self) -> bool {
        let sentinel = self.env.storage.read_address(&SENTINEL_SLOT);
        !sentinel.is_zero() && self.env.caller == sentinel
    }

    fn require_self(&self) -> Result<(), GuardError> {
        if self.env.caller == self.env.account {
            Ok(())
        } else {
            Err(GuardError::NotSelf {
                caller: self.env.caller,
            })
        }
    }

    fn require_sentinel(&self) -> Result<(), GuardError> {
        if self.is_sentinel() {
            Ok(())
        } else {
            Err(GuardError::NotSentinel {
                caller: self.env.caller,
            })
        }
    }

    fn require_not_frozen(&self) -> Result<(), GuardError> {
        if self.env.storage.read_bool(&FROZEN_SLOT) {
            Err(GuardError::Frozen {
                reason: self.env.storage.read_string(&FREEZE_REASON_SLOT),
            })
        } else {
            Ok(())
        }
    }

    fn require_safe(&self, module: Address) -> Result<(), GuardError> {
        if self.env.registry.is_safe_current(self.env.modules, module) {
            return Ok(());
        }
        let code_hash = self.env.modules.code_hash(&module);
        warn!(account = %self.env.account, %module, %code_hash, "module not marked safe");
        Err(GuardError::UnsafeImplementation { module, code_hash })
    }
}

fn verify_unchanged(
    before: &ConfigSnapshot,
    after: &ConfigSnapshot,
    module: Address,
) -> Result<(), GuardError> {
    let changed = before.changed_fields(after);
    if changed.is_empty() {
        return Ok(());
    }
    warn!(%module, ?changed, "module mutated guard config; freezing");
    Err(GuardError::IllegalConfigMutation)
}

// ---------------------------------------------------------------------------
// Read-only view
// ---------------------------------------------------------------------------

/// Read-only guard accessors for one account.
#[derive(Clone, Copy)]
pub struct GuardView<'a> {
    account: Address,
    storage: &'a dyn StateStore,
    fees: &'a FeePolicy,
}

impl std::fmt::Debug for GuardView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardView")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl<'a> GuardView<'a> {
    /// View over `storage` belonging to `account`.
    pub fn new(account: Address, storage: &'a dyn StateStore, fees: &'a FeePolicy) -> Self {
        Self {
            account,
            storage,
            fees,
        }
    }

    /// Active module; zero before `init`.
    pub fn implementation(&self) -> Address {
        self.storage.read_address(&IMPLEMENTATION_SLOT)
    }

    /// Whether forwarding is blocked.
    pub fn is_frozen(&self) -> bool {
        self.storage.read_bool(&FROZEN_SLOT)
    }

    /// Why the account is frozen.
    pub fn freeze_reason(&self) -> String {
        self.storage.read_string(&FREEZE_REASON_SLOT)
    }

    /// Recovery principal.
    pub fn recovery(&self) -> Address {
        self.storage.read_address(&RECOVERY_SLOT)
    }

    /// Sentinel principal; zero when disabled.
    pub fn sentinel(&self) -> Address {
        self.storage.read_address(&SENTINEL_SLOT)
    }

    /// Reserved replay nonce.
    pub fn config_nonce(&self) -> u64 {
        self.storage.read_u64(&NONCE_SLOT)
    }

    /// Full decoded configuration.
    pub fn config(&self) -> GuardConfig {
        GuardConfig::load(self.storage)
    }

    /// Fee triple applying to this account.
    pub fn fee_config(&self) -> FeeConfig {
        self.fees.fee_config(self.account)
    }

    /// Audit note for `tx`; empty when none.
    pub fn tx_note(&self, tx: &TxId) -> TxNote {
        notes::read(self.storage, tx)
    }

    /// Noted transactions, newest first.
    pub fn recent_txs(&self) -> Vec<TxId> {
        notes::recent(self.storage)
    }

    /// Noted transaction at newest-first `index`.
    ///
    /// # Errors
    ///
    /// `IndexOutOfBounds` when `index` is past the stored notes.
    pub fn recent_tx_at(&self, index: usize) -> Result<TxId, GuardError> {
        notes::recent_at(self.storage, index).ok_or(GuardError::IndexOutOfBounds {
            index,
            len: notes::len(self.storage),
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatch arguments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct InitArgs {
    module: Address,
    recovery: Address,
    #[serde(default)]
    sentinel: Address,
}

#[derive(Deserialize)]
struct ModuleArgs {
    module: Address,
}

#[derive(Deserialize)]
struct RecoveryArgs {
    recovery: Address,
}

#[derive(Deserialize)]
struct SentinelArgs {
    sentinel: Address,
}

#[derive(Default, Deserialize)]
struct FreezeArgs {
    #[serde(default)]
    reason: String,
}

#[derive(Deserialize)]
struct ForceExecuteArgs {
    payload: Invocation,
}

#[derive(Deserialize)]
struct TxNoteArgs {
    tx_id: TxId,
    #[serde(default)]
    reason: String,
    #[serde(flatten)]
    annotation: Annotation,
}

#[derive(Deserialize)]
struct TxIdArgs {
    tx_id: TxId,
}

#[derive(Deserialize)]
struct IndexArgs {
    index: usize,
}

fn decode<T: DeserializeOwned>(invocation: &Invocation) -> Result<T, GuardError> {
    invocation
        .decode_args()
        .map_err(|e| GuardError::InvalidArguments {
            method: invocation.method.clone(),
            reason: e.to_string(),
        })
}

fn decode_or_default<T: DeserializeOwned + Default>(
    invocation: &Invocation,
) -> Result<T, GuardError> {
    if invocation.args.is_null() {
        Ok(T::default())
    } else {
        decode(invocation)
    }
}
