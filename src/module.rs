//! Delegated-execution contract between the guard and candidate modules.
//!
//! A module is untrusted code. When the guard forwards a call, the module
//! receives a [`ModuleContext`] whose `storage` is the *account's own*
//! [`StateStore`]: the same slots the guard keeps its configuration in. The
//! guard does not sandbox this; it snapshots its own slots before the call
//! and compares afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::StateStore;
use crate::token::TokenLedger;
use crate::types::{Address, CodeHash};

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// A call into an account: a method name plus JSON arguments.
///
/// Method names starting with `aegis_` are handled by the guard; anything
/// else is forwarded to the active module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Method selector.
    pub method: String,
    /// Method arguments, usually a JSON object.
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Invocation {
    /// Invocation with arguments.
    pub fn new(method: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Invocation without arguments.
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, serde_json::Value::Null)
    }

    /// Deserialize the arguments into `T`.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the arguments do not match `T`.
    pub fn decode_args<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.args)
    }
}

// ---------------------------------------------------------------------------
// ModuleRevert
// ---------------------------------------------------------------------------

/// A module's own failure, surfaced to the caller unmodified.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("module reverted: {reason}")]
pub struct ModuleRevert {
    /// Human-readable reason chosen by the module.
    pub reason: String,
    /// Optional structured payload chosen by the module.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ModuleRevert {
    /// Revert with a reason and no payload.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            data: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ---------------------------------------------------------------------------
// Module trait
// ---------------------------------------------------------------------------

/// Everything a module can touch during one delegated call.
pub struct ModuleContext<'a> {
    /// The delegating account, which is also the storage owner.
    pub account: Address,
    /// Original caller of the account.
    pub caller: Address,
    /// Host clock, seconds.
    pub timestamp: u64,
    /// The account's persistent storage, shared with the guard.
    pub storage: &'a mut dyn StateStore,
    /// Token balances; the module may move the account's funds.
    pub tokens: &'a mut TokenLedger,
}

impl fmt::Debug for ModuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("account", &self.account)
            .field("caller", &self.caller)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

/// Replaceable logic an account delegates to.
pub trait Module: fmt::Debug + Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Deployed code. Its SHA-256 is the module's content-hash, so any change
    /// here makes the registry treat the module as unreviewed.
    fn code(&self) -> Vec<u8>;

    /// Handle one forwarded invocation.
    ///
    /// # Errors
    ///
    /// Returns a [`ModuleRevert`]; the host rolls back every effect of the
    /// enclosing call.
    fn call(
        &self,
        ctx: &mut ModuleContext<'_>,
        invocation: &Invocation,
    ) -> Result<serde_json::Value, ModuleRevert>;
}

/// Resolves the live content-hash of an address.
pub trait CodeSource {
    /// Content-hash of the code at `address`; [`CodeHash::EMPTY`] when none.
    fn code_hash(&self, address: &Address) -> CodeHash;
}

// ---------------------------------------------------------------------------
// ModuleTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Deployed {
    module: Arc<dyn Module>,
    code_hash: CodeHash,
}

/// Code deployed at each address.
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    deployed: HashMap<Address, Deployed>,
}

impl ModuleTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `module` at `address`, replacing any previous code there.
    /// Returns the new content-hash.
    pub fn deploy(&mut self, address: Address, module: Arc<dyn Module>) -> CodeHash {
        let code_hash = CodeHash::of(&module.code());
        self.deployed.insert(address, Deployed { module, code_hash });
        code_hash
    }

    /// Remove the code at `address`.
    pub fn destroy(&mut self, address: &Address) -> Option<Arc<dyn Module>> {
        self.deployed.remove(address).map(|d| d.module)
    }

    /// Module deployed at `address`.
    pub fn get(&self, address: &Address) -> Option<Arc<dyn Module>> {
        self.deployed.get(address).map(|d| Arc::clone(&d.module))
    }

    /// Whether `address` has code.
    pub fn has_code(&self, address: &Address) -> bool {
        self.deployed.contains_key(address)
    }
}

impl CodeSource for ModuleTable {
    fn code_hash(&self, address: &Address) -> CodeHash {
        self.deployed
            .get(address)
            .map_or(CodeHash::EMPTY, |d| d.code_hash)
    }
}
