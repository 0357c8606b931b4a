//! Adversary models.
//!
//! Each module here runs with the account's storage as its own, so it can
//! reach the guard's slots just by naming them.

use serde_json::{json, Value};

use crate::guard::layout::{FREEZE_REASON_SLOT, FROZEN_SLOT, RECOVERY_SLOT};
use crate::module::{Invocation, Module, ModuleContext, ModuleRevert};
use crate::storage::{Slot, StoreExt};
use crate::types::Address;

fn drain(ctx: &mut ModuleContext<'_>, token: Address, to: Address) -> Result<u128, ModuleRevert> {
    let balance = ctx.tokens.balance_of(token, ctx.account);
    if balance != 0 {
        ctx.tokens
            .transfer(token, ctx.account, to, balance)
            .map_err(|e| ModuleRevert::new(e.to_string()))?;
    }
    Ok(balance)
}

// ---------------------------------------------------------------------------
// SlotClobberModule
// ---------------------------------------------------------------------------

/// Overwrites one fixed slot on every call.
#[derive(Debug, Clone)]
pub struct SlotClobberModule {
    target: Slot,
    value: Vec<u8>,
}

impl SlotClobberModule {
    /// Clobber `target` with `value` (empty clears it).
    pub fn new(target: Slot, value: Vec<u8>) -> Self {
        Self { target, value }
    }
}

impl Module for SlotClobberModule {
    fn name(&self) -> &str {
        "slot-clobber"
    }

    fn code(&self) -> Vec<u8> {
        let mut code = b"aegis.sample.clobber:".to_vec();
        code.extend_from_slice(self.target.as_bytes());
        code.extend_from_slice(&self.value);
        code
    }

    fn call(&self, ctx: &mut ModuleContext<'_>, _invocation: &Invocation) -> Result<Value, ModuleRevert> {
        ctx.storage.write(self.target, self.value.clone());
        Ok(json!({ "clobbered": self.target.to_string() }))
    }
}

// ---------------------------------------------------------------------------
// HijackModule
// ---------------------------------------------------------------------------

/// Takes over recovery, lifts any freeze and drains one token.
#[derive(Debug, Clone)]
pub struct HijackModule {
    attacker: Address,
    token: Address,
}

impl HijackModule {
    /// Hijack on behalf of `attacker`, stealing `token`.
    pub fn new(attacker: Address, token: Address) -> Self {
        Self { attacker, token }
    }
}

impl Module for HijackModule {
    fn name(&self) -> &str {
        "hijack"
    }

    fn code(&self) -> Vec<u8> {
        let mut code = b"aegis.sample.hijack:".to_vec();
        code.extend_from_slice(self.attacker.as_bytes());
        code.extend_from_slice(self.token.as_bytes());
        code
    }

    fn call(&self, ctx: &mut ModuleContext<'_>, _invocation: &Invocation) -> Result<Value, ModuleRevert> {
        ctx.storage.write_address(RECOVERY_SLOT, self.attacker);
        ctx.storage.write_bool(FROZEN_SLOT, false);
        ctx.storage.write_string(FREEZE_REASON_SLOT, "");
        let stolen = drain(ctx, self.token, self.attacker)?;
        Ok(json!({ "stolen": stolen.to_string() }))
    }
}

// ---------------------------------------------------------------------------
// TimeBombModule
// ---------------------------------------------------------------------------

/// `arm` sets a flag in the module's own slot; any later call drains the
/// token. Neither call touches guard-owned slots.
#[derive(Debug, Clone)]
pub struct TimeBombModule {
    attacker: Address,
    token: Address,
}

impl TimeBombModule {
    /// Time bomb paying out to `attacker` in `token`.
    pub fn new(attacker: Address, token: Address) -> Self {
        Self { attacker, token }
    }

    /// Slot holding the armed flag.
    pub fn armed_slot() -> Slot {
        Slot::derive("aegis.sample.timebomb.armed")
    }
}

impl Module for TimeBombModule {
    fn name(&self) -> &str {
        "time-bomb"
    }

    fn code(&self) -> Vec<u8> {
        let mut code = b"aegis.sample.timebomb:".to_vec();
        code.extend_from_slice(self.attacker.as_bytes());
        code.extend_from_slice(self.token.as_bytes());
        code
    }

    fn call(&self, ctx: &mut ModuleContext<'_>, invocation: &Invocation) -> Result<Value, ModuleRevert> {
        let armed_slot = Self::armed_slot();
        if invocation.method == "arm" {
            ctx.storage.write_bool(armed_slot, true);
            return Ok(json!({ "armed": true }));
        }
        if !ctx.storage.read_bool(&armed_slot) {
            return Ok(json!({ "armed": false }));
        }
        ctx.storage.write_bool(armed_slot, false);
        let stolen = drain(ctx, self.token, self.attacker)?;
        Ok(json!({ "stolen": stolen.to_string() }))
    }
}

// ---------------------------------------------------------------------------
// RevertingModule
// ---------------------------------------------------------------------------

/// Writes storage, moves one unit of `token`, then reverts.
#[derive(Debug, Clone)]
pub struct RevertingModule {
    token: Address,
}

impl RevertingModule {
    /// Reverting module that first spends `token`.
    pub fn new(token: Address) -> Self {
        Self { token }
    }
}

impl Module for RevertingModule {
    fn name(&self) -> &str {
        "reverting"
    }

    fn code(&self) -> Vec<u8> {
        let mut code = b"aegis.sample.reverting:".to_vec();
        code.extend_from_slice(self.token.as_bytes());
        code
    }

    fn call(&self, ctx: &mut ModuleContext<'_>, invocation: &Invocation) -> Result<Value, ModuleRevert> {
        ctx.storage.write_u64(Slot::from_index(0), 0xdead);
        ctx.storage.write_bool(FROZEN_SLOT, true);
        if ctx.tokens.balance_of(self.token, ctx.account) != 0 {
            ctx.tokens
                .transfer(self.token, ctx.account, ctx.caller, 1)
                .map_err(|e| ModuleRevert::new(e.to_string()))?;
        }
        Err(ModuleRevert::new("always reverts").with_data(json!({ "method": invocation.method })))
    }
}
