//! A well-behaved module: a counter in slot 0 plus token payments.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::module::{Invocation, Module, ModuleContext, ModuleRevert};
use crate::storage::{Slot, StoreExt};
use crate::types::Address;

const COUNT_SLOT: Slot = Slot::from_bytes([0u8; 32]);

/// Counter module. Different versions have different code, hence different
/// content-hashes.
#[derive(Debug, Clone)]
pub struct CounterModule {
    version: u32,
}

#[derive(Deserialize)]
struct IncrementArgs {
    #[serde(default = "one")]
    by: u64,
}

fn one() -> u64 {
    1
}

#[derive(Deserialize)]
struct PayArgs {
    token: Address,
    to: Address,
    amount: u128,
}

impl CounterModule {
    /// Counter at `version`.
    pub fn new(version: u32) -> Self {
        Self { version }
    }

    fn increment(ctx: &mut ModuleContext<'_>, by: u64) -> Result<u64, ModuleRevert> {
        let count = ctx
            .storage
            .read_u64(&COUNT_SLOT)
            .checked_add(by)
            .ok_or_else(|| ModuleRevert::new("counter overflow"))?;
        ctx.storage.write_u64(COUNT_SLOT, count);
        Ok(count)
    }
}

impl Module for CounterModule {
    fn name(&self) -> &str {
        "counter"
    }

    fn code(&self) -> Vec<u8> {
        format!("aegis.sample.counter/v{}", self.version).into_bytes()
    }

    fn call(&self, ctx: &mut ModuleContext<'_>, invocation: &Invocation) -> Result<Value, ModuleRevert> {
        match invocation.method.as_str() {
            "increment" => {
                let args: IncrementArgs = if invocation.args.is_null() {
                    IncrementArgs { by: 1 }
                } else {
                    invocation
                        .decode_args()
                        .map_err(|e| ModuleRevert::new(format!("bad arguments: {e}")))?
                };
                let count = Self::increment(ctx, args.by)?;
                Ok(json!({ "count": count }))
            }
            "get" => Ok(json!({ "count": ctx.storage.read_u64(&COUNT_SLOT) })),
            "pay" => {
                let args: PayArgs = invocation
                    .decode_args()
                    .map_err(|e| ModuleRevert::new(format!("bad arguments: {e}")))?;
                ctx.tokens
                    .transfer(args.token, ctx.account, args.to, args.amount)
                    .map_err(|e| ModuleRevert::new(e.to_string()))?;
                Ok(json!({ "paid": args.amount.to_string() }))
            }
            "fail" => {
                Self::increment(ctx, 1)?;
                Err(ModuleRevert::new("counter asked to fail").with_data(json!({ "version": self.version })))
            }
            "echo" => Ok(invocation.args.clone()),
            other => Err(ModuleRevert::new(format!("unknown method: {other}"))),
        }
    }
}
