//! Batched token transfers, either as a self-call or signed by the account key.
//!
//! Signed batches are ECDSA (secp256k1) over
//! `sha256(DOMAIN || account || nonce_be || json(calls))`. The nonce lives in
//! the module's own namespaced slot and must match exactly, so each signature
//! is good for one batch on one account.

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::module::{Invocation, Module, ModuleContext, ModuleRevert};
use crate::storage::{Slot, StoreExt};
use crate::types::Address;

/// Domain tag mixed into every signed-batch digest.
pub const DOMAIN: &[u8] = b"aegis.sample.batch.v1";

/// One transfer out of the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Token to move.
    pub token: Address,
    /// Recipient.
    pub to: Address,
    /// Amount.
    pub amount: u128,
}

#[derive(Deserialize)]
struct ExecuteArgs {
    calls: Vec<Transfer>,
}

#[derive(Deserialize)]
struct ExecuteSignedArgs {
    calls: Vec<Transfer>,
    nonce: u64,
    public_key: String,
    signature: String,
}

/// Batch executor.
#[derive(Debug, Clone, Default)]
pub struct BatchExecutorModule;

impl BatchExecutorModule {
    /// New executor.
    pub fn new() -> Self {
        Self
    }

    /// Slot holding the next expected nonce.
    pub fn nonce_slot() -> Slot {
        Slot::derive("aegis.modules.batch")
    }

    /// Digest signed for `calls` at `nonce` on `account`.
    pub fn digest(account: Address, nonce: u64, calls: &[Transfer]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN);
        hasher.update(account.as_bytes());
        hasher.update(nonce.to_be_bytes());
        // Vec<Transfer> always serializes.
        hasher.update(serde_json::to_vec(calls).unwrap_or_default());
        hasher.finalize().into()
    }

    /// Build a signed `executeSigned` invocation.
    ///
    /// # Errors
    ///
    /// Returns the secp256k1 error if the digest cannot form a message.
    pub fn sign_batch(
        secret: &SecretKey,
        account: Address,
        nonce: u64,
        calls: Vec<Transfer>,
    ) -> Result<Invocation, secp256k1::Error> {
        let secp = Secp256k1::new();
        let message = Message::from_digest_slice(&Self::digest(account, nonce, &calls))?;
        let signature = secp.sign_ecdsa(&message, secret);
        let public_key = PublicKey::from_secret_key(&secp, secret);
        Ok(Invocation::new(
            "executeSigned",
            json!({
                "calls": calls,
                "nonce": nonce,
                "public_key": hex::encode(public_key.serialize()),
                "signature": hex::encode(signature.serialize_compact()),
            }),
        ))
    }

    /// Account address controlled by `public_key`.
    pub fn account_of(public_key: &PublicKey) -> Address {
        Address::from_key_material(&public_key.serialize())
    }

    fn run(ctx: &mut ModuleContext<'_>, calls: &[Transfer]) -> Result<Value, ModuleRevert> {
        for (index, call) in calls.iter().enumerate() {
            ctx.tokens
                .transfer(call.token, ctx.account, call.to, call.amount)
                .map_err(|e| {
                    ModuleRevert::new(format!("transfer {index} failed: {e}"))
                        .with_data(json!({ "index": index }))
                })?;
        }
        Ok(json!({ "executed": calls.len() }))
    }

    fn verify(ctx: &ModuleContext<'_>, args: &ExecuteSignedArgs) -> Result<(), ModuleRevert> {
        let expected = ctx.storage.read_u64(&Self::nonce_slot());
        if args.nonce != expected {
            return Err(ModuleRevert::new("bad nonce")
                .with_data(json!({ "expected": expected, "got": args.nonce })));
        }

        let key_bytes = decode_hex(&args.public_key)?;
        let public_key = PublicKey::from_slice(&key_bytes)
            .map_err(|e| ModuleRevert::new(format!("bad public key: {e}")))?;
        if Self::account_of(&public_key) != ctx.account {
            return Err(ModuleRevert::new("signer is not the account"));
        }

        let sig_bytes = decode_hex(&args.signature)?;
        let signature = Signature::from_compact(&sig_bytes)
            .map_err(|e| ModuleRevert::new(format!("bad signature encoding: {e}")))?;
        let message = Message::from_digest_slice(&Self::digest(ctx.account, args.nonce, &args.calls))
            .map_err(|e| ModuleRevert::new(format!("bad digest: {e}")))?;
        Secp256k1::verification_only()
            .verify_ecdsa(&message, &signature, &public_key)
            .map_err(|_| ModuleRevert::new("invalid signature"))
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, ModuleRevert> {
    hex::decode(s.trim_start_matches("0x")).map_err(|e| ModuleRevert::new(format!("bad hex: {e}")))
}

fn bad_args(e: serde_json::Error) -> ModuleRevert {
    ModuleRevert::new(format!("bad arguments: {e}"))
}

impl Module for BatchExecutorModule {
    fn name(&self) -> &str {
        "batch-executor"
    }

    fn code(&self) -> Vec<u8> {
        let mut code = b"aegis.sample.batch:".to_vec();
        code.extend_from_slice(DOMAIN);
        code
    }

    fn call(&self, ctx: &mut ModuleContext<'_>, invocation: &Invocation) -> Result<Value, ModuleRevert> {
        match invocation.method.as_str() {
            "execute" => {
                if ctx.caller != ctx.account {
                    return Err(ModuleRevert::new("execute is self-call only"));
                }
                let args: ExecuteArgs = invocation.decode_args().map_err(bad_args)?;
                Self::run(ctx, &args.calls)
            }
            "executeSigned" => {
                let args: ExecuteSignedArgs = invocation.decode_args().map_err(bad_args)?;
                Self::verify(ctx, &args)?;
                let next = args
                    .nonce
                    .checked_add(1)
                    .ok_or_else(|| ModuleRevert::new("nonce exhausted"))?;
                ctx.storage.write_u64(Self::nonce_slot(), next);
                Self::run(ctx, &args.calls)
            }
            "nonce" => Ok(json!({ "nonce": ctx.storage.read_u64(&Self::nonce_slot()) })),
            other => Err(ModuleRevert::new(format!("unknown method: {other}"))),
        }
    }
}
