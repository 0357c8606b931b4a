//! Per-call fee policy consulted by the guard.
//!
//! A process-wide default `(token, recipient, amount)` triple with optional
//! per-account overrides. Operators manage the triples; the owner manages
//! the operator list.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Address;

/// Fee charged for each forwarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Token the fee is paid in.
    pub token: Address,
    /// Account receiving the fee.
    pub recipient: Address,
    /// Amount charged per forwarded call. Serialized as a decimal string.
    #[serde(with = "decimal")]
    pub amount_per_call: u128,
}

/// `u128` amounts as decimal strings; JSON numbers stop at `u64::MAX`.
/// Plain integers are still accepted on input.
mod decimal {
    use std::fmt;

    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }

    struct AmountVisitor;

    impl de::Visitor<'_> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
            u128::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
            v.trim().parse().map_err(E::custom)
        }
    }
}

impl FeeConfig {
    /// Fee triple with every field set.
    pub fn new(token: Address, recipient: Address, amount_per_call: u128) -> Self {
        Self {
            token,
            recipient,
            amount_per_call,
        }
    }

    /// Fees are disabled when the token, recipient or amount is zero.
    pub fn is_enabled(&self) -> bool {
        !self.token.is_zero() && !self.recipient.is_zero() && self.amount_per_call != 0
    }
}

/// Errors from fee administration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    /// Caller may not change fee triples.
    #[error("{caller} is not a fee operator")]
    NotOperator {
        /// Rejected caller.
        caller: Address,
    },

    /// Caller is not the policy owner.
    #[error("{caller} is not the fee policy owner")]
    NotOwner {
        /// Rejected caller.
        caller: Address,
    },
}

/// Default fee triple plus per-account overrides.
#[derive(Debug, Clone)]
pub struct FeePolicy {
    owner: Address,
    operators: HashSet<Address>,
    default_config: FeeConfig,
    overrides: HashMap<Address, FeeConfig>,
}

impl FeePolicy {
    /// Policy administered by `owner`, starting from `default_config`.
    pub fn new(owner: Address, default_config: FeeConfig) -> Self {
        Self {
            owner,
            operators: HashSet::new(),
            default_config,
            overrides: HashMap::new(),
        }
    }

    /// Policy that never charges.
    pub fn disabled(owner: Address) -> Self {
        Self::new(owner, FeeConfig::default())
    }

    /// Fee triple that applies to `account`.
    pub fn fee_config(&self, account: Address) -> FeeConfig {
        self.overrides
            .get(&account)
            .copied()
            .unwrap_or(self.default_config)
    }

    /// Policy owner.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether `who` may change fee triples. The owner always may.
    pub fn is_operator(&self, who: Address) -> bool {
        who == self.owner || self.operators.contains(&who)
    }

    /// Grant or revoke operator rights.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::NotOwner`] unless `caller` is the owner.
    pub fn set_operator(
        &mut self,
        caller: Address,
        operator: Address,
        allowed: bool,
    ) -> Result<(), FeeError> {
        if caller != self.owner {
            return Err(FeeError::NotOwner { caller });
        }
        if allowed {
            self.operators.insert(operator);
        } else {
            self.operators.remove(&operator);
        }
        info!(%operator, allowed, "fee operator updated");
        Ok(())
    }

    /// Replace the default triple.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::NotOperator`] for unauthorised callers.
    pub fn set_default(&mut self, caller: Address, config: FeeConfig) -> Result<(), FeeError> {
        self.require_operator(caller)?;
        self.default_config = config;
        Ok(())
    }

    /// Set the triple for one account.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::NotOperator`] for unauthorised callers.
    pub fn set_override(
        &mut self,
        caller: Address,
        account: Address,
        config: FeeConfig,
    ) -> Result<(), FeeError> {
        self.require_operator(caller)?;
        self.overrides.insert(account, config);
        Ok(())
    }

    /// Drop an account's override so the default applies again.
    ///
    /// # Errors
    ///
    /// Returns [`FeeError::NotOperator`] for unauthorised callers.
    pub fn clear_override(&mut self, caller: Address, account: Address) -> Result<(), FeeError> {
        self.require_operator(caller)?;
        self.overrides.remove(&account);
        Ok(())
    }

    fn require_operator(&self, caller: Address) -> Result<(), FeeError> {
        if self.is_operator(caller) {
            Ok(())
        } else {
            Err(FeeError::NotOperator { caller })
        }
    }
}
