//! ERC20-style balances used to meter and move value.
//!
//! One ledger holds every token, keyed by `(token, holder)`. Only the pieces
//! the guard and the sample modules need are modelled: minting for fixtures
//! and a fallible transfer.

use std::collections::HashMap;

use crate::types::Address;

/// Errors from token transfers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Sender balance is below the requested amount.
    #[error("insufficient {token} balance for {holder}: have {balance}, need {amount}")]
    InsufficientBalance {
        /// Token being moved.
        token: Address,
        /// Account that was debited.
        holder: Address,
        /// Balance at the time of the transfer.
        balance: u128,
        /// Requested amount.
        amount: u128,
    },

    /// Token or recipient is the zero address.
    #[error("transfer involves the zero address")]
    ZeroAddress,
}

/// Balances for every token, keyed by token then holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLedger {
    balances: HashMap<(Address, Address), u128>,
}

impl TokenLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `to`, saturating at `u128::MAX`.
    pub fn mint(&mut self, token: Address, to: Address, amount: u128) {
        let entry = self.balances.entry((token, to)).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current balance of `holder` in `token`.
    pub fn balance_of(&self, token: Address, holder: Address) -> u128 {
        self.balances.get(&(token, holder)).copied().unwrap_or(0)
    }

    /// Move `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ZeroAddress`] for a zero token or recipient and
    /// [`TokenError::InsufficientBalance`] when `from` cannot cover `amount`.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        if token.is_zero() || to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let balance = self.balance_of(token, from);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                token,
                holder: from,
                balance,
                amount,
            })?;
        if from == to {
            return Ok(());
        }
        self.balances.insert((token, from), remaining);
        self.mint(token, to, amount);
        Ok(())
    }
}
