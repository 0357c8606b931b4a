//! Applying post-transaction review findings as the sentinel.
//!
//! A reviewer labels each executed transaction `SAFE` or `UNSAFE`. The
//! sentinel records the finding as an audit note on the account and, for
//! `UNSAFE`, freezes the account in the same call. A transaction that
//! already has a note is never reviewed twice.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::guard::GuardError;
use crate::runtime::Runtime;
use crate::types::{Address, Annotation, TxId};

/// Reviewer label. Decodes through [`Label::parse`], so any casing works and
/// unknown labels come out `Unsafe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Label {
    /// Nothing suspicious found.
    Safe,
    /// The transaction looks malicious or broken.
    Unsafe,
}

impl Label {
    /// Parse a reviewer label. Anything other than `SAFE` is `Unsafe`.
    pub fn parse(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("SAFE") {
            Self::Safe
        } else {
            Self::Unsafe
        }
    }
}

impl From<String> for Label {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

/// One reviewed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Verdict.
    pub label: Label,
    /// Short title; empty falls back to the transaction id.
    #[serde(default)]
    pub name: String,
    /// One-line summary, also used as the freeze reason.
    #[serde(default)]
    pub summary: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Individual reasons.
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl Finding {
    /// Fail-closed finding used when no review could be produced.
    pub fn audit_failure(detail: impl std::fmt::Display) -> Self {
        Self {
            label: Label::Unsafe,
            name: "PostAuditError".to_owned(),
            summary: "Post-audit failed".to_owned(),
            description: "The transaction could not be reviewed.\n\
                          The account was frozen as a precaution."
                .to_owned(),
            reasons: vec![format!("post-audit error: {detail}")],
        }
    }

    /// The note written for `tx`.
    pub fn annotation(&self, tx: &TxId) -> Annotation {
        let name = if self.name.trim().is_empty() {
            format!("tx:0x{}", tx.short_hex(8))
        } else {
            self.name.clone()
        };
        Annotation::new(
            name,
            self.summary.clone(),
            self.description.clone(),
            join_reasons(&self.reasons),
        )
    }

    /// Freeze reason for an `UNSAFE` finding.
    pub fn freeze_reason(&self) -> &str {
        if self.summary.is_empty() {
            "UNSAFE"
        } else {
            &self.summary
        }
    }
}

/// Trim each reason, drop empty ones, join with newlines.
pub fn join_reasons<S: AsRef<str>>(reasons: &[S]) -> String {
    reasons
        .iter()
        .map(|r| r.as_ref().trim())
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// What [`apply_finding`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelAction {
    /// A note already existed; nothing written.
    Skipped,
    /// A note was written.
    Noted,
    /// A note was written and the account frozen.
    Frozen,
}

/// Record `finding` for `tx` on `account`, calling as `sentinel`.
///
/// # Errors
///
/// Whatever the guard returns, typically `NotSentinel`. Nothing is written
/// on error.
pub fn apply_finding(
    runtime: &mut Runtime,
    sentinel: Address,
    account: Address,
    tx: TxId,
    finding: &Finding,
) -> Result<SentinelAction, GuardError> {
    runtime.transact(sentinel, account, |guard| {
        if guard.view().tx_note(&tx).exists() {
            return Ok(SentinelAction::Skipped);
        }
        let annotation = finding.annotation(&tx);
        match finding.label {
            Label::Unsafe => {
                guard.freeze_with_tx_note(tx, annotation, finding.freeze_reason())?;
                warn!(%account, %tx, reason = finding.freeze_reason(), "unsafe transaction; account frozen");
                Ok(SentinelAction::Frozen)
            }
            Label::Safe => {
                guard.set_tx_note(tx, annotation)?;
                info!(%account, %tx, "transaction noted safe");
                Ok(SentinelAction::Noted)
            }
        }
    })
}
