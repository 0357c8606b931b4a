//! Deciding whether an account may adopt a candidate module.
//!
//! Reads the registry only; nothing here writes. A first adoption
//! (`Init` mode) needs the candidate's own verdict to be `Safe`. Replacing a
//! live module (`Swap` mode) additionally needs a `Safe` migration record from
//! the current module to the candidate. When allowed, the plan carries the
//! exact self-call the account should submit.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::guard::methods;
use crate::module::{CodeSource, Invocation};
use crate::registry::{ModulePair, Record, SwapKey, VerdictRegistry};
use crate::types::{Address, Verdict};

/// Why a plan could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdoptionError {
    /// A module involved in the plan has no deployed code.
    #[error("no code deployed at {module}")]
    NoCode {
        /// Module without code.
        module: Address,
    },

    /// The candidate is the zero address.
    #[error("zero address")]
    ZeroAddress,
}

/// Whether the account is adopting its first module or replacing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionMode {
    /// No module is active yet; adoption goes through `init`.
    Init,
    /// A module is active; adoption goes through `set_implementation`.
    Swap,
}

/// Principals passed to `init` in `Init` mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitParams {
    /// Recovery principal.
    pub recovery: Address,
    /// Sentinel principal; zero for none.
    pub sentinel: Address,
}

/// Outcome of [`plan_adoption`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdoptionPlan {
    /// Init or swap.
    pub mode: AdoptionMode,
    /// Candidate module at its live content-hash.
    pub candidate: ModulePair,
    /// Registry record for the candidate.
    pub candidate_record: Record,
    /// Active module at its live content-hash (swap mode only).
    pub current: Option<ModulePair>,
    /// Migration record from current to candidate (swap mode only).
    pub swap_record: Option<Record>,
    /// Whether every required verdict is `Safe`.
    pub allow: bool,
    /// Self-call to submit when allowed.
    pub call: Option<Invocation>,
}

/// Build the adoption plan for moving from `current` (zero when nothing is
/// active) to `candidate`.
///
/// # Errors
///
/// [`AdoptionError::ZeroAddress`] for a zero candidate and
/// [`AdoptionError::NoCode`] when the candidate, or in swap mode the current
/// module, has no code.
pub fn plan_adoption(
    registry: &VerdictRegistry,
    code: &dyn CodeSource,
    current: Address,
    candidate: Address,
    init: InitParams,
) -> Result<AdoptionPlan, AdoptionError> {
    if candidate.is_zero() {
        return Err(AdoptionError::ZeroAddress);
    }
    let (candidate_record, candidate_pair) = registry.record_current(code, candidate);
    if candidate_pair.code_hash.is_zero() {
        return Err(AdoptionError::NoCode { module: candidate });
    }

    let mode = if current.is_zero() {
        AdoptionMode::Init
    } else {
        AdoptionMode::Swap
    };

    let (current_pair, swap_record) = match mode {
        AdoptionMode::Init => (None, None),
        AdoptionMode::Swap => {
            let (record, SwapKey { from, .. }) = registry.swap_record_current(code, current, candidate);
            if from.code_hash.is_zero() {
                return Err(AdoptionError::NoCode { module: current });
            }
            (Some(from), Some(record))
        }
    };

    let allow = candidate_record.verdict == Verdict::Safe
        && swap_record
            .as_ref()
            .map_or(true, |r| r.verdict == Verdict::Safe);

    let call = allow.then(|| match mode {
        AdoptionMode::Init => Invocation::new(
            methods::INIT,
            json!({
                "module": candidate,
                "recovery": init.recovery,
                "sentinel": init.sentinel,
            }),
        ),
        AdoptionMode::Swap => {
            Invocation::new(methods::SET_IMPLEMENTATION, json!({ "module": candidate }))
        }
    });

    if allow {
        info!(%candidate, ?mode, "adoption allowed");
    } else {
        warn!(
            %candidate,
            ?mode,
            candidate_verdict = ?candidate_record.verdict,
            swap_verdict = ?swap_record.as_ref().map(|r| r.verdict),
            "adoption rejected"
        );
    }

    Ok(AdoptionPlan {
        mode,
        candidate: candidate_pair,
        candidate_record,
        current: current_pair,
        swap_record,
        allow,
        call,
    })
}
