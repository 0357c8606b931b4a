//! Sample modules: well-behaved ones and adversary models.
//!
//! The hostile modules are the behaviours the guard has to contain. They
//! are deliberately written against raw storage slots, the way a malicious
//! implementation would be.

pub mod batch;
pub mod counter;
pub mod hostile;

use std::sync::Arc;

use serde::Serialize;

pub use batch::BatchExecutorModule;
pub use counter::CounterModule;
pub use hostile::{HijackModule, RevertingModule, SlotClobberModule, TimeBombModule};

use crate::guard::layout::FROZEN_SLOT;
use crate::module::Module;
use crate::types::Address;

/// How a sample module behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleProfile {
    /// Touches only its own state.
    Benign,
    /// Writes a guard-owned slot directly.
    StorageInterference,
    /// Grants itself guard authority (recovery) and moves funds.
    PrivilegeConfusion,
    /// Arms in one call, acts in a later one.
    DeferredSideEffect,
    /// Always reverts after doing work.
    Failing,
}

impl ModuleProfile {
    /// Whether the per-call mutation check can notice this behaviour.
    pub fn detectable_per_call(self) -> bool {
        matches!(self, Self::StorageInterference | Self::PrivilegeConfusion)
    }
}

/// One instance of every sample, labelled with its profile.
pub fn catalog(attacker: Address, token: Address) -> Vec<(ModuleProfile, Arc<dyn Module>)> {
    vec![
        (ModuleProfile::Benign, Arc::new(CounterModule::new(1))),
        (ModuleProfile::Benign, Arc::new(BatchExecutorModule::new())),
        (
            ModuleProfile::StorageInterference,
            Arc::new(SlotClobberModule::new(FROZEN_SLOT, vec![0])),
        ),
        (
            ModuleProfile::PrivilegeConfusion,
            Arc::new(HijackModule::new(attacker, token)),
        ),
        (
            ModuleProfile::DeferredSideEffect,
            Arc::new(TimeBombModule::new(attacker, token)),
        ),
        (ModuleProfile::Failing, Arc::new(RevertingModule::new(token))),
    ]
}
