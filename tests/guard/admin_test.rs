//! Initialisation, self-call discipline, freeze and recovery.

use std::sync::Arc;

use aegis::guard::GuardError;
use aegis::modules::CounterModule;
use aegis::types::{Address, Verdict};

use crate::fixture::*;

const COUNTER_V2: Address = Address::new([0xc2; 20]);

#[test]
fn init_sets_config_and_module() {
    let rt = counter_account();
    let view = rt.view(ACCOUNT);
    assert_eq!(view.implementation(), COUNTER);
    assert_eq!(view.recovery(), RECOVERY);
    assert_eq!(view.sentinel(), SENTINEL);
    assert!(!view.is_frozen());
    assert_eq!(view.config_nonce(), 0);
}

#[test]
fn init_is_self_call_only() {
    let mut rt = runtime();
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    let err = rt
        .transact(STRANGER, ACCOUNT, |g| g.init(COUNTER, RECOVERY, SENTINEL))
        .expect_err("stranger cannot init");
    assert_eq!(err, GuardError::NotSelf { caller: STRANGER });
    assert!(rt.view(ACCOUNT).implementation().is_zero());
}

#[test]
fn init_runs_once() {
    let mut rt = counter_account();
    let err = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.init(COUNTER, RECOVERY, SENTINEL))
        .expect_err("second init rejected");
    assert_eq!(err, GuardError::AlreadyInitialized);
}

#[test]
fn init_rejects_zero_addresses() {
    let mut rt = runtime();
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    assert_eq!(
        rt.transact(ACCOUNT, ACCOUNT, |g| g.init(COUNTER, Address::ZERO, SENTINEL)),
        Err(GuardError::ZeroAddress)
    );
    assert_eq!(
        rt.transact(ACCOUNT, ACCOUNT, |g| g.init(Address::ZERO, RECOVERY, SENTINEL)),
        Err(GuardError::ZeroAddress)
    );
}

#[test]
fn init_requires_safe_module() {
    let mut rt = runtime();
    let pair = deploy_with_verdict(&mut rt, COUNTER, Arc::new(CounterModule::new(1)), Verdict::Unsafe);
    let err = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.init(COUNTER, RECOVERY, SENTINEL))
        .expect_err("unsafe module rejected");
    assert_eq!(
        err,
        GuardError::UnsafeImplementation {
            module: COUNTER,
            code_hash: pair.code_hash
        }
    );
    assert!(rt.view(ACCOUNT).recovery().is_zero());
}

#[test]
fn set_implementation_checks_registry_and_force_does_not() {
    let mut rt = counter_account();
    rt.deploy(COUNTER_V2, Arc::new(CounterModule::new(2)));

    let err = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.set_implementation(COUNTER_V2))
        .expect_err("unreviewed module rejected");
    assert!(matches!(err, GuardError::UnsafeImplementation { module, .. } if module == COUNTER_V2));
    assert_eq!(rt.view(ACCOUNT).implementation(), COUNTER);

    rt.transact(ACCOUNT, ACCOUNT, |g| g.force_set_implementation(COUNTER_V2))
        .expect("forced adoption skips registry");
    assert_eq!(rt.view(ACCOUNT).implementation(), COUNTER_V2);
}

#[test]
fn implementation_changes_need_self_and_non_frozen() {
    let mut rt = counter_account();
    assert_eq!(
        rt.transact(STRANGER, ACCOUNT, |g| g.force_set_implementation(COUNTER)),
        Err(GuardError::NotSelf { caller: STRANGER })
    );
    assert_eq!(
        rt.transact(ACCOUNT, ACCOUNT, |g| g.set_implementation(Address::ZERO)),
        Err(GuardError::ZeroAddress)
    );

    rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("incident"))
        .expect("sentinel freezes");
    assert_eq!(
        rt.transact(ACCOUNT, ACCOUNT, |g| g.force_set_implementation(COUNTER)),
        Err(GuardError::Frozen {
            reason: "incident".to_owned()
        })
    );
    // NotSelf wins over Frozen.
    assert_eq!(
        rt.transact(STRANGER, ACCOUNT, |g| g.set_implementation(COUNTER)),
        Err(GuardError::NotSelf { caller: STRANGER })
    );
}

#[test]
fn freeze_is_self_or_sentinel() {
    let mut rt = counter_account();
    assert_eq!(
        rt.transact(STRANGER, ACCOUNT, |g| g.freeze("nope")),
        Err(GuardError::NotSentinel { caller: STRANGER })
    );

    rt.transact(ACCOUNT, ACCOUNT, |g| g.freeze("self"))
        .expect("account freezes itself");
    rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("again"))
        .expect("freeze is idempotent");
    let view = rt.view(ACCOUNT);
    assert!(view.is_frozen());
    assert_eq!(view.freeze_reason(), "again");
}

#[test]
fn unfreeze_is_recovery_only() {
    let mut rt = counter_account();
    rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("incident"))
        .expect("sentinel freezes");

    for caller in [ACCOUNT, SENTINEL, STRANGER] {
        assert_eq!(
            rt.transact(caller, ACCOUNT, |g| g.unfreeze()),
            Err(GuardError::NotRecovery { caller })
        );
    }

    rt.transact(RECOVERY, ACCOUNT, |g| g.unfreeze())
        .expect("recovery unfreezes");
    let view = rt.view(ACCOUNT);
    assert!(!view.is_frozen());
    assert_eq!(view.freeze_reason(), "");
}

#[test]
fn recovery_rotation_depends_on_frozen_state() {
    let mut rt = counter_account();
    let next = Address::new([0x7f; 20]);

    assert_eq!(
        rt.transact(RECOVERY, ACCOUNT, |g| g.set_recovery(next)),
        Err(GuardError::NotSelf { caller: RECOVERY })
    );
    rt.transact(ACCOUNT, ACCOUNT, |g| g.set_recovery(next))
        .expect("self rotates while active");
    assert_eq!(rt.view(ACCOUNT).recovery(), next);

    rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("incident"))
        .expect("sentinel freezes");
    assert_eq!(
        rt.transact(ACCOUNT, ACCOUNT, |g| g.set_recovery(RECOVERY)),
        Err(GuardError::NotRecovery { caller: ACCOUNT })
    );
    assert_eq!(
        rt.transact(next, ACCOUNT, |g| g.set_recovery(Address::ZERO)),
        Err(GuardError::ZeroAddress)
    );
    rt.transact(next, ACCOUNT, |g| g.set_recovery(RECOVERY))
        .expect("recovery rotates while frozen");
    assert_eq!(rt.view(ACCOUNT).recovery(), RECOVERY);
}

#[test]
fn sentinel_can_be_replaced_or_disabled() {
    let mut rt = counter_account();
    assert_eq!(
        rt.transact(SENTINEL, ACCOUNT, |g| g.set_sentinel(STRANGER)),
        Err(GuardError::NotSelf { caller: SENTINEL })
    );

    rt.transact(ACCOUNT, ACCOUNT, |g| g.set_sentinel(Address::ZERO))
        .expect("zero disables sentinel");
    assert!(rt.view(ACCOUNT).sentinel().is_zero());
    assert_eq!(
        rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("late")),
        Err(GuardError::NotSentinel { caller: SENTINEL })
    );
}
