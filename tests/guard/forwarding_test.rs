//! Forwarded calls: registry gate, frozen gate, fees and rollback.

use std::sync::Arc;

use aegis::guard::GuardError;
use aegis::module::{Invocation, ModuleRevert};
use aegis::modules::{CounterModule, RevertingModule};
use aegis::storage::{Slot, StoreExt};
use aegis::token::TokenError;
use aegis::types::{Address, Annotation, Verdict};
use serde_json::json;

use crate::fixture::*;

fn count(rt: &aegis::runtime::Runtime) -> u64 {
    rt.storage(&ACCOUNT).read_u64(&Slot::from_index(0))
}

#[test]
fn forwards_to_safe_module_and_returns_result_verbatim() {
    let mut rt = counter_account();
    let out = rt
        .call(STRANGER, ACCOUNT, &Invocation::new("increment", json!({ "by": 4 })))
        .expect("forwarded");
    assert_eq!(out, json!({ "count": 4 }));
    assert_eq!(count(&rt), 4);

    let echoed = rt
        .call(STRANGER, ACCOUNT, &Invocation::new("echo", json!(["a", 1])))
        .expect("forwarded");
    assert_eq!(echoed, json!(["a", 1]));
}

#[test]
fn uninitialised_account_has_no_implementation() {
    let mut rt = runtime();
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment")),
        Err(GuardError::ImplementationNotSet)
    );
}

#[test]
fn frozen_account_blocks_both_paths() {
    let mut rt = counter_account();
    rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("incident"))
        .expect("sentinel freezes");

    let frozen = Err(GuardError::Frozen {
        reason: "incident".to_owned(),
    });
    assert_eq!(rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment")), frozen);
    assert_eq!(
        rt.transact(ACCOUNT, ACCOUNT, |g| g.force_execute(&Invocation::bare("increment"))),
        frozen
    );
    assert_eq!(count(&rt), 0);
}

#[test]
fn verdict_downgrade_blocks_forwarding() {
    let mut rt = counter_account();
    rt.publish(OWNER, COUNTER, Verdict::Unsafe, Annotation::default())
        .expect("owner publishes");
    let err = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect_err("unsafe module not forwarded");
    assert!(matches!(err, GuardError::UnsafeImplementation { .. }));
}

#[test]
fn redeployed_code_is_blocked_until_reviewed() {
    let mut rt = counter_account();
    rt.deploy(COUNTER, Arc::new(CounterModule::new(9)));
    assert!(matches!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment")),
        Err(GuardError::UnsafeImplementation { .. })
    ));

    rt.publish(OWNER, COUNTER, Verdict::Safe, Annotation::default())
        .expect("owner publishes");
    rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect("reviewed again");
}

#[test]
fn force_execute_skips_registry_but_not_module_errors() {
    let mut rt = counter_account();
    rt.publish(OWNER, COUNTER, Verdict::Unsafe, Annotation::default())
        .expect("owner publishes");

    let out = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.force_execute(&Invocation::bare("increment")))
        .expect("forced past the registry");
    assert_eq!(out, json!({ "count": 1 }));

    let err = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.force_execute(&Invocation::bare("fail")))
        .expect_err("module revert propagates");
    assert!(matches!(err, GuardError::Module(ModuleRevert { ref reason, .. }) if reason == "counter asked to fail"));
    assert_eq!(count(&rt), 1);
}

#[test]
fn force_execute_is_self_call_only() {
    let mut rt = counter_account();
    rt.publish(OWNER, COUNTER, Verdict::Unsafe, Annotation::default())
        .expect("owner publishes");

    assert!(matches!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment")),
        Err(GuardError::UnsafeImplementation { .. })
    ));
    let forced = Invocation::new(
        aegis::guard::methods::FORCE_EXECUTE,
        json!({ "payload": Invocation::bare("increment") }),
    );
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &forced),
        Err(GuardError::NotSelf { caller: STRANGER })
    );
    assert_eq!(count(&rt), 0);

    let out = rt.call(ACCOUNT, ACCOUNT, &forced).expect("account forces");
    assert_eq!(out, json!({ "count": 1 }));
}

#[test]
fn force_execute_against_missing_code_is_a_no_op() {
    let mut rt = counter_account();
    rt.destroy(&COUNTER);
    let out = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.force_execute(&Invocation::bare("increment")))
        .expect("empty code succeeds");
    assert!(out.is_null());
}

#[test]
fn fee_is_charged_per_forwarded_call() {
    let mut rt = runtime_with_fee(2);
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    init_account(&mut rt, COUNTER);
    rt.tokens_mut().mint(TOKEN, ACCOUNT, 5);

    rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect("first call paid");
    rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect("second call paid");
    assert_eq!(rt.tokens().balance_of(TOKEN, ACCOUNT), 1);
    assert_eq!(rt.tokens().balance_of(TOKEN, FEE_RECIPIENT), 4);

    let err = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect_err("cannot pay");
    assert!(matches!(
        err,
        GuardError::FeeTransferFailed(TokenError::InsufficientBalance { balance: 1, amount: 2, .. })
    ));
    assert_eq!(count(&rt), 2);
}

#[test]
fn admin_calls_are_not_charged() {
    let mut rt = runtime_with_fee(1);
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    init_account(&mut rt, COUNTER);
    rt.transact(ACCOUNT, ACCOUNT, |g| g.freeze("x"))
        .expect("freeze without balance");
    rt.transact(RECOVERY, ACCOUNT, |g| g.unfreeze())
        .expect("unfreeze without balance");
}

#[test]
fn module_revert_rolls_back_storage_tokens_and_fee() {
    let mut rt = runtime_with_fee(1);
    let reverting = Address::new([0xe7; 20]);
    deploy_safe(&mut rt, reverting, Arc::new(RevertingModule::new(TOKEN)));
    init_account(&mut rt, reverting);
    rt.tokens_mut().mint(TOKEN, ACCOUNT, 10);
    let before = rt.storage(&ACCOUNT).read_u64(&Slot::from_index(0));

    let err = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare("anything"))
        .expect_err("module reverts");
    assert!(matches!(err, GuardError::Module(_)));

    assert_eq!(rt.tokens().balance_of(TOKEN, ACCOUNT), 10);
    assert_eq!(rt.tokens().balance_of(TOKEN, FEE_RECIPIENT), 0);
    assert_eq!(rt.tokens().balance_of(TOKEN, STRANGER), 0);
    assert_eq!(rt.storage(&ACCOUNT).read_u64(&Slot::from_index(0)), before);
    assert!(!rt.view(ACCOUNT).is_frozen());
}
