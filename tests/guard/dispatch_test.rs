//! Method-name dispatch.

use std::sync::Arc;

use aegis::fee::FeeConfig;
use aegis::guard::{methods, GuardError};
use aegis::module::Invocation;
use aegis::modules::CounterModule;
use aegis::types::TxId;
use serde_json::json;

use crate::fixture::*;

#[test]
fn init_and_getters_through_dispatch() {
    let mut rt = runtime();
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));

    let init = Invocation::new(
        methods::INIT,
        json!({ "module": COUNTER, "recovery": RECOVERY, "sentinel": SENTINEL }),
    );
    rt.call(ACCOUNT, ACCOUNT, &init).expect("init dispatched");

    let implementation = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_IMPLEMENTATION))
        .expect("getter");
    assert_eq!(implementation, json!(COUNTER.to_string()));
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare(methods::IS_FROZEN))
            .expect("getter"),
        json!(false)
    );
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_RECOVERY))
            .expect("getter"),
        json!(RECOVERY.to_string())
    );
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_SENTINEL))
            .expect("getter"),
        json!(SENTINEL.to_string())
    );
}

#[test]
fn unmatched_methods_are_forwarded() {
    let mut rt = counter_account();
    let out = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect("forwarded");
    assert_eq!(out, json!({ "count": 1 }));
}

#[test]
fn freeze_and_reason_through_dispatch() {
    let mut rt = counter_account();
    rt.call(SENTINEL, ACCOUNT, &Invocation::new(methods::FREEZE, json!({ "reason": "odd" })))
        .expect("sentinel freezes");
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_FREEZE_REASON))
            .expect("getter"),
        json!("odd")
    );
    rt.call(RECOVERY, ACCOUNT, &Invocation::bare(methods::UNFREEZE))
        .expect("recovery unfreezes");
    rt.call(ACCOUNT, ACCOUNT, &Invocation::bare(methods::FREEZE))
        .expect("reason is optional");
}

#[test]
fn force_execute_payload_is_nested() {
    let mut rt = counter_account();
    let payload = Invocation::new("increment", json!({ "by": 3 }));
    let out = rt
        .call(
            ACCOUNT,
            ACCOUNT,
            &Invocation::new(methods::FORCE_EXECUTE, json!({ "payload": payload })),
        )
        .expect("forced");
    assert_eq!(out, json!({ "count": 3 }));
}

#[test]
fn tx_note_methods_through_dispatch() {
    let mut rt = counter_account();
    let tx = TxId::from_label("dispatch");
    rt.call(
        SENTINEL,
        ACCOUNT,
        &Invocation::new(
            methods::SET_TX_NOTE,
            json!({ "tx_id": tx, "name": "n", "summary": "s", "reasons": "r" }),
        ),
    )
    .expect("note written");

    let note = rt
        .call(STRANGER, ACCOUNT, &Invocation::new(methods::GET_TX_NOTE, json!({ "tx_id": tx })))
        .expect("getter");
    assert_eq!(note["name"], json!("n"));
    assert_eq!(note["summary"], json!("s"));

    let recent = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_RECENT_TXS))
        .expect("getter");
    assert_eq!(recent, json!([tx.to_string()]));
    assert_eq!(
        rt.call(STRANGER, ACCOUNT, &Invocation::new(methods::GET_RECENT_TX_AT, json!({ "index": 1 }))),
        Err(GuardError::IndexOutOfBounds { index: 1, len: 1 })
    );

    rt.call(
        SENTINEL,
        ACCOUNT,
        &Invocation::new(
            methods::FREEZE_WITH_TX_NOTE,
            json!({ "tx_id": TxId::from_label("bad"), "reason": "bad tx", "name": "bad" }),
        ),
    )
    .expect("freeze with note");
    assert!(rt.view(ACCOUNT).is_frozen());
    assert_eq!(rt.view(ACCOUNT).freeze_reason(), "bad tx");
}

#[test]
fn fee_config_getter_reports_policy() {
    let mut rt = runtime_with_fee(3);
    let fee = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_FEE_CONFIG))
        .expect("getter");
    assert_eq!(fee["token"], json!(TOKEN.to_string()));
    assert_eq!(fee["recipient"], json!(FEE_RECIPIENT.to_string()));
    assert_eq!(fee["amount_per_call"], json!("3"));
}

#[test]
fn fee_config_getter_handles_amounts_past_u64() {
    let mut rt = runtime_with_fee(3);
    let twenty_tokens: u128 = 20_000_000_000_000_000_000;
    rt.fees_mut()
        .set_override(OWNER, ACCOUNT, FeeConfig::new(TOKEN, FEE_RECIPIENT, twenty_tokens))
        .expect("owner is operator");

    let fee = rt
        .call(STRANGER, ACCOUNT, &Invocation::bare(methods::GET_FEE_CONFIG))
        .expect("getter");
    assert_eq!(fee["amount_per_call"], json!("20000000000000000000"));
}

#[test]
fn malformed_arguments_are_rejected() {
    let mut rt = counter_account();
    let err = rt
        .call(ACCOUNT, ACCOUNT, &Invocation::new(methods::SET_SENTINEL, json!({ "sentinel": 5 })))
        .expect_err("number is not an address");
    assert!(matches!(err, GuardError::InvalidArguments { ref method, .. } if method == methods::SET_SENTINEL));

    let err = rt
        .call(ACCOUNT, ACCOUNT, &Invocation::bare(methods::SET_IMPLEMENTATION))
        .expect_err("missing module");
    assert!(matches!(err, GuardError::InvalidArguments { .. }));
    assert_eq!(rt.view(ACCOUNT).sentinel(), SENTINEL);
}
