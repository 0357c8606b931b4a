//! One-unit fee: charged on success, refunded by rollback on revert.

use std::sync::Arc;

use aegis::module::Invocation;
use aegis::modules::CounterModule;

use crate::fixture::*;

#[test]
fn success_moves_exactly_one_unit_and_revert_moves_none() {
    let mut rt = runtime_with_fee(1);
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    init_account(&mut rt, COUNTER);
    rt.tokens_mut().mint(TOKEN, ACCOUNT, 10);

    rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect("call succeeds");
    assert_eq!(rt.tokens().balance_of(TOKEN, ACCOUNT), 9);
    assert_eq!(rt.tokens().balance_of(TOKEN, FEE_RECIPIENT), 1);

    rt.call(STRANGER, ACCOUNT, &Invocation::bare("fail"))
        .expect_err("module reverts");
    assert_eq!(rt.tokens().balance_of(TOKEN, ACCOUNT), 9);
    assert_eq!(rt.tokens().balance_of(TOKEN, FEE_RECIPIENT), 1);
}

#[test]
fn per_account_override_replaces_default() {
    let mut rt = runtime_with_fee(1);
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    init_account(&mut rt, COUNTER);
    rt.tokens_mut().mint(TOKEN, ACCOUNT, 10);
    rt.fees_mut()
        .set_override(OWNER, ACCOUNT, aegis::fee::FeeConfig::new(TOKEN, FEE_RECIPIENT, 4))
        .expect("owner is operator");

    rt.call(STRANGER, ACCOUNT, &Invocation::bare("increment"))
        .expect("call succeeds");
    assert_eq!(rt.tokens().balance_of(TOKEN, FEE_RECIPIENT), 4);
    assert_eq!(rt.view(ACCOUNT).fee_config().amount_per_call, 4);
}
