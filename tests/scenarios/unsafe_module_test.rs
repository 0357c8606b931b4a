//! Adopting an Unsafe module through the forced path.

use std::sync::Arc;

use aegis::guard::GuardError;
use aegis::module::Invocation;
use aegis::modules::{CounterModule, RevertingModule};
use aegis::types::{Address, Verdict};

use crate::fixture::*;

const REVERTING: Address = Address::new([0xe7; 20]);

#[test]
fn unsafe_module_needs_force_and_its_revert_costs_nothing() {
    let mut rt = runtime_with_fee(1);
    deploy_safe(&mut rt, COUNTER, Arc::new(CounterModule::new(1)));
    init_account(&mut rt, COUNTER);
    rt.tokens_mut().mint(TOKEN, ACCOUNT, 10);
    deploy_with_verdict(&mut rt, REVERTING, Arc::new(RevertingModule::new(TOKEN)), Verdict::Unsafe);

    let err = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.set_implementation(REVERTING))
        .expect_err("unsafe module rejected");
    assert!(matches!(err, GuardError::UnsafeImplementation { .. }));
    assert_eq!(rt.view(ACCOUNT).implementation(), COUNTER);

    rt.transact(ACCOUNT, ACCOUNT, |g| g.force_set_implementation(REVERTING))
        .expect("forced adoption");
    assert_eq!(rt.view(ACCOUNT).implementation(), REVERTING);

    let err = rt
        .transact(ACCOUNT, ACCOUNT, |g| g.force_execute(&Invocation::bare("run")))
        .expect_err("module reverts");
    assert!(matches!(err, GuardError::Module(_)));
    assert_eq!(rt.tokens().balance_of(TOKEN, ACCOUNT), 10);
    assert_eq!(rt.tokens().balance_of(TOKEN, FEE_RECIPIENT), 0);
    assert!(!rt.view(ACCOUNT).is_frozen());

    // The default path still refuses it.
    assert!(matches!(
        rt.call(STRANGER, ACCOUNT, &Invocation::bare("run")),
        Err(GuardError::UnsafeImplementation { .. })
    ));
}
