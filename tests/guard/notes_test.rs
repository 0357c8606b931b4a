//! Sentinel audit notes.

use aegis::guard::notes::NOTE_CAPACITY;
use aegis::guard::GuardError;
use aegis::module::Invocation;
use aegis::types::{Annotation, TxId};

use crate::fixture::*;

fn tx(n: usize) -> TxId {
    TxId::from_label(&format!("tx-{n}"))
}

#[test]
fn only_sentinel_writes_notes() {
    let mut rt = counter_account();
    for caller in [ACCOUNT, RECOVERY, STRANGER] {
        assert_eq!(
            rt.transact(caller, ACCOUNT, |g| g.set_tx_note(tx(1), Annotation::default())),
            Err(GuardError::NotSentinel { caller })
        );
    }
    assert!(rt.view(ACCOUNT).recent_txs().is_empty());
}

#[test]
fn note_round_trip_and_update_in_place() {
    let mut rt = counter_account();
    rt.transact(SENTINEL, ACCOUNT, |g| {
        g.set_tx_note(tx(1), Annotation::new("first", "ok", "", ""))
    })
    .expect("sentinel writes");
    rt.advance_time(10);
    rt.transact(SENTINEL, ACCOUNT, |g| {
        g.set_tx_note(tx(1), Annotation::new("second", "still ok", "", ""))
    })
    .expect("sentinel rewrites");

    let view = rt.view(ACCOUNT);
    let note = view.tx_note(&tx(1));
    assert_eq!(note.annotation.name, "second");
    assert_eq!(note.updated_at, rt.timestamp());
    assert_eq!(view.recent_txs(), vec![tx(1)]);
}

#[test]
fn ring_keeps_last_twenty_newest_first() {
    let mut rt = counter_account();
    let total = NOTE_CAPACITY + 3;
    for n in 0..total {
        rt.transact(SENTINEL, ACCOUNT, |g| g.set_tx_note(tx(n), Annotation::default()))
            .expect("sentinel writes");
    }

    let view = rt.view(ACCOUNT);
    let recent = view.recent_txs();
    assert_eq!(recent.len(), NOTE_CAPACITY);
    assert_eq!(recent.first(), Some(&tx(total - 1)));
    assert_eq!(recent.last(), Some(&tx(3)));
    assert_eq!(view.recent_tx_at(0).expect("in range"), tx(total - 1));
    assert_eq!(
        view.recent_tx_at(NOTE_CAPACITY),
        Err(GuardError::IndexOutOfBounds {
            index: NOTE_CAPACITY,
            len: NOTE_CAPACITY
        })
    );
    // Evicted bodies are cleared.
    for n in 0..3 {
        assert!(!view.tx_note(&tx(n)).exists());
    }
}

#[test]
fn freeze_with_note_is_atomic() {
    let mut rt = counter_account();
    rt.transact(SENTINEL, ACCOUNT, |g| {
        g.freeze_with_tx_note(tx(7), Annotation::new("drain", "drained funds", "", ""), "drained funds")
    })
    .expect("sentinel freezes with note");

    let view = rt.view(ACCOUNT);
    assert!(view.is_frozen());
    assert_eq!(view.freeze_reason(), "drained funds");
    assert_eq!(view.tx_note(&tx(7)).annotation.name, "drain");

    assert_eq!(
        rt.transact(STRANGER, ACCOUNT, |g| g.freeze_with_tx_note(tx(8), Annotation::default(), "x")),
        Err(GuardError::NotSentinel { caller: STRANGER })
    );
    assert!(!rt.view(ACCOUNT).tx_note(&tx(8)).exists());
}

#[test]
fn notes_are_writable_while_frozen() {
    let mut rt = counter_account();
    rt.transact(SENTINEL, ACCOUNT, |g| g.freeze("incident"))
        .expect("sentinel freezes");
    rt.transact(SENTINEL, ACCOUNT, |g| g.set_tx_note(tx(1), Annotation::default()))
        .expect("notes are not gated by freeze");
    assert!(rt.call(STRANGER, ACCOUNT, &Invocation::bare("get")).is_err());
}
