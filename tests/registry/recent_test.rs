//! Recent-pair history ordering and bounds.

use std::num::NonZeroUsize;

use aegis::registry::{ModulePair, RegistryError, VerdictRegistry, DEFAULT_RECENT_CAPACITY};
use aegis::types::{Address, Annotation, CodeHash, Verdict};

const OWNER: Address = Address::new([0x0e; 20]);

fn pair(n: u64) -> ModulePair {
    ModulePair::new(Address::from_low_u64(n), CodeHash::of(&n.to_be_bytes()))
}

fn write(registry: &mut VerdictRegistry, n: u64) {
    registry
        .set_record(OWNER, pair(n), Verdict::Safe, Annotation::default(), n)
        .expect("owner publishes");
}

#[test]
fn default_capacity_is_five() {
    let registry = VerdictRegistry::with_default_capacity(OWNER);
    assert_eq!(registry.recent_capacity(), DEFAULT_RECENT_CAPACITY);
    assert_eq!(DEFAULT_RECENT_CAPACITY, 5);
}

#[test]
fn newest_first_before_wrap() {
    let mut registry = VerdictRegistry::with_default_capacity(OWNER);
    for n in 1..=3 {
        write(&mut registry, n);
    }
    assert_eq!(registry.recent_pairs(), vec![pair(3), pair(2), pair(1)]);
    assert_eq!(registry.recent_pair_at(0).expect("in range"), pair(3));
    assert_eq!(registry.recent_pair_at(2).expect("in range"), pair(1));
    assert_eq!(
        registry.recent_pair_at(3),
        Err(RegistryError::IndexOutOfBounds { index: 3, len: 3 })
    );
}

#[test]
fn newest_first_after_wrap() {
    let mut registry = VerdictRegistry::with_default_capacity(OWNER);
    for n in 1..=7 {
        write(&mut registry, n);
    }
    assert_eq!(
        registry.recent_pairs(),
        vec![pair(7), pair(6), pair(5), pair(4), pair(3)]
    );
    assert_eq!(registry.recent_pair_at(4).expect("in range"), pair(3));
    assert!(registry.recent_pair_at(5).is_err());
}

#[test]
fn repeat_writes_push_again() {
    let mut registry = VerdictRegistry::new(OWNER, NonZeroUsize::new(3).expect("non-zero"));
    write(&mut registry, 1);
    write(&mut registry, 2);
    write(&mut registry, 1);
    assert_eq!(registry.recent_pairs(), vec![pair(1), pair(2), pair(1)]);
}

#[test]
fn recent_records_join_latest_record() {
    let mut registry = VerdictRegistry::with_default_capacity(OWNER);
    write(&mut registry, 1);
    registry
        .set_record(OWNER, pair(1), Verdict::Unsafe, Annotation::new("bad", "", "", ""), 9)
        .expect("owner publishes");

    let joined = registry.recent_records();
    assert_eq!(joined.len(), 2);
    for (p, record) in joined {
        assert_eq!(p, pair(1));
        assert_eq!(record.verdict, Verdict::Unsafe);
        assert_eq!(record.updated_at, 9);
    }
}

#[test]
fn empty_history_has_no_index_zero() {
    let registry = VerdictRegistry::with_default_capacity(OWNER);
    assert_eq!(
        registry.recent_pair_at(0),
        Err(RegistryError::IndexOutOfBounds { index: 0, len: 0 })
    );
}
