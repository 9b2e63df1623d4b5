use saverly::{AppState, MemoryStore, PinLockGate, PinState, SaverlyError};

#[test]
fn enable_then_unlock_with_matching_pin() {
    let mut gate = PinLockGate::new(MemoryStore::default()).expect("gate");
    assert_eq!(gate.state(), PinState::Disabled);

    gate.enable("1234").expect("enable");
    assert_eq!(gate.state(), PinState::Unlocked);
    assert!(gate.is_enabled());

    gate.lock();
    assert!(gate.is_locked());

    assert!(gate.attempt_unlock("1234").expect("unlock"));
    assert_eq!(gate.state(), PinState::Unlocked);
}

#[test]
fn wrong_pin_stays_locked_and_reports_false() {
    let mut gate = PinLockGate::new(MemoryStore::default()).expect("gate");
    gate.enable("1234").expect("enable");
    gate.lock();

    assert!(!gate.attempt_unlock("0000").expect("attempt"));
    assert!(gate.is_locked());

    // A mismatch is a normal outcome, so another attempt still works.
    assert!(gate.attempt_unlock("1234").expect("attempt"));
    assert!(!gate.is_locked());
}

#[test]
fn enable_rejects_malformed_pins() {
    let mut gate = PinLockGate::new(MemoryStore::default()).expect("gate");
    for bad in ["123", "12345", "12a4", ""] {
        let err = gate.enable(bad).unwrap_err();
        assert!(matches!(err, SaverlyError::Validation { ref field, .. } if field == "pin"));
        assert_eq!(gate.state(), PinState::Disabled);
    }
}

#[test]
fn change_pin_requires_the_current_pin() {
    let mut gate = PinLockGate::new(MemoryStore::default()).expect("gate");
    gate.enable("1234").expect("enable");

    assert!(!gate.change_pin("9999", "5678").expect("change"));
    gate.lock();
    assert!(gate.attempt_unlock("1234").expect("old pin still valid"));

    assert!(gate.change_pin("1234", "5678").expect("change"));
    gate.lock();
    assert!(!gate.attempt_unlock("1234").expect("attempt"));
    assert!(gate.attempt_unlock("5678").expect("attempt"));
}

#[test]
fn change_pin_validates_the_new_pin() {
    let mut gate = PinLockGate::new(MemoryStore::default()).expect("gate");
    gate.enable("1234").expect("enable");
    let err = gate.change_pin("1234", "56").unwrap_err();
    assert!(matches!(err, SaverlyError::Validation { ref field, .. } if field == "pin"));
}

#[test]
fn disable_then_enable_resets_to_unlocked() {
    let mut gate = PinLockGate::new(MemoryStore::default()).expect("gate");
    gate.enable("1234").expect("enable");
    gate.lock();

    gate.disable().expect("disable");
    assert_eq!(gate.state(), PinState::Disabled);
    gate.lock();
    assert_eq!(gate.state(), PinState::Disabled);

    gate.enable("4321").expect("enable");
    assert_eq!(gate.state(), PinState::Unlocked);
}

#[test]
fn starts_locked_when_a_pin_is_already_persisted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("saverly.sqlite");

    {
        let state = AppState::open(db_path.clone()).expect("open");
        let mut gate = state.pin().expect("gate lock");
        assert_eq!(gate.state(), PinState::Disabled);
        gate.enable("1234").expect("enable");
    }

    // A fresh process sees the persisted PIN and comes up locked.
    let state = AppState::open(db_path).expect("reopen");
    let mut gate = state.pin().expect("gate lock");
    assert_eq!(gate.state(), PinState::Locked);
    assert!(gate.attempt_unlock("1234").expect("unlock"));
}

#[test]
fn concurrent_change_does_not_silently_overwrite() {
    let state = AppState::open_in_memory().expect("open");

    {
        let mut gate = state.pin().expect("gate lock");
        gate.enable("1234").expect("enable");
        // First writer wins.
        assert!(gate.change_pin("1234", "1111").expect("change"));
        // Second writer still holds the stale old PIN; its swap is refused.
        assert!(!gate.change_pin("1234", "2222").expect("change"));
    }

    let mut gate = state.pin().expect("gate lock");
    gate.lock();
    assert!(gate.attempt_unlock("1111").expect("attempt"));
}
