use uuid::Uuid;

use crate::domain::entities::reminder::ReminderState;

#[test]
fn fresh_state_has_no_offsets() {
    let state = ReminderState::new(Uuid::new_v4());
    assert_eq!(state.sent_count(), 0);
    assert!(!state.has_sent(3));
}

#[test]
fn record_tracks_offsets_in_order() {
    let mut state = ReminderState::new(Uuid::new_v4());
    assert!(state.record(3));
    assert!(state.record(7));

    assert!(state.has_sent(3));
    assert!(state.has_sent(7));
    assert!(!state.has_sent(14));
    assert_eq!(state.sent_offsets, vec![3, 7]);
}

#[test]
fn duplicate_record_is_a_no_op() {
    let mut state = ReminderState::new(Uuid::new_v4());
    assert!(state.record(3));
    assert!(!state.record(3));
    assert_eq!(state.sent_count(), 1);
}
