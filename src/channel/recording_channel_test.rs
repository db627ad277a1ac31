use super::*;
use crate::constants::DEFAULT_RECORDING_CAPACITY;
use crate::AlertKind;

#[test]
fn test_oldest_calls_are_dropped_at_capacity() {
    let recorder = RecordingChannel::with_capacity(2);

    recorder.play(AlertKind::NewOrder, 10);
    recorder.play(AlertKind::StatusChanged, 20);
    recorder.play(AlertKind::Success, 30);

    assert_eq!(recorder.calls().len(), 2);
    assert_eq!(
        recorder.sounds(),
        vec![(AlertKind::StatusChanged, 20), (AlertKind::Success, 30)]
    );
}

#[test]
fn test_default_capacity_and_zero_capacity() {
    assert_eq!(RecordingChannel::new().capacity(), DEFAULT_RECORDING_CAPACITY);

    let recorder = RecordingChannel::with_capacity(0);
    assert_eq!(recorder.capacity(), 1);
    recorder.vibrate(&[100]);
    recorder.vibrate(&[200]);
    assert_eq!(recorder.vibrations(), vec![vec![200]]);
}

#[test]
fn test_failure_switch_is_reported_but_still_recorded() {
    let recorder = RecordingChannel::new();
    let request = PushRequest {
        title: "t".to_string(),
        body: "b".to_string(),
        tag: "courier-orders-o1".to_string(),
    };

    recorder.fail_push(true);
    assert!(!PushChannel::show(&recorder, &request));
    recorder.fail_push(false);
    assert!(PushChannel::show(&recorder, &request));

    assert_eq!(recorder.pushes().len(), 2);
    recorder.clear();
    assert!(recorder.calls().is_empty());
}
