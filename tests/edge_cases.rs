//! Edge case and boundary condition tests for the garage controller

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use garage_link::indication::{classify, Indication, IndicationEvent, OTHER};
use garage_link::servo::ServoCalibration;
use garage_link::{
    Backoff, Command, ConnectionState, Error, LineBuffer, LinkChange, SocketId, TimeOfDay,
};

// ============================================================================
// Indication Classifier
// ============================================================================

#[test]
fn classifier_covers_every_code_in_vocabulary() {
    assert_eq!(Indication::COUNT, 82);
    for code in 0..82u16 {
        assert_ne!(classify(code), OTHER, "code {} unnamed", code);
    }
}

#[test]
fn classifier_names_are_unique() {
    let names: HashSet<&str> = Indication::ALL.iter().map(|k| k.name()).collect();
    assert_eq!(names.len(), Indication::COUNT);
    assert!(!names.contains(OTHER));
}

#[test]
fn classifier_is_total_over_u16() {
    assert_eq!(classify(82), OTHER);
    assert_eq!(classify(1000), OTHER);
    assert_eq!(classify(u16::MAX), OTHER);
}

#[test]
fn classifier_boundary_kinds() {
    assert_eq!(classify(0), "ConsoleActive");
    assert_eq!(classify(53), "SocketClosed");
    assert_eq!(classify(75), "NtpServerDelivery");
    assert_eq!(classify(81), "FileReceived");
}

#[test]
fn unknown_indication_is_logged_not_applied() {
    let link = ConnectionState::new();
    let event = IndicationEvent::from_raw(500, "firmware says hi");
    assert_eq!(event.kind(), None);
    assert_eq!(event.name(), OTHER);
    assert_eq!(link.handle_indication(&event), LinkChange::None);
    assert!(!link.is_joined());
}

// ============================================================================
// Connection State
// ============================================================================

#[test]
fn join_transition_happens_once_across_threads() {
    let link = Arc::new(ConnectionState::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let link = Arc::clone(&link);
            thread::spawn(move || {
                let event = IndicationEvent::new(Indication::NtpServerDelivery, "");
                link.handle_indication(&event)
            })
        })
        .collect();

    let joins = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|c| *c == LinkChange::Joined)
        .count();
    assert_eq!(joins, 1);
    assert!(link.is_joined());
}

#[test]
fn socket_closed_reports_loss_once() {
    let link = ConnectionState::new();
    link.socket_opened(SocketId(u16::MAX));
    assert_eq!(link.socket(), Some(SocketId(u16::MAX)));

    let closed = IndicationEvent::new(Indication::SocketClosed, "");
    assert_eq!(link.handle_indication(&closed), LinkChange::SocketLost);
    assert_eq!(link.handle_indication(&closed), LinkChange::None);
    assert!(!link.is_socket_open());
}

#[test]
fn static_connection_state() {
    static LINK: ConnectionState = ConnectionState::new();
    LINK.socket_opened(SocketId(2));
    assert_eq!(LINK.socket_closed(), Some(SocketId(2)));
    assert_eq!(LINK.socket_closed(), None);
}

// ============================================================================
// Line Buffer
// ============================================================================

#[test]
fn line_buffer_zeroes_consumed_slots() {
    let mut line = LineBuffer::new();
    let mut buf = *b"close\0\0\0";
    assert_eq!(line.absorb(&mut buf), 5);
    assert_eq!(buf, [0u8; 8]);
    assert_eq!(line.take_command(), Command::Close);
    assert!(line.is_empty());
}

#[test]
fn line_buffer_overflow_never_matches() {
    let mut line = LineBuffer::new();
    let mut big = [b'a'; 512];
    line.absorb(&mut big);
    let mut tail = *b"open";
    line.absorb(&mut tail);
    assert!(line.overflowed());
    assert_eq!(line.take_command(), Command::Unknown);
    assert!(!line.overflowed());
}

#[test]
fn empty_input_is_unknown() {
    let mut line = LineBuffer::new();
    let mut buf = [0u8; 16];
    assert_eq!(line.absorb(&mut buf), 0);
    assert_eq!(line.take_command(), Command::Unknown);
}

// ============================================================================
// Servo Boundaries
// ============================================================================

#[test]
fn servo_duty_at_angle_bounds() {
    let cal = ServoCalibration::default();
    assert!((cal.duty_for_angle(0.0).unwrap() - 0.05).abs() < 1e-6);
    assert!((cal.duty_for_angle(90.0).unwrap() - 0.075).abs() < 1e-6);
    assert!((cal.duty_for_angle(180.0).unwrap() - 0.10).abs() < 1e-6);
}

#[test]
fn servo_rejects_nan_and_negative() {
    let cal = ServoCalibration::default();
    assert!(matches!(
        cal.duty_for_angle(-0.1),
        Err(Error::AngleOutOfRange { .. })
    ));
    assert!(cal.duty_for_angle(f32::NAN).is_err());
}

#[test]
fn servo_calibration_limits_are_inclusive() {
    assert!(ServoCalibration::new(0.1, 3.0).is_ok());
    assert!(ServoCalibration::new(1.5, 1.6).is_ok());
    assert!(ServoCalibration::new(0.09, 2.0).is_err());
    assert!(ServoCalibration::new(1.0, 3.01).is_err());
}

#[test]
fn custom_calibration_shifts_duty() {
    let cal = ServoCalibration::new(0.5, 2.5).unwrap();
    assert!((cal.duty_for_angle(0.0).unwrap() - 0.025).abs() < 1e-6);
    assert!((cal.duty_for_angle(180.0).unwrap() - 0.125).abs() < 1e-6);
}

// ============================================================================
// Backoff / Time
// ============================================================================

#[test]
fn backoff_caps_gap() {
    let mut backoff = Backoff::new(3);
    for _ in 0..10 {
        backoff.record_failure();
    }
    assert_eq!(backoff.skip_remaining(), 3);
}

#[test]
fn time_of_day_at_midnight_rollover() {
    assert_eq!(
        format!("{}", TimeOfDay::from_unix_secs(86_399)),
        "23:59:59"
    );
    assert_eq!(format!("{}", TimeOfDay::from_unix_secs(86_400)), "00:00:00");
}
