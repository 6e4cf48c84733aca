//! Session loop behavior against the mock board and transport

use garage_link::hal::{DisplayCall, MockBoard, MockTransport};
use garage_link::indication::{ErrorEvent, Indication, IndicationEvent};
use garage_link::{
    Config, ConnectionState, DoorConfig, Error, Notification, Peripherals, Phase,
    ReconnectConfig, SensorConfig, Session, SocketId, TimeOfDay, TouchMode,
};

type MockSession<'a> = Session<'a, MockTransport, MockBoard>;

fn session<'a>(
    link: &'a ConnectionState,
    peripherals: Peripherals<MockBoard>,
    config: Config,
) -> MockSession<'a> {
    let mut transport = MockTransport::new();
    transport.join();
    let mut session = Session::new(transport, link, peripherals, config).unwrap();
    session.start().unwrap();
    session.wait_for_join();
    session
}

fn default_session(link: &ConnectionState) -> MockSession<'_> {
    session(link, MockBoard::peripherals(), Config::default())
}

fn receive(session: &mut MockSession<'_>, bytes: &[u8]) {
    session.transport_mut().queue_inbound(bytes);
    session.step().unwrap();
}

const OPEN: &str = "Someone wants to open the garage";
const CAR: &str = "Car in the garage";
const CLEAR: &str = "You can close the garage";

// ============================================================================
// Startup
// ============================================================================

#[test]
fn startup_parks_door_and_draws_banner() {
    let link = ConnectionState::new();
    let session = default_session(&link);

    let door = session.door();
    assert_eq!(door.servo().position, Some(180.0));
    assert!(!door.led().is_on());
    assert_eq!(door.buzzer().beeps, 0);
    assert!(!door.is_open());

    assert!(session.transport().powered);
    assert_eq!(
        session.display().calls,
        vec![
            DisplayCall::Clear,
            DisplayCall::Backlight(100, 100, 100),
            DisplayCall::Write("Time:".into()),
        ]
    );
}

#[test]
fn startup_survives_power_and_display_failures() {
    let link = ConnectionState::new();
    let mut peripherals = MockBoard::peripherals();
    peripherals.display.fail = true;

    let mut transport = MockTransport::new();
    transport.fail_power = true;
    transport.join();

    let mut session = Session::new(transport, &link, peripherals, Config::default()).unwrap();
    session.start().unwrap();
    session.wait_for_join();
    session.step().unwrap();

    assert!(!session.transport().powered);
    assert!(session.display().calls.is_empty());
    assert!(session.connection().socket_open());
}

#[test]
fn rejects_out_of_range_door_angle() {
    let link = ConnectionState::new();
    let config = Config::default().with_door(DoorConfig::default().with_open_angle(200.0));
    let result = Session::new(MockTransport::new(), &link, MockBoard::peripherals(), config);
    assert!(matches!(
        result,
        Err(Error::AngleOutOfRange { degrees }) if degrees == 200.0
    ));
}

#[test]
fn wait_for_join_returns_once_time_syncs() {
    let link = ConnectionState::new();
    let mut transport = MockTransport::new();
    transport.push_indication(IndicationEvent::new(Indication::WiFiUp, ""));
    transport.push_indication(IndicationEvent::new(Indication::DhcpReply, "10.0.0.9"));
    transport.join();

    let mut session =
        Session::new(transport, &link, MockBoard::peripherals(), Config::default()).unwrap();
    assert!(!session.connection().joined);
    session.wait_for_join();

    assert!(session.connection().joined);
    assert!(!session.connection().socket_open());
    assert_eq!(session.transport().events_pending(), 0);
    assert!(session.delay().sleeps_ms.is_empty());
}

// ============================================================================
// Connection Lifecycle
// ============================================================================

#[test]
fn first_iteration_opens_socket_to_configured_peer() {
    let link = ConnectionState::new();
    let config = Config::default().with_server(
        garage_link::ServerConfig::default()
            .with_host("10.1.2.3")
            .with_port(9000),
    );
    let mut session = session(&link, MockBoard::peripherals(), config);
    session.step().unwrap();

    assert_eq!(
        session.transport().opened,
        vec![("10.1.2.3".to_string(), 9000, SocketId(0))]
    );
    assert_eq!(link.socket(), Some(SocketId(0)));
    assert_eq!(session.stats().sockets_opened, 1);
}

#[test]
fn repeated_time_sync_does_not_reopen() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.step().unwrap();

    session.transport_mut().join();
    session.step().unwrap();
    session.step().unwrap();

    assert_eq!(session.transport().opened.len(), 1);
    assert_eq!(link.socket(), Some(SocketId(0)));
}

#[test]
fn socket_closed_causes_exactly_one_reopen() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.step().unwrap();

    session.transport_mut().hang_up();
    session.step().unwrap();
    session.step().unwrap();
    session.step().unwrap();

    let ids: Vec<SocketId> = session.transport().opened.iter().map(|o| o.2).collect();
    assert_eq!(ids, vec![SocketId(0), SocketId(1)]);
    assert_eq!(link.socket(), Some(SocketId(1)));
}

#[test]
fn socket_closed_without_open_socket_is_harmless() {
    let link = ConnectionState::new();
    let mut transport = MockTransport::new();
    transport.join();
    transport.hang_up();

    let mut session =
        Session::new(transport, &link, MockBoard::peripherals(), Config::default()).unwrap();
    assert_eq!(session.pump_events(), 2);
    assert!(session.connection().joined);
    assert!(!session.connection().socket_open());
}

#[test]
fn error_events_change_nothing() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.step().unwrap();
    let before = session.connection();

    session
        .transport_mut()
        .push_error(ErrorEvent::new(17, "socket failure"));
    assert_eq!(session.pump_events(), 1);
    assert_eq!(session.connection(), before);
}

#[test]
fn failed_opens_back_off_exponentially() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.transport_mut().fail_opens = 3;

    // Attempts on iterations 1, 3 and 6; 7 to 10 are skipped.
    for _ in 0..10 {
        session.step().unwrap();
    }
    assert_eq!(session.transport().failed_opens, 3);
    assert!(session.transport().opened.is_empty());
    assert_eq!(session.stats().open_failures, 3);

    session.step().unwrap();
    assert_eq!(session.transport().opened.len(), 1);
    assert_eq!(session.stats().open_failures, 0);
}

#[test]
fn zero_backoff_retries_every_iteration() {
    let link = ConnectionState::new();
    let config = Config::default()
        .with_reconnect(ReconnectConfig::default().with_max_backoff_iterations(0));
    let mut session = session(&link, MockBoard::peripherals(), config);
    session.transport_mut().fail_opens = 4;

    for _ in 0..5 {
        session.step().unwrap();
    }
    assert_eq!(session.transport().failed_opens, 4);
    assert_eq!(session.transport().opened.len(), 1);
}

#[test]
fn write_failure_drops_socket_and_resends_after_reopen() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.step().unwrap();

    session.transport_mut().fail_writes = 1;
    session.touch_mut().queue(&[true]);
    session.step().unwrap();
    assert_eq!(link.socket(), None);
    assert_eq!(session.pending_notifications().count(), 1);

    session.step().unwrap();
    assert_eq!(link.socket(), Some(SocketId(1)));
    assert_eq!(
        session.transport().writes,
        vec![(SocketId(1), OPEN.as_bytes().to_vec())]
    );
    assert_eq!(session.pending_notifications().count(), 0);
}

#[test]
fn query_failure_drops_socket() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.step().unwrap();

    session.transport_mut().fail_query = true;
    session.step().unwrap();
    assert!(!session.connection().socket_open());

    session.step().unwrap();
    assert_eq!(session.transport().opened.len(), 2);
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn open_command_drives_door_open() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"open");

    let door = session.door();
    assert!(door.is_open());
    assert_eq!(door.servo().position, Some(0.0));
    assert!(door.led().is_on());
    assert_eq!(door.buzzer().beeps, 1);
    assert_eq!(session.stats().commands_dispatched, 1);
    assert_eq!(session.transport().inbound_pending(), 0);
}

#[test]
fn close_command_keeps_open_flag() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"open");
    receive(&mut session, b"close");

    let door = session.door();
    assert_eq!(door.servo().history, vec![180.0, 0.0, 180.0]);
    assert!(!door.led().is_on());
    assert_eq!(door.buzzer().beeps, 2);
    assert!(door.is_open());
}

#[test]
fn close_clears_open_flag_when_configured() {
    let link = ConnectionState::new();
    let config =
        Config::default().with_door(DoorConfig::default().with_close_clears_open_flag(true));
    let mut session = session(&link, MockBoard::peripherals(), config);
    receive(&mut session, b"open");
    receive(&mut session, b"close");
    assert!(!session.door().is_open());
}

#[test]
fn unrecognized_commands_are_ignored() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    for junk in [&b"OPEN"[..], &b"open\r\n"[..], &b"opne"[..], &b" close"[..]] {
        receive(&mut session, junk);
    }

    let door = session.door();
    assert_eq!(door.servo().history, vec![180.0]);
    assert_eq!(door.buzzer().beeps, 0);
    assert_eq!(session.stats().commands_dispatched, 0);
}

#[test]
fn nul_bytes_are_skipped_when_assembling() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"op\0en");
    assert!(session.door().is_open());
}

#[test]
fn command_split_across_polls_is_not_reassembled() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.transport_mut().chunk_limit = Some(2);
    receive(&mut session, b"open");
    session.step().unwrap();

    assert!(!session.door().is_open());
    assert_eq!(session.transport().inbound_pending(), 0);
}

#[test]
fn oversized_read_is_capped_at_buffer() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, &[b'x'; 600]);

    assert_eq!(session.transport().inbound_pending(), 88);
    assert!(!session.door().is_open());
}

#[test]
fn no_commands_read_without_socket() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.transport_mut().fail_opens = 1;
    receive(&mut session, b"open");

    assert!(!session.door().is_open());
    assert_eq!(session.transport().inbound_pending(), 4);
}

// ============================================================================
// Actuator Faults
// ============================================================================

#[test]
fn servo_fault_is_logged_and_loop_keeps_running() {
    let link = ConnectionState::new();
    let mut peripherals = MockBoard::peripherals();
    peripherals.servo.fail_with = Some(Error::Actuator("servo pwm"));
    let mut session = session(&link, peripherals, Config::default());
    assert_eq!(session.stats().actuator_failures, 1);

    session.transport_mut().queue_inbound(b"open");
    assert_eq!(session.tick().unwrap(), Phase::Running);
    for _ in 0..3 {
        assert_eq!(session.tick().unwrap(), Phase::Running);
    }

    let door = session.door();
    assert!(!door.is_open());
    assert!(!door.led().is_on());
    assert_eq!(door.servo().position, None);
    assert_eq!(session.stats().actuator_failures, 2);
    assert_eq!(session.stats().commands_dispatched, 0);
    assert_eq!(session.stats().iterations, 4);
}

#[test]
fn servo_range_error_still_propagates() {
    let link = ConnectionState::new();
    let mut peripherals = MockBoard::peripherals();
    peripherals.servo.fail_with = Some(Error::AngleOutOfRange { degrees: 190.0 });

    let mut transport = MockTransport::new();
    transport.join();
    let mut session = Session::new(transport, &link, peripherals, Config::default()).unwrap();
    assert!(matches!(
        session.start(),
        Err(Error::AngleOutOfRange { .. })
    ));
    assert_eq!(session.stats().actuator_failures, 0);
}

// ============================================================================
// Touch
// ============================================================================

#[test]
fn level_touch_notifies_every_iteration() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.touch_mut().press();
    for _ in 0..3 {
        session.tick().unwrap();
    }
    assert_eq!(session.transport().written_text(), vec![OPEN; 3]);
    assert_eq!(session.stats().notifications_sent, 3);
}

#[test]
fn edge_touch_notifies_once_per_press() {
    let link = ConnectionState::new();
    let config =
        Config::default().with_sensors(SensorConfig::default().with_touch_mode(TouchMode::Edge));
    let mut session = session(&link, MockBoard::peripherals(), config);

    session.touch_mut().press();
    for _ in 0..3 {
        session.step().unwrap();
    }
    session.touch_mut().release();
    session.step().unwrap();
    session.touch_mut().press();
    session.step().unwrap();

    assert_eq!(session.transport().written_text(), vec![OPEN; 2]);
}

#[test]
fn edge_latch_resets_when_car_clears() {
    let link = ConnectionState::new();
    let config =
        Config::default().with_sensors(SensorConfig::default().with_touch_mode(TouchMode::Edge));
    let mut session = session(&link, MockBoard::peripherals(), config);
    receive(&mut session, b"open");

    // Pressed as the car arrives and held through the wait.
    session.touch_mut().press();
    session.light_mut().set_level(80.0);
    assert_eq!(session.step().unwrap(), Phase::WaitingForClear);
    session.step().unwrap();
    session.light_mut().set_level(10.0);
    assert_eq!(session.step().unwrap(), Phase::Running);

    session.step().unwrap();
    session.step().unwrap();
    assert_eq!(session.transport().written_text(), vec![OPEN, CAR, CLEAR, OPEN]);
}

// ============================================================================
// Car Detection
// ============================================================================

#[test]
fn covered_sensor_with_open_door_announces_car_then_clear() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"open");

    session.light_mut().queue(&[70.0, 70.0, 55.0]);
    assert_eq!(session.step().unwrap(), Phase::WaitingForClear);
    assert_eq!(session.step().unwrap(), Phase::WaitingForClear);
    assert_eq!(session.step().unwrap(), Phase::Running);

    assert_eq!(session.transport().written_text(), vec![CAR, CLEAR]);
}

#[test]
fn covered_sensor_with_door_flag_clear_stays_quiet() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.light_mut().set_level(90.0);
    for _ in 0..3 {
        assert_eq!(session.step().unwrap(), Phase::Running);
    }
    assert!(session.transport().writes.is_empty());
}

#[test]
fn threshold_level_is_not_covered() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"open");
    session.light_mut().set_level(60.0);
    assert_eq!(session.step().unwrap(), Phase::Running);
    assert!(session.transport().writes.is_empty());
}

#[test]
fn car_watch_stays_armed_after_close() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"open");
    receive(&mut session, b"close");

    session.light_mut().set_level(80.0);
    session.step().unwrap();
    assert_eq!(session.transport().written_text(), vec![CAR]);
}

#[test]
fn waiting_for_clear_starves_touch_clock_and_commands() {
    let link = ConnectionState::new();
    let mut peripherals = MockBoard::peripherals();
    peripherals.clock.set(TimeOfDay::new(12, 0, 0));
    let mut session = session(&link, peripherals, Config::default());
    receive(&mut session, b"open");

    session.light_mut().set_level(80.0);
    session.step().unwrap();
    assert_eq!(session.phase(), Phase::WaitingForClear);

    let touch_reads = session.touch_mut().reads;
    let lcd_calls = session.display().calls.len();
    session.touch_mut().press();
    session.transport_mut().queue_inbound(b"close");
    for _ in 0..5 {
        session.step().unwrap();
    }

    assert_eq!(session.touch_mut().reads, touch_reads);
    assert_eq!(session.display().calls.len(), lcd_calls);
    assert_eq!(session.transport().inbound_pending(), 5);
    assert_eq!(session.transport().written_text(), vec![CAR]);

    // Clearing sends the all-clear and handles the pending command.
    session.light_mut().set_level(10.0);
    assert_eq!(session.step().unwrap(), Phase::Running);
    assert_eq!(session.transport().written_text(), vec![CAR, CLEAR]);
    assert_eq!(session.door().servo().position, Some(180.0));
    assert_eq!(session.touch_mut().reads, touch_reads);
}

#[test]
fn tick_sleeps_by_phase() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    receive(&mut session, b"open");

    session.tick().unwrap();
    session.light_mut().set_level(80.0);
    session.tick().unwrap();
    session.tick().unwrap();

    assert_eq!(session.delay().sleeps_ms, vec![100, 50, 50]);
}

// ============================================================================
// Outbox
// ============================================================================

#[test]
fn notifications_wait_for_socket_then_flush_in_order() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.transport_mut().fail_opens = 1;
    session.touch_mut().queue(&[true]);

    session.step().unwrap();
    assert_eq!(
        session.pending_notifications().copied().collect::<Vec<_>>(),
        vec![Notification::OpenRequested]
    );

    // One iteration of backoff, then the reopen flushes.
    session.step().unwrap();
    assert!(session.transport().writes.is_empty());
    session.step().unwrap();

    assert_eq!(session.transport().written_text(), vec![OPEN]);
    assert_eq!(session.pending_notifications().count(), 0);
}

#[test]
fn full_outbox_drops_newest() {
    let link = ConnectionState::new();
    let config = Config::default()
        .with_reconnect(ReconnectConfig::default().with_max_backoff_iterations(0));
    let mut session = session(&link, MockBoard::peripherals(), config);
    session.transport_mut().fail_opens = 10;
    session.touch_mut().press();

    for _ in 0..10 {
        session.step().unwrap();
    }
    assert_eq!(
        session.pending_notifications().count(),
        garage_link::session::OUTBOX_LEN
    );
    assert_eq!(session.stats().notifications_dropped, 2);

    session.step().unwrap();
    assert_eq!(session.transport().writes.len(), 9);
    assert_eq!(session.stats().notifications_sent, 9);
}

// ============================================================================
// Clock
// ============================================================================

#[test]
fn clock_is_rendered_each_iteration() {
    let link = ConnectionState::new();
    let mut peripherals = MockBoard::peripherals();
    peripherals.clock.set(TimeOfDay::new(8, 5, 3));
    let mut session = session(&link, peripherals, Config::default());

    session.step().unwrap();
    session.clock_mut().set(TimeOfDay::new(8, 5, 4));
    session.step().unwrap();

    let calls = &session.display().calls[3..];
    assert_eq!(
        calls,
        &[
            DisplayCall::Cursor(7, 1),
            DisplayCall::Write("08:05:03".into()),
            DisplayCall::Cursor(7, 1),
            DisplayCall::Write("08:05:04".into()),
        ]
    );
}

#[test]
fn unset_clock_leaves_display_alone() {
    let link = ConnectionState::new();
    let mut session = default_session(&link);
    session.step().unwrap();
    assert_eq!(session.display().calls.len(), 3);
}
