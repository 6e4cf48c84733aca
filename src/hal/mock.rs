//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware and network traits,
//! enabling development and testing on desktop without the board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockTouch`] | [`TouchSensor`] | Queued touch readings |
//! | [`MockLight`] | [`LightSensor`] | Queued light levels, last one sticks |
//! | [`MockServo`] | [`ServoMotor`] | Records positions, optional failure |
//! | [`MockBuzzer`] | [`Buzzer`] | Counts beeps |
//! | [`MockLed`] | [`StatusLed`] | Tracks pin state |
//! | [`MockDisplay`] | [`CharacterDisplay`] | Records LCD calls |
//! | [`MockClock`] | [`Clock`] | Settable time of day |
//! | [`MockDelay`] | [`DelayNs`] | Records sleeps instead of sleeping |
//! | [`MockTransport`] | [`WifiTransport`] | Scripted socket and event traffic |
//!
//! [`MockBoard`] bundles the hardware mocks for a
//! [`Session`](crate::Session).
//!
//! # Example
//!
//! ```rust
//! use garage_link::hal::MockTransport;
//! use garage_link::traits::{Protocol, Security, WifiTransport};
//!
//! let mut transport = MockTransport::new();
//! transport.queue_inbound(b"close");
//!
//! let id = transport.open_socket("10.0.0.2", 80, Protocol::Tcp, Security::None).unwrap();
//! assert_eq!(transport.query_socket(id).unwrap(), 5);
//!
//! let mut buf = [0u8; 16];
//! assert_eq!(transport.read_socket(id, &mut buf).unwrap(), 5);
//! assert_eq!(&buf[..5], b"close");
//! ```
//!
//! [`TouchSensor`]: crate::traits::TouchSensor
//! [`LightSensor`]: crate::traits::LightSensor
//! [`ServoMotor`]: crate::traits::ServoMotor
//! [`Buzzer`]: crate::traits::Buzzer
//! [`StatusLed`]: crate::traits::StatusLed
//! [`CharacterDisplay`]: crate::traits::CharacterDisplay
//! [`Clock`]: crate::traits::Clock
//! [`WifiTransport`]: crate::traits::WifiTransport

extern crate alloc;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::PinState;

use crate::connection::SocketId;
use crate::error::{Error, Result};
use crate::indication::{ErrorEvent, Indication, IndicationEvent, TransportEvent};
use crate::servo::check_angle;
use crate::session::{Board, Peripherals};
use crate::traits::{
    Buzzer, CharacterDisplay, Clock, LightSensor, Protocol, Security, ServoMotor, StatusLed,
    TimeOfDay, TouchSensor, WifiTransport,
};

// ============================================================================
// Sensor Mocks
// ============================================================================

/// Mock touch pad.
///
/// Queued readings are returned first, in order; once the queue is empty
/// the pad reports its held state.
///
/// # Example
///
/// ```rust
/// use garage_link::hal::MockTouch;
/// use garage_link::traits::TouchSensor;
///
/// let mut touch = MockTouch::new();
/// touch.queue(&[true, false]);
/// assert!(touch.is_touched());
/// assert!(!touch.is_touched());
///
/// touch.press();
/// assert!(touch.is_touched());
/// assert_eq!(touch.reads, 3);
/// ```
#[derive(Debug, Default)]
pub struct MockTouch {
    readings: VecDeque<bool>,
    held: bool,
    /// Number of times the pad was read.
    pub reads: usize,
}

impl MockTouch {
    /// Creates an untouched pad.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues readings returned before the held state.
    pub fn queue(&mut self, readings: &[bool]) {
        self.readings.extend(readings.iter().copied());
    }

    /// Holds the pad down.
    pub fn press(&mut self) {
        self.held = true;
    }

    /// Lets go of the pad.
    pub fn release(&mut self) {
        self.held = false;
    }
}

impl TouchSensor for MockTouch {
    fn is_touched(&mut self) -> bool {
        self.reads += 1;
        self.readings.pop_front().unwrap_or(self.held)
    }
}

/// Mock light sensor.
///
/// Returns queued levels in order. Each returned level becomes the
/// resting level once the queue runs dry.
#[derive(Debug, Default)]
pub struct MockLight {
    readings: VecDeque<f32>,
    level: f32,
    /// Number of times the sensor was read.
    pub reads: usize,
}

impl MockLight {
    /// Creates a sensor reading 0 (uncovered).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sensor resting at `level`.
    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }

    /// Queues levels returned one per read.
    pub fn queue(&mut self, levels: &[f32]) {
        self.readings.extend(levels.iter().copied());
    }

    /// Sets the resting level and drops anything queued.
    pub fn set_level(&mut self, level: f32) {
        self.readings.clear();
        self.level = level;
    }
}

impl LightSensor for MockLight {
    fn read_level(&mut self) -> f32 {
        self.reads += 1;
        if let Some(level) = self.readings.pop_front() {
            self.level = level;
        }
        self.level
    }
}

// ============================================================================
// Actuator Mocks
// ============================================================================

/// Mock servo.
///
/// Validates angles like a real driver and records every accepted
/// position. Set `fail_with` to make the next moves fail.
#[derive(Debug, Default)]
pub struct MockServo {
    /// Last accepted position in degrees, `None` before the first move.
    pub position: Option<f32>,
    /// Every accepted position in order.
    pub history: Vec<f32>,
    /// Error returned by `set_position` while set.
    pub fail_with: Option<Error>,
}

impl MockServo {
    /// Creates an unpositioned servo.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServoMotor for MockServo {
    fn set_position(&mut self, degrees: f32) -> Result<()> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        check_angle(degrees)?;
        self.position = Some(degrees);
        self.history.push(degrees);
        Ok(())
    }
}

/// Mock buzzer.
#[derive(Debug, Default)]
pub struct MockBuzzer {
    /// Whether the buzzer is currently driven on.
    pub on: bool,
    /// Number of completed beeps.
    pub beeps: usize,
}

impl MockBuzzer {
    /// Creates a silent buzzer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Buzzer for MockBuzzer {
    fn turn_on(&mut self) {
        self.on = true;
    }

    fn turn_off(&mut self) {
        self.on = false;
    }

    fn beep(&mut self) {
        self.turn_on();
        self.turn_off();
        self.beeps += 1;
    }
}

/// Mock status LED.
#[derive(Debug)]
pub struct MockLed {
    /// Current pin level.
    pub state: PinState,
    /// Number of pin writes.
    pub writes: usize,
}

impl MockLed {
    /// Creates an LED that is off.
    pub fn new() -> Self {
        Self {
            state: PinState::Low,
            writes: 0,
        }
    }

    /// Returns true while the pin is high.
    pub fn is_on(&self) -> bool {
        self.state == PinState::High
    }
}

impl Default for MockLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLed for MockLed {
    fn set(&mut self, state: PinState) {
        self.state = state;
        self.writes += 1;
    }
}

// ============================================================================
// Display / Time Mocks
// ============================================================================

/// A call made on a [`MockDisplay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayCall {
    /// `clear()`
    Clear,
    /// `set_backlight_rgb(r, g, b)`
    Backlight(u8, u8, u8),
    /// `set_cursor(col, row)`
    Cursor(u8, u8),
    /// `write_str(text)`
    Write(String),
}

/// Mock character LCD.
///
/// Records every call. Set `fail` to make every call return `Err(())`.
///
/// # Example
///
/// ```rust
/// use garage_link::hal::{DisplayCall, MockDisplay};
/// use garage_link::traits::CharacterDisplay;
///
/// let mut lcd = MockDisplay::new();
/// lcd.set_cursor(7, 1).unwrap();
/// lcd.write_str("12:00:00").unwrap();
///
/// assert_eq!(lcd.calls[0], DisplayCall::Cursor(7, 1));
/// assert_eq!(lcd.last_text(), Some("12:00:00"));
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Every successful call in order.
    pub calls: Vec<DisplayCall>,
    /// Fail every call while set.
    pub fail: bool,
}

impl MockDisplay {
    /// Creates a blank display.
    pub fn new() -> Self {
        Self::default()
    }

    /// All text written, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Write(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The most recent text written.
    pub fn last_text(&self) -> Option<&str> {
        self.texts().last().copied()
    }

    fn record(&mut self, call: DisplayCall) -> core::result::Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.calls.push(call);
        Ok(())
    }
}

impl CharacterDisplay for MockDisplay {
    type Error = ();

    fn clear(&mut self) -> core::result::Result<(), ()> {
        self.record(DisplayCall::Clear)
    }

    fn set_backlight_rgb(&mut self, r: u8, g: u8, b: u8) -> core::result::Result<(), ()> {
        self.record(DisplayCall::Backlight(r, g, b))
    }

    fn set_cursor(&mut self, col: u8, row: u8) -> core::result::Result<(), ()> {
        self.record(DisplayCall::Cursor(col, row))
    }

    fn write_str(&mut self, text: &str) -> core::result::Result<(), ()> {
        self.record(DisplayCall::Write(text.into()))
    }
}

/// Mock wall clock.
///
/// Unset until [`MockClock::set`] is called.
#[derive(Debug, Default)]
pub struct MockClock {
    time: Option<TimeOfDay>,
}

impl MockClock {
    /// Creates an unset clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock showing `time`.
    pub fn at(time: TimeOfDay) -> Self {
        Self { time: Some(time) }
    }

    /// Sets the time of day.
    pub fn set(&mut self, time: TimeOfDay) {
        self.time = Some(time);
    }

    /// Forgets the time, as before the first SNTP sync.
    pub fn unset(&mut self) {
        self.time = None;
    }
}

impl Clock for MockClock {
    fn time_of_day(&self) -> Option<TimeOfDay> {
        self.time
    }
}

/// Mock delay that records sleeps and returns immediately.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Every `delay_ms` argument in order.
    pub sleeps_ms: Vec<u32>,
    /// Total requested delay in nanoseconds.
    pub total_ns: u64,
}

impl MockDelay {
    /// Creates a delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps_ms.push(ms);
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

// ============================================================================
// Network Mocks
// ============================================================================

/// Errors produced by [`MockTransport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockTransportError {
    /// The chip could not be powered.
    PowerFailure,
    /// The peer refused the connection.
    Refused,
    /// The socket write failed.
    WriteFailed,
    /// Querying or reading the socket failed.
    ReadFailed,
}

/// Scripted WiFi transport.
///
/// Socket ids are handed out in increasing order starting at 0. Inbound
/// bytes are shared by every socket. Queue indications with
/// [`push_indication`](Self::push_indication); they are delivered through
/// `poll_event` in order.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Whether `turn_on` was called.
    pub powered: bool,
    /// Every successful open as (host, port, id).
    pub opened: Vec<(String, u16, SocketId)>,
    /// Number of failed open attempts.
    pub failed_opens: usize,
    /// Every successful write as (socket, payload).
    pub writes: Vec<(SocketId, Vec<u8>)>,
    /// Number of upcoming opens that fail.
    pub fail_opens: usize,
    /// Number of upcoming writes that fail.
    pub fail_writes: usize,
    /// Fail the next query.
    pub fail_query: bool,
    /// Fail `turn_on`.
    pub fail_power: bool,
    /// Largest byte count `query_socket` reports at once.
    pub chunk_limit: Option<usize>,
    inbound: VecDeque<u8>,
    events: VecDeque<TransportEvent>,
    next_id: u16,
}

impl MockTransport {
    /// Creates an idle transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes for the socket to receive.
    pub fn queue_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Bytes queued but not yet read.
    pub fn inbound_pending(&self) -> usize {
        self.inbound.len()
    }

    /// Queues an indication for `poll_event`.
    pub fn push_indication(&mut self, event: IndicationEvent) {
        self.events.push_back(event.into());
    }

    /// Queues an error event for `poll_event`.
    pub fn push_error(&mut self, event: ErrorEvent) {
        self.events.push_back(event.into());
    }

    /// Queues the network-joined indication.
    pub fn join(&mut self) {
        self.push_indication(IndicationEvent::new(
            Indication::NtpServerDelivery,
            "pool.ntp.org",
        ));
    }

    /// Queues a socket-closed indication, as when the peer hangs up.
    pub fn hang_up(&mut self) {
        self.push_indication(IndicationEvent::new(Indication::SocketClosed, "0"));
    }

    /// Events not yet polled.
    pub fn events_pending(&self) -> usize {
        self.events.len()
    }

    /// Written payloads as text, in order.
    pub fn written_text(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }
}

impl WifiTransport for MockTransport {
    type Error = MockTransportError;

    fn turn_on(&mut self) -> core::result::Result<(), MockTransportError> {
        if self.fail_power {
            return Err(MockTransportError::PowerFailure);
        }
        self.powered = true;
        Ok(())
    }

    fn open_socket(
        &mut self,
        host: &str,
        port: u16,
        _protocol: Protocol,
        _security: Security,
    ) -> core::result::Result<SocketId, MockTransportError> {
        if self.fail_opens > 0 {
            self.fail_opens -= 1;
            self.failed_opens += 1;
            return Err(MockTransportError::Refused);
        }
        let id = SocketId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.opened.push((host.into(), port, id));
        Ok(id)
    }

    fn write_socket(
        &mut self,
        id: SocketId,
        data: &[u8],
    ) -> core::result::Result<(), MockTransportError> {
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err(MockTransportError::WriteFailed);
        }
        self.writes.push((id, data.to_vec()));
        Ok(())
    }

    fn query_socket(&mut self, _id: SocketId) -> core::result::Result<usize, MockTransportError> {
        if self.fail_query {
            self.fail_query = false;
            return Err(MockTransportError::ReadFailed);
        }
        let pending = self.inbound.len();
        Ok(self.chunk_limit.map_or(pending, |limit| pending.min(limit)))
    }

    fn read_socket(
        &mut self,
        _id: SocketId,
        buffer: &mut [u8],
    ) -> core::result::Result<usize, MockTransportError> {
        let mut count = 0;
        for slot in buffer.iter_mut() {
            match self.inbound.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.events.pop_front()
    }
}

// ============================================================================
// Board
// ============================================================================

/// A [`Board`] made of the mocks in this module.
#[derive(Debug)]
pub struct MockBoard;

impl Board for MockBoard {
    type Touch = MockTouch;
    type Light = MockLight;
    type Servo = MockServo;
    type Buzzer = MockBuzzer;
    type Led = MockLed;
    type Display = MockDisplay;
    type Clock = MockClock;
    type Delay = MockDelay;
}

impl MockBoard {
    /// Fresh mock peripherals: untouched pad, uncovered sensor, unset clock.
    pub fn peripherals() -> Peripherals<MockBoard> {
        Peripherals {
            touch: MockTouch::new(),
            light: MockLight::new(),
            servo: MockServo::new(),
            buzzer: MockBuzzer::new(),
            led: MockLed::new(),
            display: MockDisplay::new(),
            clock: MockClock::new(),
            delay: MockDelay::new(),
        }
    }
}
