//! The command session loop.
//!
//! [`Session`] ties the transport, the connection flags, the sensors and
//! the door together. It is a cooperative, single-threaded loop:
//!
//! 1. reopen the socket if it is closed (one attempt, subject to backoff)
//! 2. render the time of day on the LCD
//! 3. send a notification while the touch pad is pressed
//! 4. if the light sensor is covered while the door is open, announce the
//!    car and enter [`Phase::WaitingForClear`]
//! 5. drain pending socket bytes into the line buffer
//! 6. dispatch the reassembled command to the door
//! 7. sleep `loop_interval_ms`
//!
//! Transport events are pumped at the top of every iteration, on the loop
//! thread, so indication handling never overlaps an iteration.
//!
//! # Waiting for the car to clear
//!
//! While in [`Phase::WaitingForClear`] an iteration only pumps events and
//! polls the light sensor, then sleeps `clear_poll_ms`. Touch, the clock
//! and inbound commands are starved until the sensor reads at or below the
//! threshold; that iteration sends the all-clear and finishes with steps 5
//! and 6.
//!
//! In [`TouchMode::Edge`] the press latch is reset when the wait ends, so
//! a press still held at that point counts as a new press.
//!
//! # Actuator faults
//!
//! A driver failure ([`Error::Actuator`]) while parking or moving the door
//! is logged, counted in [`SessionStats::actuator_failures`] and leaves the
//! door flag and LED as they were. The loop keeps running.
//!
//! # Example
//!
//! ```rust
//! use garage_link::{Config, ConnectionState, Session};
//! use garage_link::hal::{MockBoard, MockTransport};
//! use garage_link::indication::{Indication, IndicationEvent};
//!
//! let link = ConnectionState::new();
//! let mut transport = MockTransport::new();
//! transport.push_indication(IndicationEvent::new(Indication::NtpServerDelivery, ""));
//! transport.queue_inbound(b"open");
//!
//! let mut session = Session::new(transport, &link, MockBoard::peripherals(), Config::default())
//!     .unwrap();
//! session.start().unwrap();
//! session.wait_for_join();
//! session.step().unwrap();
//!
//! assert!(session.door().is_open());
//! assert_eq!(session.transport().opened.len(), 1);
//! ```

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::{Deque, String as HString};

use crate::command::{LineBuffer, READ_BUFFER_LEN};
use crate::config::{Config, TouchMode};
use crate::connection::{ConnectionSnapshot, ConnectionState, SocketId};
use crate::door::{Dispatched, Door};
use crate::error::{Error, Result};
use crate::notification::Notification;
use crate::reconnect::Backoff;
use crate::traits::{
    Buzzer, CharacterDisplay, Clock, LightSensor, Protocol, Security, ServoMotor, StatusLed,
    TouchSensor, WifiTransport,
};

/// Notifications held while no socket is open.
pub const OUTBOX_LEN: usize = 8;

/// The set of device types a board provides.
///
/// Implement this on a marker type to plug a board into [`Session`].
pub trait Board {
    /// Touch pad.
    type Touch: TouchSensor;
    /// Light sensor.
    type Light: LightSensor;
    /// Door servo.
    type Servo: ServoMotor;
    /// Buzzer.
    type Buzzer: Buzzer;
    /// Door-open LED.
    type Led: StatusLed;
    /// Character LCD.
    type Display: CharacterDisplay;
    /// Wall clock.
    type Clock: Clock;
    /// Blocking delay.
    type Delay: DelayNs;
}

/// Device instances for a [`Board`].
pub struct Peripherals<B: Board> {
    /// Touch pad.
    pub touch: B::Touch,
    /// Light sensor.
    pub light: B::Light,
    /// Door servo.
    pub servo: B::Servo,
    /// Buzzer.
    pub buzzer: B::Buzzer,
    /// Door-open LED.
    pub led: B::Led,
    /// Character LCD.
    pub display: B::Display,
    /// Wall clock.
    pub clock: B::Clock,
    /// Blocking delay.
    pub delay: B::Delay,
}

/// Where the session is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Normal polling.
    #[default]
    Running,
    /// A car covered the light sensor; polling only the light sensor.
    WaitingForClear,
}

/// Counters for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionStats {
    /// Completed iterations.
    pub iterations: u64,
    /// Successful socket opens.
    pub sockets_opened: u32,
    /// Consecutive failed socket opens.
    pub open_failures: u32,
    /// Notifications written to a socket.
    pub notifications_sent: u32,
    /// Notifications dropped because the outbox was full.
    pub notifications_dropped: u32,
    /// Commands that moved the door.
    pub commands_dispatched: u32,
    /// Actuator driver failures absorbed by the loop.
    pub actuator_failures: u32,
}

/// The garage controller main loop.
pub struct Session<'a, W: WifiTransport, B: Board> {
    transport: W,
    link: &'a ConnectionState,
    touch: B::Touch,
    light: B::Light,
    door: Door<B::Servo, B::Buzzer, B::Led>,
    display: B::Display,
    clock: B::Clock,
    delay: B::Delay,
    config: Config,
    phase: Phase,
    read_buffer: [u8; READ_BUFFER_LEN],
    line: LineBuffer,
    outbox: Deque<Notification, OUTBOX_LEN>,
    backoff: Backoff,
    touch_was_down: bool,
    stats: SessionStats,
}

impl<'a, W: WifiTransport, B: Board> Session<'a, W, B> {
    /// Assembles a session.
    ///
    /// # Errors
    ///
    /// Fails if the configured door angles are out of range.
    pub fn new(
        transport: W,
        link: &'a ConnectionState,
        peripherals: Peripherals<B>,
        config: Config,
    ) -> Result<Self> {
        let Peripherals {
            touch,
            light,
            servo,
            buzzer,
            led,
            display,
            clock,
            delay,
        } = peripherals;
        let door = Door::new(servo, buzzer, led, config.door.clone())?;
        let backoff = Backoff::new(config.reconnect.max_backoff_iterations);

        Ok(Self {
            transport,
            link,
            touch,
            light,
            door,
            display,
            clock,
            delay,
            config,
            phase: Phase::Running,
            read_buffer: [0; READ_BUFFER_LEN],
            line: LineBuffer::new(),
            outbox: Deque::new(),
            backoff,
            touch_was_down: false,
            stats: SessionStats::default(),
        })
    }

    /// Startup sequence: park the door, power the WiFi chip, draw the LCD
    /// banner.
    pub fn start(&mut self) -> Result<()> {
        let parked = self.door.park();
        self.absorb_actuator("Door park", parked)?;

        if let Err(e) = self.transport.turn_on() {
            log::warn!("WiFi turn on failed: {:?}", e);
        }

        let display = &self.config.display;
        let (r, g, b) = display.backlight;
        if let Err(e) = self
            .display
            .clear()
            .and_then(|_| self.display.set_backlight_rgb(r, g, b))
            .and_then(|_| self.display.write_str(display.banner.as_str()))
        {
            log::debug!("LCD init failed: {:?}", e);
        }
        Ok(())
    }

    /// Applies every buffered transport event to the connection state.
    ///
    /// Returns the number of events handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.transport.poll_event() {
            self.link.handle_event(&event);
            handled += 1;
        }
        handled
    }

    /// Blocks until the network has joined, polling every `join_poll_ms`.
    pub fn wait_for_join(&mut self) {
        loop {
            self.pump_events();
            if self.link.is_joined() {
                return;
            }
            self.delay.delay_ms(self.config.timing.join_poll_ms);
        }
    }

    /// Runs the controller forever: startup, join wait, then iterations.
    ///
    /// Returns only if the network is left or an iteration fails with a
    /// servo range error.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        log::info!("Waiting for network");
        self.wait_for_join();
        log::info!(
            "Session started, peer {}:{}",
            self.config.server.host,
            self.config.server.port
        );
        while self.link.is_joined() {
            self.tick()?;
        }
        Ok(())
    }

    /// One iteration followed by the phase's sleep interval.
    pub fn tick(&mut self) -> Result<Phase> {
        let phase = self.step()?;
        let pause = match phase {
            Phase::Running => self.config.timing.loop_interval_ms,
            Phase::WaitingForClear => self.config.timing.clear_poll_ms,
        };
        self.delay.delay_ms(pause);
        Ok(phase)
    }

    /// One iteration without the trailing sleep.
    ///
    /// # Errors
    ///
    /// Only servo range errors escape. Transport and actuator driver
    /// failures are absorbed.
    pub fn step(&mut self) -> Result<Phase> {
        self.pump_events();
        self.stats.iterations = self.stats.iterations.saturating_add(1);

        if self.phase == Phase::WaitingForClear {
            if self.light_covered() {
                return Ok(self.phase);
            }
            self.phase = Phase::Running;
            self.touch_was_down = false;
            self.notify(Notification::ClearToClose);
            self.drain_socket();
            self.dispatch_line()?;
            return Ok(self.phase);
        }

        self.ensure_socket();
        self.render_clock();

        if self.touch_triggered() {
            self.notify(Notification::OpenRequested);
        }

        if self.light_covered() && self.door.is_open() {
            self.notify(Notification::CarInGarage);
            self.phase = Phase::WaitingForClear;
            return Ok(self.phase);
        }

        self.drain_socket();
        self.dispatch_line()?;
        Ok(self.phase)
    }

    fn ensure_socket(&mut self) {
        if self.link.is_socket_open() || !self.backoff.should_attempt() {
            return;
        }

        let server = &self.config.server;
        match self
            .transport
            .open_socket(server.host.as_str(), server.port, Protocol::Tcp, Security::None)
        {
            Ok(id) => {
                log::info!("Socket {} open to {}:{}", id.0, server.host, server.port);
                self.link.socket_opened(id);
                self.backoff.record_success();
                self.stats.sockets_opened = self.stats.sockets_opened.saturating_add(1);
                self.stats.open_failures = 0;
                self.flush_outbox(id);
            }
            Err(e) => {
                self.backoff.record_failure();
                self.stats.open_failures = self.backoff.failures();
                log::warn!(
                    "Socket open to {}:{} failed ({} in a row): {:?}",
                    server.host,
                    server.port,
                    self.stats.open_failures,
                    e
                );
                if self.stats.open_failures == self.config.reconnect.failure_report_threshold {
                    log::error!(
                        "Peer {}:{} unreachable after {} attempts",
                        server.host,
                        server.port,
                        self.stats.open_failures
                    );
                }
            }
        }
    }

    fn render_clock(&mut self) {
        let Some(time) = self.clock.time_of_day() else {
            return;
        };
        let mut text: HString<8> = HString::new();
        if write!(text, "{}", time).is_err() {
            log::warn!("Clock text {:?} does not fit the LCD field", time);
            return;
        }

        let display = &self.config.display;
        if let Err(e) = self
            .display
            .set_cursor(display.clock_col, display.clock_row)
            .and_then(|_| self.display.write_str(text.as_str()))
        {
            log::debug!("LCD clock update failed: {:?}", e);
        }
    }

    fn touch_triggered(&mut self) -> bool {
        let touched = self.touch.is_touched();
        let was_down = core::mem::replace(&mut self.touch_was_down, touched);
        match self.config.sensors.touch_mode {
            TouchMode::Level => touched,
            TouchMode::Edge => touched && !was_down,
        }
    }

    fn light_covered(&mut self) -> bool {
        self.light.read_level() > self.config.sensors.light_threshold
    }

    /// Sends a notification, or queues it until a socket is open.
    fn notify(&mut self, notification: Notification) {
        if let Some(id) = self.link.socket() {
            match self.transport.write_socket(id, notification.as_bytes()) {
                Ok(()) => {
                    self.stats.notifications_sent = self.stats.notifications_sent.saturating_add(1);
                    return;
                }
                Err(e) => self.socket_failed(id, "write", &e),
            }
        }
        self.enqueue(notification);
    }

    fn enqueue(&mut self, notification: Notification) {
        if self.outbox.push_back(notification).is_err() {
            self.stats.notifications_dropped = self.stats.notifications_dropped.saturating_add(1);
            log::warn!("Outbox full, dropped \"{}\"", notification);
        }
    }

    fn flush_outbox(&mut self, id: SocketId) {
        while let Some(notification) = self.outbox.pop_front() {
            if let Err(e) = self.transport.write_socket(id, notification.as_bytes()) {
                self.socket_failed(id, "write", &e);
                let _ = self.outbox.push_front(notification);
                return;
            }
            self.stats.notifications_sent = self.stats.notifications_sent.saturating_add(1);
        }
    }

    fn drain_socket(&mut self) {
        let Some(id) = self.link.socket() else {
            return;
        };

        let available = match self.transport.query_socket(id) {
            Ok(n) => n,
            Err(e) => {
                self.socket_failed(id, "query", &e);
                return;
            }
        };
        if available == 0 {
            return;
        }

        let count = available.min(READ_BUFFER_LEN);
        if let Err(e) = self
            .transport
            .read_socket(id, &mut self.read_buffer[..count])
        {
            self.socket_failed(id, "read", &e);
            return;
        }

        self.line.absorb(&mut self.read_buffer);
        log::debug!("Received: {}", self.line.as_str());
    }

    fn dispatch_line(&mut self) -> Result<()> {
        let command = self.line.take_command();
        let dispatched = self.door.dispatch(command);
        if let Some(done) = self.absorb_actuator("Door command", dispatched)? {
            if done != Dispatched::Ignored {
                self.stats.commands_dispatched = self.stats.commands_dispatched.saturating_add(1);
            }
        }
        Ok(())
    }

    /// Logs and counts driver failures; range errors still propagate.
    fn absorb_actuator<T>(&mut self, what: &str, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(Error::Actuator(driver)) => {
                self.stats.actuator_failures = self.stats.actuator_failures.saturating_add(1);
                log::error!("{} failed: {} fault", what, driver);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn socket_failed(&mut self, id: SocketId, op: &str, err: &W::Error) {
        log::warn!("Socket {} {} failed: {:?}", id.0, op, err);
        self.link.socket_closed();
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Diagnostic counters.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Copy of the connection flags.
    pub fn connection(&self) -> ConnectionSnapshot {
        self.link.snapshot()
    }

    /// Notifications waiting for a socket.
    pub fn pending_notifications(&self) -> impl Iterator<Item = &Notification> {
        self.outbox.iter()
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The door and its actuators.
    pub fn door(&self) -> &Door<B::Servo, B::Buzzer, B::Led> {
        &self.door
    }

    /// The transport.
    pub fn transport(&self) -> &W {
        &self.transport
    }

    /// Mutable access to the transport.
    pub fn transport_mut(&mut self) -> &mut W {
        &mut self.transport
    }

    /// Mutable access to the touch sensor.
    pub fn touch_mut(&mut self) -> &mut B::Touch {
        &mut self.touch
    }

    /// Mutable access to the light sensor.
    pub fn light_mut(&mut self) -> &mut B::Light {
        &mut self.light
    }

    /// The LCD.
    pub fn display(&self) -> &B::Display {
        &self.display
    }

    /// Mutable access to the clock.
    pub fn clock_mut(&mut self) -> &mut B::Clock {
        &mut self.clock
    }

    /// The delay provider.
    pub fn delay(&self) -> &B::Delay {
        &self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockBoard, MockTransport};

    #[test]
    fn counters_saturate_instead_of_overflowing() {
        let link = ConnectionState::new();
        let mut transport = MockTransport::new();
        transport.join();
        let mut session =
            Session::new(transport, &link, MockBoard::peripherals(), Config::default()).unwrap();
        session.wait_for_join();
        session.stats.notifications_sent = u32::MAX;
        session.stats.iterations = u64::MAX;

        session.touch.press();
        session.step().unwrap();
        session.step().unwrap();

        assert_eq!(session.stats.notifications_sent, u32::MAX);
        assert_eq!(session.stats.iterations, u64::MAX);
        assert_eq!(session.transport.writes.len(), 2);
    }
}
