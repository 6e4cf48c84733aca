//! # garage-link
//!
//! A garage door controller: a touch pad to request entry, a light sensor
//! to detect a parked car, a servo-driven door, and a TCP command session
//! to a remote peer over a WiFi companion chip.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for the sensors, servo, buzzer, LED, LCD and clock
//! - **Connection tracking**: Join and socket flags driven by chip indications
//! - **Command session**: `open` / `close` commands from the peer, notifications back
//! - **Automatic reconnect**: Closed sockets are reopened with capped backoff
//! - **Indication classifier**: Names for all 82 chip indication kinds
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `indication` - Chip indication vocabulary and classifier
//! - `connection` - Network-joined and socket-open flags
//! - `command` - Inbound command parsing and line reassembly
//! - `door` - Servo, buzzer and LED driven together
//! - `session` - The main loop that ties everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use garage_link::{Config, ConnectionState, Notification, Session};
//! use garage_link::hal::{MockBoard, MockTransport};
//!
//! let link = ConnectionState::new();
//! let mut transport = MockTransport::new();
//! transport.join();
//!
//! let mut peripherals = MockBoard::peripherals();
//! peripherals.touch.queue(&[true]);
//!
//! let mut session = Session::new(transport, &link, peripherals, Config::default()).unwrap();
//! session.start().unwrap();
//! session.wait_for_join();
//! session.tick().unwrap();
//!
//! assert_eq!(
//!     session.transport().written_text(),
//!     vec![Notification::OpenRequested.as_str()]
//! );
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Inbound command parsing and line reassembly.
pub mod command;
/// Network-joined and socket-open flags driven by chip indications.
pub mod connection;
/// Door actuation with servo, buzzer and LED.
pub mod door;
/// Crate-wide error type.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Indication vocabulary and classifier.
pub mod indication;
/// Messages sent to the remote peer.
pub mod notification;
/// Socket reopen pacing.
pub mod reconnect;
/// Servo angle validation and PWM calibration.
pub mod servo;
/// The command session loop.
pub mod session;
/// Core traits for hardware and network abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

// Re-exports for convenience
pub use command::{Command, LineBuffer};
pub use connection::{ConnectionSnapshot, ConnectionState, LinkChange, SocketId};
pub use door::{Dispatched, Door, DoorState};
pub use error::{Error, Result};
pub use indication::{classify, ErrorEvent, Indication, IndicationEvent, TransportEvent};
pub use notification::Notification;
pub use reconnect::{Backoff, StationAction, StationWatch};
pub use servo::ServoCalibration;
pub use session::{Board, Peripherals, Phase, Session, SessionStats};
pub use traits::{
    // Hardware
    Buzzer,
    CharacterDisplay,
    Clock,
    LightSensor,
    ServoMotor,
    StatusLed,
    TimeOfDay,
    TouchSensor,
    // Network
    Protocol,
    Security,
    WifiTransport,
};

// Config re-exports
pub use config::{
    Config, DisplayConfig, DoorConfig, ReconnectConfig, SensorConfig, ServerConfig, TimingConfig,
    TouchMode, WifiConfig,
};
