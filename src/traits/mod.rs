//! Trait definitions for hardware and network abstraction.
//!
//! This module defines the seams that let the garage controller:
//! - Run on different hardware (ESP32, desktop mock)
//! - Talk to the remote peer through different WiFi transports
//!
//! # Submodules
//!
//! - `hardware`: Touch, light, servo, buzzer, LED, LCD and clock
//! - `network`: The WiFi companion chip socket transport
//!
//! # Hardware Abstraction
//!
//! The session loop is generic over:
//!
//! - [`TouchSensor`] and [`LightSensor`]: inputs polled every iteration
//! - [`ServoMotor`], [`Buzzer`], [`StatusLed`]: the door actuators
//! - [`CharacterDisplay`] and [`Clock`]: the time readout
//! - [`WifiTransport`]: sockets plus the indication stream

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
