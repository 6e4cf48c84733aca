//! Controller configuration for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`. Everything is fixed at startup;
//! there is no runtime configuration surface.
//!
//! # Example
//!
//! ```rust
//! use garage_link::config::{Config, ServerConfig, SensorConfig, TouchMode};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.server.host.as_str(), "192.168.1.152");
//! assert_eq!(config.server.port, 80);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_server(ServerConfig::default().with_host("10.0.0.5").with_port(9000))
//!     .with_sensors(SensorConfig::default().with_touch_mode(TouchMode::Edge));
//! ```

use heapless::String as HString;

use crate::servo::ServoCalibration;

/// Maximum length for short config strings (hostnames, SSIDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for LCD text (one 16 column row)
pub const MAX_LCD_TEXT: usize = 16;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for LCD text
pub type LcdString = HString<MAX_LCD_TEXT>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Copies as much of `s` as fits into a heapless string, cutting on a
/// character boundary.
pub fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    for c in s.chars() {
        if hs.push(c).is_err() {
            break;
        }
    }
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete controller configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Remote peer the command socket connects to
    pub server: ServerConfig,
    /// Door actuator configuration
    pub door: DoorConfig,
    /// Servo pulse calibration
    pub servo: ServoCalibration,
    /// Sensor thresholds and modes
    pub sensors: SensorConfig,
    /// Loop and wait intervals
    pub timing: TimingConfig,
    /// Socket reopen policy
    pub reconnect: ReconnectConfig,
    /// LCD layout
    pub display: DisplayConfig,
    /// Station WiFi credentials (ESP32 binding only)
    pub wifi: WifiConfig,
}

impl Config {
    /// Set server configuration
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// Set door configuration
    pub fn with_door(mut self, door: DoorConfig) -> Self {
        self.door = door;
        self
    }

    /// Set servo calibration
    pub fn with_servo(mut self, servo: ServoCalibration) -> Self {
        self.servo = servo;
        self
    }

    /// Set sensor configuration
    pub fn with_sensors(mut self, sensors: SensorConfig) -> Self {
        self.sensors = sensors;
        self
    }

    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set reconnect configuration
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Set display configuration
    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }
}

// ============================================================================
// Server Config
// ============================================================================

/// Remote peer address
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Peer hostname or IP
    pub host: ShortString,
    /// Peer TCP port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: short_string("192.168.1.152"),
            port: 80,
        }
    }
}

impl ServerConfig {
    /// Set the peer host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = short_string(host);
        self
    }

    /// Set the peer port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// ============================================================================
// Door Config
// ============================================================================

/// Door actuator configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorConfig {
    /// Servo angle for a fully open door (degrees)
    pub open_angle: f32,
    /// Servo angle for a fully closed door (degrees)
    pub closed_angle: f32,
    /// Whether `close` also clears the door-open flag
    pub close_clears_open_flag: bool,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            open_angle: 0.0,
            closed_angle: 180.0,
            close_clears_open_flag: false,
        }
    }
}

impl DoorConfig {
    /// Set the open angle
    pub fn with_open_angle(mut self, degrees: f32) -> Self {
        self.open_angle = degrees;
        self
    }

    /// Set the closed angle
    pub fn with_closed_angle(mut self, degrees: f32) -> Self {
        self.closed_angle = degrees;
        self
    }

    /// Set whether `close` clears the door-open flag
    pub fn with_close_clears_open_flag(mut self, clears: bool) -> Self {
        self.close_clears_open_flag = clears;
        self
    }
}

// ============================================================================
// Sensor Config
// ============================================================================

/// How touch readings turn into notifications
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TouchMode {
    /// Notify on every iteration the pad reads touched
    #[default]
    Level,
    /// Notify once per press
    Edge,
}

/// Sensor configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Light level (0-100) above which a car is considered present
    pub light_threshold: f32,
    /// Touch notification mode
    pub touch_mode: TouchMode,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            light_threshold: 60.0,
            touch_mode: TouchMode::Level,
        }
    }
}

impl SensorConfig {
    /// Set the light threshold
    pub fn with_light_threshold(mut self, threshold: f32) -> Self {
        self.light_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Set the touch mode
    pub fn with_touch_mode(mut self, mode: TouchMode) -> Self {
        self.touch_mode = mode;
        self
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Loop and wait intervals
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Sleep at the end of each session iteration in milliseconds
    pub loop_interval_ms: u32,
    /// Poll interval while waiting for the network to join
    pub join_poll_ms: u32,
    /// Poll interval while waiting for the light sensor to clear
    pub clear_poll_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 100,
            join_poll_ms: 200,
            clear_poll_ms: 50,
        }
    }
}

impl TimingConfig {
    /// Set the loop interval
    pub fn with_loop_interval_ms(mut self, ms: u32) -> Self {
        self.loop_interval_ms = ms;
        self
    }

    /// Set the join poll interval
    pub fn with_join_poll_ms(mut self, ms: u32) -> Self {
        self.join_poll_ms = ms;
        self
    }

    /// Set the light-clear poll interval
    pub fn with_clear_poll_ms(mut self, ms: u32) -> Self {
        self.clear_poll_ms = ms;
        self
    }
}

// ============================================================================
// Reconnect Config
// ============================================================================

/// Socket reopen policy
///
/// After a failed open the session skips iterations before retrying,
/// doubling the gap each time up to `max_backoff_iterations`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconnectConfig {
    /// Upper bound on iterations skipped between attempts (0 = retry every iteration)
    pub max_backoff_iterations: u32,
    /// Consecutive failures after which an error is logged
    pub failure_report_threshold: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_backoff_iterations: 64,
            failure_report_threshold: 10,
        }
    }
}

impl ReconnectConfig {
    /// Set the backoff cap
    pub fn with_max_backoff_iterations(mut self, iterations: u32) -> Self {
        self.max_backoff_iterations = iterations;
        self
    }

    /// Set the failure report threshold
    pub fn with_failure_report_threshold(mut self, failures: u32) -> Self {
        self.failure_report_threshold = failures;
        self
    }
}

// ============================================================================
// Display Config
// ============================================================================

/// LCD layout
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// Static text written once at startup
    pub banner: LcdString,
    /// Column of the clock readout
    pub clock_col: u8,
    /// Row of the clock readout
    pub clock_row: u8,
    /// Backlight color (r, g, b)
    pub backlight: (u8, u8, u8),
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            banner: truncated("Time:"),
            clock_col: 7,
            clock_row: 1,
            backlight: (100, 100, 100),
        }
    }
}

impl DisplayConfig {
    /// Set the banner text
    pub fn with_banner(mut self, banner: &str) -> Self {
        self.banner = truncated(banner);
        self
    }

    /// Set the clock position
    pub fn with_clock_position(mut self, col: u8, row: u8) -> Self {
        self.clock_col = col;
        self.clock_row = row;
        self
    }

    /// Set the backlight color
    pub fn with_backlight(mut self, r: u8, g: u8, b: u8) -> Self {
        self.backlight = (r, g, b);
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// Station WiFi credentials and link timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Upper bound on a socket connect, in milliseconds
    pub connect_timeout_ms: u32,
    /// Minimum gap between re-association attempts after the station drops
    pub rejoin_interval_ms: u32,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 2000,
            rejoin_interval_ms: 5000,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the socket connect timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms.max(1);
        self
    }

    /// Set the re-association interval
    pub fn with_rejoin_interval_ms(mut self, ms: u32) -> Self {
        self.rejoin_interval_ms = ms;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let config = Config::default();
        assert_eq!(config.server.host.as_str(), "192.168.1.152");
        assert_eq!(config.server.port, 80);
        assert_eq!(config.door.open_angle, 0.0);
        assert_eq!(config.door.closed_angle, 180.0);
        assert!(!config.door.close_clears_open_flag);
        assert_eq!(config.sensors.light_threshold, 60.0);
        assert_eq!(config.sensors.touch_mode, TouchMode::Level);
        assert_eq!(config.timing.loop_interval_ms, 100);
        assert_eq!(config.timing.join_poll_ms, 200);
        assert_eq!(config.timing.clear_poll_ms, 50);
        assert_eq!(config.display.banner.as_str(), "Time:");
        assert_eq!((config.display.clock_col, config.display.clock_row), (7, 1));
        assert_eq!(config.display.backlight, (100, 100, 100));
        assert!(!config.wifi.is_configured());
        assert_eq!(config.wifi.connect_timeout_ms, 2000);
        assert_eq!(config.wifi.rejoin_interval_ms, 5000);
    }

    #[test]
    fn connect_timeout_is_never_zero() {
        let wifi = WifiConfig::default().with_connect_timeout_ms(0);
        assert_eq!(wifi.connect_timeout_ms, 1);
    }

    #[test]
    fn builders_chain() {
        let config = Config::default()
            .with_server(ServerConfig::default().with_host("garage.local").with_port(8000))
            .with_door(DoorConfig::default().with_open_angle(10.0).with_closed_angle(170.0))
            .with_reconnect(ReconnectConfig::default().with_max_backoff_iterations(0));

        assert_eq!(config.server.host.as_str(), "garage.local");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.door.open_angle, 10.0);
        assert_eq!(config.door.closed_angle, 170.0);
        assert_eq!(config.reconnect.max_backoff_iterations, 0);
    }

    #[test]
    fn light_threshold_is_clamped() {
        assert_eq!(
            SensorConfig::default().with_light_threshold(150.0).light_threshold,
            100.0
        );
        assert_eq!(
            SensorConfig::default().with_light_threshold(-5.0).light_threshold,
            0.0
        );
    }

    #[test]
    fn strings_truncate_on_char_boundary() {
        let long = "x".repeat(MAX_SHORT_STRING + 10);
        assert_eq!(short_string(&long).len(), MAX_SHORT_STRING);

        let banner = DisplayConfig::default().with_banner("ééééééééé");
        assert_eq!(banner.banner.as_str(), "éééééééé");
    }
}
