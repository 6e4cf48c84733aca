//! ESP32-C3 SuperMini garage door controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It brings up the board, joins WiFi, then runs the command session:
//! - Polls the touch pad and light sensor
//! - Keeps a TCP socket open to the peer and reopens it when it drops
//! - Drives the door servo, buzzer and LED on `open` / `close`
//! - Logs the time of day as the LCD readout
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=... WIFI_PASSWORD=... GARAGE_HOST=192.168.1.152 GARAGE_PORT=80 \
//!     cargo build --release --features wifi --bin esp32_main
//! ```

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use garage_link::hal::esp32::{
    Esp32Board, Esp32Buzzer, Esp32Clock, Esp32Led, Esp32Light, Esp32Servo, Esp32Touch,
    Esp32Transport,
};
use garage_link::hal::ConsoleDisplay;
use garage_link::{Config, ConnectionState, Peripherals as BoardPeripherals, ServerConfig, Session};

/// Connection flags shared with the transport's event stream.
static LINK: ConnectionState = ConnectionState::new();

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    log::info!("================================");
    log::info!("  garage-link SuperMini");
    log::info!("================================");

    // =========================================================================
    // Configuration
    // =========================================================================
    let port = match option_env!("GARAGE_PORT") {
        Some(p) => p
            .parse()
            .map_err(|e| anyhow::anyhow!("GARAGE_PORT {:?}: {}", p, e))?,
        None => ServerConfig::default().port,
    };
    let config = Config::default()
        .with_wifi(
            garage_link::WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_server(
            ServerConfig::default()
                .with_host(option_env!("GARAGE_HOST").unwrap_or("192.168.1.152"))
                .with_port(port),
        );

    if !config.wifi.is_configured() {
        anyhow::bail!("WiFi not configured (set WIFI_SSID/WIFI_PASSWORD)");
    }

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Board
    // =========================================================================
    let servo = Esp32Servo::new(
        peripherals.pins.gpio2,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        config.servo,
    )?;
    log::info!("[OK] Servo initialized (GPIO2 PWM)");

    let board = BoardPeripherals::<Esp32Board> {
        touch: Esp32Touch::new(peripherals.pins.gpio6)?,
        light: Esp32Light::new(peripherals.adc1, peripherals.pins.gpio4)?,
        servo,
        buzzer: Esp32Buzzer::new(peripherals.pins.gpio3)?,
        led: Esp32Led::new(peripherals.pins.gpio7)?,
        display: ConsoleDisplay::new(),
        clock: Esp32Clock::new(),
        delay: FreeRtos,
    };
    log::info!("[OK] Sensors and outputs initialized (GPIO3/4/6/7)");

    // =========================================================================
    // WiFi
    // =========================================================================
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let transport = Esp32Transport::new(peripherals.modem, sysloop, Some(nvs), &config.wifi)?;
    log::info!("[OK] WiFi configured for '{}'", config.wifi.ssid);

    // =========================================================================
    // Session
    // =========================================================================
    let mut session = Session::new(transport, &LINK, board, config)
        .map_err(|e| anyhow::anyhow!("Session setup failed: {}", e))?;
    session
        .run()
        .map_err(|e| anyhow::anyhow!("Session stopped: {}", e))?;

    log::warn!("Network left, session ended");
    Ok(())
}
