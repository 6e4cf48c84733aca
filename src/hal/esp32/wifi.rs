//! Station-mode WiFi transport for ESP32-C3.
//!
//! The on-chip radio plays the part of the companion chip: `turn_on`
//! associates with the access point, waits for DHCP and starts SNTP.
//! Sockets are plain `std::net` TCP streams in non-blocking mode, opened
//! with a bounded connect so an unreachable peer cannot stall the loop.
//!
//! Every poll samples the station link. If it drops after the first join,
//! the transport re-associates every `rejoin_interval_ms` until it is back.
//!
//! Indications are synthesized from what the station sees and buffered
//! until the session polls them:
//!
//! | Condition | Indication |
//! |-----------|------------|
//! | radio started | `WiFiHardwareStarted` |
//! | associated | `WiFiAssociationSuccessful` |
//! | DHCP lease | `DhcpReply` |
//! | first SNTP sync | `NtpServerDelivery` |
//! | peer hung up | `SocketClosed` |
//! | station dropped | `WiFiDisassociation` |
//! | station back | `WiFiAssociationSuccessful`, `DhcpReply` |
//!
//! # Example
//!
//! ```ignore
//! use garage_link::hal::esp32::Esp32Transport;
//! use garage_link::config::WifiConfig;
//!
//! let config = WifiConfig::default()
//!     .with_ssid("MyNetwork")
//!     .with_password("secret123");
//!
//! let transport = Esp32Transport::new(modem, sysloop, Some(nvs), &config)?;
//! ```

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::WifiConfig;
use crate::connection::SocketId;
use crate::indication::{ErrorEvent, Indication, IndicationEvent, TransportEvent};
use crate::reconnect::{StationAction, StationWatch};
use crate::traits::{Protocol, Security, WifiTransport};
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::{EspSntp, SyncStatus};
use esp_idf_svc::wifi::{BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use thiserror::Error;

/// Errors from the ESP32 transport.
#[derive(Debug, Error)]
pub enum Esp32TransportError {
    /// ESP-IDF call failed.
    #[error("esp-idf: {0}")]
    Esp(#[from] esp_idf_hal::sys::EspError),
    /// Socket I/O failed.
    #[error("socket: {0}")]
    Io(#[from] std::io::Error),
    /// No open socket with this id.
    #[error("no socket {0}")]
    UnknownSocket(u16),
    /// Only plain TCP is supported.
    #[error("unsupported socket kind {0:?}/{1:?}")]
    Unsupported(Protocol, Security),
}

type Result<T> = core::result::Result<T, Esp32TransportError>;

/// WiFi station transport for ESP32.
pub struct Esp32Transport<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
    sntp: Option<EspSntp<'static>>,
    sntp_reported: bool,
    sockets: Vec<Option<TcpStream>>,
    events: VecDeque<TransportEvent>,
    connect_timeout: Duration,
    station: StationWatch,
    epoch: Instant,
}

impl<'a> Esp32Transport<'a> {
    /// Creates the WiFi driver and applies the station credentials.
    ///
    /// The radio stays off until [`WifiTransport::turn_on`].
    ///
    /// # Errors
    ///
    /// Returns an error if WiFi initialization fails.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let mut ssid: heapless::String<32> = heapless::String::new();
        let _ = ssid.push_str(config.ssid.as_str());

        let mut password: heapless::String<64> = heapless::String::new();
        let _ = password.push_str(config.password.as_str());

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid,
            password,
            ..Default::default()
        }))?;

        Ok(Self {
            wifi,
            sntp: None,
            sntp_reported: false,
            sockets: Vec::new(),
            events: VecDeque::new(),
            connect_timeout: Duration::from_millis(u64::from(config.connect_timeout_ms.max(1))),
            station: StationWatch::new(u64::from(config.rejoin_interval_ms)),
            epoch: Instant::now(),
        })
    }

    fn indicate(&mut self, kind: Indication, message: impl Into<String>) {
        self.events
            .push_back(IndicationEvent::new(kind, message).into());
    }

    fn stream(&mut self, id: SocketId) -> Result<&mut TcpStream> {
        self.sockets
            .get_mut(usize::from(id.0))
            .and_then(Option::as_mut)
            .ok_or(Esp32TransportError::UnknownSocket(id.0))
    }

    fn drop_socket(&mut self, id: SocketId) {
        if let Some(slot) = self.sockets.get_mut(usize::from(id.0)) {
            if slot.take().is_some() {
                self.indicate(Indication::SocketClosed, format!("{}", id.0));
            }
        }
    }

    fn connect(&mut self) -> Result<()> {
        self.wifi.start()?;
        self.indicate(Indication::WiFiHardwareStarted, "");

        self.wifi.connect()?;
        self.indicate(Indication::WiFiAssociationSuccessful, "");

        self.wifi.wait_netif_up()?;
        self.report_lease()?;
        self.station.joined();

        self.sntp = Some(EspSntp::new_default()?);
        Ok(())
    }

    fn report_lease(&mut self) -> Result<()> {
        let ip = self.wifi.wifi().sta_netif().get_ip_info()?.ip;
        self.indicate(Indication::DhcpReply, format!("{}", ip));
        Ok(())
    }

    fn watch_station(&mut self) {
        let up = self.wifi.is_up().unwrap_or(false);
        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        match self.station.observe(up, now_ms) {
            StationAction::Steady => {}
            StationAction::Lost => {
                log::warn!("WiFi station dropped, re-associating");
                self.indicate(Indication::WiFiDisassociation, "");
                self.rejoin();
            }
            StationAction::Rejoin => self.rejoin(),
            StationAction::Regained => {
                log::info!("WiFi station back");
                self.indicate(Indication::WiFiAssociationSuccessful, "");
                if let Err(e) = self.report_lease() {
                    log::warn!("WiFi lease lookup failed: {}", e);
                }
            }
        }
    }

    fn rejoin(&mut self) {
        // Non-blocking; the driver reports the outcome through `is_up`.
        if let Err(e) = self.wifi.wifi_mut().connect() {
            log::warn!("WiFi re-association failed: {}", e);
        }
    }
}

impl WifiTransport for Esp32Transport<'_> {
    type Error = Esp32TransportError;

    fn turn_on(&mut self) -> Result<()> {
        if let Err(e) = self.connect() {
            self.events
                .push_back(ErrorEvent::new(Indication::WiFiJoinFailed.code(), format!("{}", e)).into());
            return Err(e);
        }
        Ok(())
    }

    fn open_socket(
        &mut self,
        host: &str,
        port: u16,
        protocol: Protocol,
        security: Security,
    ) -> Result<SocketId> {
        if protocol != Protocol::Tcp || security != Security::None {
            return Err(Esp32TransportError::Unsupported(protocol, security));
        }

        let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(ErrorKind::NotFound, "peer address did not resolve")
        })?;
        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        let index = match self.sockets.iter().position(Option::is_none) {
            Some(free) => {
                self.sockets[free] = Some(stream);
                free
            }
            None => {
                self.sockets.push(Some(stream));
                self.sockets.len() - 1
            }
        };
        let id = u16::try_from(index).map_err(|_| {
            std::io::Error::new(ErrorKind::OutOfMemory, "socket table full")
        })?;
        Ok(SocketId(id))
    }

    fn write_socket(&mut self, id: SocketId, data: &[u8]) -> Result<()> {
        let stream = self.stream(id)?;
        // Non-blocking streams can report WouldBlock mid-write; retry until done.
        let mut rest = data;
        while !rest.is_empty() {
            match stream.write(rest) {
                Ok(0) => {
                    self.drop_socket(id);
                    return Err(std::io::Error::from(ErrorKind::WriteZero).into());
                }
                Ok(n) => rest = &rest[n..],
                Err(e) if e.kind() == ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(e) => {
                    self.drop_socket(id);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    fn query_socket(&mut self, id: SocketId) -> Result<usize> {
        let mut probe = [0u8; crate::command::READ_BUFFER_LEN];
        match self.stream(id)?.peek(&mut probe) {
            Ok(0) => {
                self.drop_socket(id);
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                self.drop_socket(id);
                Err(e.into())
            }
        }
    }

    fn read_socket(&mut self, id: SocketId, buffer: &mut [u8]) -> Result<usize> {
        match self.stream(id)?.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                self.drop_socket(id);
                Err(e.into())
            }
        }
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        if self.events.is_empty() {
            self.watch_station();
        }
        if !self.sntp_reported {
            let synced = self
                .sntp
                .as_ref()
                .is_some_and(|sntp| sntp.get_sync_status() == SyncStatus::Completed);
            if synced {
                self.sntp_reported = true;
                self.indicate(Indication::NtpServerDelivery, "pool.ntp.org");
            }
        }
        self.events.pop_front()
    }
}
