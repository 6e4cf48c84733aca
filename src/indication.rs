//! Indication vocabulary of the WiFi companion chip and its classifier.
//!
//! The companion chip pushes asynchronous indications describing boot,
//! radio, association, socket, power, WPS, MQTT, WebSocket and file
//! transfer status. Each carries a numeric code and a free-form message.
//!
//! The vocabulary is declared once as data in the `indications!` table; the enum,
//! the code table and the name lookup are all generated from that list so
//! they cannot drift apart.
//!
//! # Example
//!
//! ```rust
//! use garage_link::indication::{classify, Indication, OTHER};
//!
//! assert_eq!(classify(Indication::SocketClosed.code()), "SocketClosed");
//! assert_eq!(Indication::from_code(Indication::NtpServerDelivery.code()),
//!            Some(Indication::NtpServerDelivery));
//! assert_eq!(classify(9999), OTHER);
//! ```

extern crate alloc;
use alloc::string::String;

/// Name reported for codes outside the vocabulary.
pub const OTHER: &str = "Other";

macro_rules! indications {
    ($($name:ident = $code:literal,)+) => {
        /// A kind of indication pushed by the WiFi companion chip.
        ///
        /// Codes number the vocabulary densely in table order, so the code
        /// doubles as the index into [`Indication::ALL`].
        #[allow(missing_docs)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u16)]
        pub enum Indication {
            $($name = $code,)+
        }

        impl Indication {
            /// Number of indication kinds in the vocabulary.
            pub const COUNT: usize = [$(stringify!($name),)+].len();

            /// Every indication kind, indexed by code.
            pub const ALL: [Indication; Self::COUNT] = [$(Indication::$name,)+];

            const NAMES: [&'static str; Self::COUNT] = [$(stringify!($name),)+];
        }
    };
}

indications! {
    ConsoleActive = 0,
    PowerOn = 1,
    Reset = 2,
    WatchdogRunning = 3,
    LowMemory = 4,
    WiFiHardwareFailure = 5,
    ConfigurationFailure = 6,
    HardFault = 7,
    StackOverflow = 8,
    MallocFailed = 9,
    RadioStartup = 10,
    WiFiPSMode = 11,
    Copyright = 12,
    WiFiBssRegained = 13,
    WiFiSignalLow = 14,
    WiFiSignalOk = 15,
    BootMessages = 16,
    KeytypeNotImplemented = 17,
    WiFiJoin = 18,
    WiFiJoinFailed = 19,
    WiFiScanning = 20,
    ScanBlewUp = 21,
    ScanFailed = 22,
    WiFiUp = 23,
    WiFiAssociationSuccessful = 24,
    StartedAP = 25,
    APStartFailed = 26,
    StationAssociated = 27,
    DhcpReply = 28,
    WiFiBssLost = 29,
    WiFiException = 30,
    WiFiHardwareStarted = 31,
    WiFiNetwork = 32,
    WiFiUnhandledEvent = 33,
    WiFiScan = 34,
    WiFiUnhandledIndication = 35,
    WiFiPoweredDown = 36,
    HWInMiniAPMode = 37,
    WiFiDeauthentication = 38,
    WiFiDisassociation = 39,
    WiFiUnhandledManagement = 40,
    WiFiUnhandledData = 41,
    WiFiUnknownFrame = 42,
    Dot11Illegal = 43,
    WpaCrunchingPsk = 44,
    WpaTerminated = 45,
    WpaStartFailed = 46,
    WpaHandshakeComplete = 47,
    GpioInterrupt = 48,
    Wakeup = 49,
    PendingData = 50,
    InputToRemote = 51,
    OutputFromRemote = 52,
    SocketClosed = 53,
    IncomingSocketClient = 54,
    SocketClientGone = 55,
    SocketDroppingData = 56,
    RemoteConfiguration = 57,
    FactoryReset = 58,
    LowPowerMode = 59,
    GoingIntoStandby = 60,
    ResumingFromStandby = 61,
    GoingIntoDeepSleep = 62,
    ResumingFromDeepSleep = 63,
    StationDisassociated = 64,
    SystemConfigurationUpdated = 65,
    RejectedFoundNetwork = 66,
    RejectedAssociation = 67,
    WiFiAuthenticationTimedOut = 68,
    WiFiAssociationTimedOut = 69,
    MicFailure = 70,
    UdpBroadcast = 71,
    WpsGeneratedDhKeyset = 72,
    WpsEnrollmentAttemptTimedOut = 73,
    SockdDroppingClient = 74,
    NtpServerDelivery = 75,
    DhcpFailedToGetLease = 76,
    MqttPublished = 77,
    MqttClosed = 78,
    WebSocketData = 79,
    WebSocketClosed = 80,
    FileReceived = 81,
}

impl Indication {
    /// Returns the numeric code of this indication.
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the symbolic name of this indication.
    #[inline]
    pub const fn name(self) -> &'static str {
        Self::NAMES[self as usize]
    }

    /// Looks up the indication for a raw code.
    ///
    /// Returns `None` for codes outside the vocabulary, including codes a
    /// newer chip firmware may add.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }
}

/// Maps a raw indication code to its symbolic name.
///
/// Total over `u16`: unknown codes map to [`OTHER`].
pub fn classify(code: u16) -> &'static str {
    Indication::from_code(code).map_or(OTHER, Indication::name)
}

/// An indication delivered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndicationEvent {
    /// Raw indication code.
    pub code: u16,
    /// Message text accompanying the indication.
    pub message: String,
}

impl IndicationEvent {
    /// Creates an event for a known indication kind.
    pub fn new(kind: Indication, message: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            message: message.into(),
        }
    }

    /// Creates an event from a raw code, known or not.
    pub fn from_raw(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The indication kind, if the code is in the vocabulary.
    pub fn kind(&self) -> Option<Indication> {
        Indication::from_code(self.code)
    }

    /// Symbolic name of the code, [`OTHER`] if unknown.
    pub fn name(&self) -> &'static str {
        classify(self.code)
    }
}

/// An error reported asynchronously by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEvent {
    /// Raw error code.
    pub code: u16,
    /// Message text accompanying the error.
    pub message: String,
}

impl ErrorEvent {
    /// Creates an error event.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Anything the transport pushes outside of a request/response exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Status indication.
    Indication(IndicationEvent),
    /// Asynchronous error report.
    Error(ErrorEvent),
}

impl From<IndicationEvent> for TransportEvent {
    fn from(event: IndicationEvent) -> Self {
        TransportEvent::Indication(event)
    }
}

impl From<ErrorEvent> for TransportEvent {
    fn from(event: ErrorEvent) -> Self {
        TransportEvent::Error(event)
    }
}
