//! Network abstraction for the WiFi companion chip.
//!
//! The chip does the radio, association, DHCP and TCP work itself; the
//! controller only sees numbered sockets and a stream of asynchronous
//! events.
//!
//! # Event delivery
//!
//! Chips report indications whenever they happen. Implementations buffer
//! them and hand them out through [`WifiTransport::poll_event`], which the
//! session calls from its own loop. That makes the loop the only context
//! applying events to the connection state.
//!
//! # Socket protocol
//!
//! ```text
//! open_socket(host, port, Tcp, None) -> id
//! query_socket(id)                   -> bytes pending
//! read_socket(id, buf)               -> bytes read
//! write_socket(id, bytes)
//! ```

use core::fmt;

use crate::connection::SocketId;
use crate::indication::TransportEvent;

/// Socket transport protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Protocol {
    /// Stream socket.
    #[default]
    Tcp,
    /// Datagram socket.
    Udp,
}

/// Socket security layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Security {
    /// Plain text.
    #[default]
    None,
    /// TLS.
    Tls,
}

/// WiFi companion chip driver.
///
/// All calls are blocking request/response exchanges with the chip.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use garage_link::traits::{WifiTransport, Protocol, Security};
/// use garage_link::connection::SocketId;
/// use garage_link::indication::TransportEvent;
///
/// struct MyChip { /* uart handle, event queue */ }
///
/// impl WifiTransport for MyChip {
///     type Error = ();
///
///     fn turn_on(&mut self) -> Result<(), ()> { Ok(()) }
///     fn open_socket(&mut self, host: &str, port: u16, _: Protocol, _: Security)
///         -> Result<SocketId, ()> { Ok(SocketId(0)) }
///     fn write_socket(&mut self, _: SocketId, _: &[u8]) -> Result<(), ()> { Ok(()) }
///     fn query_socket(&mut self, _: SocketId) -> Result<usize, ()> { Ok(0) }
///     fn read_socket(&mut self, _: SocketId, _: &mut [u8]) -> Result<usize, ()> { Ok(0) }
///     fn poll_event(&mut self) -> Option<TransportEvent> { None }
/// }
/// ```
pub trait WifiTransport {
    /// Error type for transport operations.
    type Error: fmt::Debug;

    /// Powers up the chip. Indications start flowing afterwards.
    fn turn_on(&mut self) -> Result<(), Self::Error>;

    /// Opens a socket to `host:port` and returns its id.
    fn open_socket(
        &mut self,
        host: &str,
        port: u16,
        protocol: Protocol,
        security: Security,
    ) -> Result<SocketId, Self::Error>;

    /// Writes `data` to an open socket.
    fn write_socket(&mut self, id: SocketId, data: &[u8]) -> Result<(), Self::Error>;

    /// Number of received bytes waiting on the socket.
    fn query_socket(&mut self, id: SocketId) -> Result<usize, Self::Error>;

    /// Reads up to `buffer.len()` pending bytes into `buffer`.
    ///
    /// Returns the number of bytes written to the front of `buffer`.
    fn read_socket(&mut self, id: SocketId, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    /// Next buffered indication or error event, if any. Never blocks.
    fn poll_event(&mut self) -> Option<TransportEvent>;
}
