//! Connectivity state machine driven by transport indications.
//!
//! Two independent machines live here:
//!
//! ```text
//! Disconnected ──NtpServerDelivery──▶ Connected       (one way)
//! SocketClosed ──session opens──────▶ SocketOpen
//! SocketOpen   ──SocketClosed───────▶ SocketClosed
//! ```
//!
//! Network "up" is inferred from the time-sync indication rather than an
//! association event: once the chip has delivered NTP time, DHCP and
//! routing are known to work.
//!
//! # Sharing
//!
//! [`ConnectionState`] is shared between whatever context delivers
//! indications and the session loop. Every field is an atomic and is only
//! touched through the accessor methods, so the two contexts never race
//! on a raw field. The socket id and the open flag are packed into a
//! single atomic word, which makes "open with a stale id" unrepresentable.
//!
//! # Example
//!
//! ```rust
//! use garage_link::connection::{ConnectionState, LinkChange, SocketId};
//! use garage_link::indication::{Indication, IndicationEvent};
//!
//! let state = ConnectionState::new();
//! assert!(!state.is_joined());
//!
//! let ntp = IndicationEvent::new(Indication::NtpServerDelivery, "time synced");
//! assert_eq!(state.handle_indication(&ntp), LinkChange::Joined);
//! assert!(state.is_joined());
//!
//! state.socket_opened(SocketId(0));
//! let closed = IndicationEvent::new(Indication::SocketClosed, "0");
//! assert_eq!(state.handle_indication(&closed), LinkChange::SocketLost);
//! assert_eq!(state.socket(), None);
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::indication::{ErrorEvent, Indication, IndicationEvent, TransportEvent};

/// Identifier of an open socket, assigned by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SocketId(pub u16);

/// Packed encoding of "no socket open".
const NO_SOCKET: u32 = u32::MAX;

/// Shared connection flags.
///
/// `joined` flips to true exactly once. The socket slot holds either the
/// open socket's id or nothing.
#[derive(Debug)]
pub struct ConnectionState {
    joined: AtomicBool,
    socket: AtomicU32,
}

impl ConnectionState {
    /// Creates the initial state: not joined, no socket.
    pub const fn new() -> Self {
        Self {
            joined: AtomicBool::new(false),
            socket: AtomicU32::new(NO_SOCKET),
        }
    }

    /// Returns true once the network is fully up.
    #[inline]
    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::Acquire)
    }

    /// Returns the open socket, if any.
    #[inline]
    pub fn socket(&self) -> Option<SocketId> {
        match self.socket.load(Ordering::Acquire) {
            NO_SOCKET => None,
            raw => Some(SocketId(raw as u16)),
        }
    }

    /// Returns true while a socket is open.
    #[inline]
    pub fn is_socket_open(&self) -> bool {
        self.socket().is_some()
    }

    /// Marks the network as joined.
    ///
    /// Returns true only for the call that performed the transition; later
    /// calls are no-ops.
    pub fn mark_joined(&self) -> bool {
        self.joined
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Records a freshly opened socket.
    pub fn socket_opened(&self, id: SocketId) {
        self.socket.store(u32::from(id.0), Ordering::Release);
    }

    /// Clears the socket slot.
    ///
    /// Returns the socket that was open, if any.
    pub fn socket_closed(&self) -> Option<SocketId> {
        match self.socket.swap(NO_SOCKET, Ordering::AcqRel) {
            NO_SOCKET => None,
            raw => Some(SocketId(raw as u16)),
        }
    }

    /// Consistent copy of the current flags.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            joined: self.is_joined(),
            socket: self.socket(),
        }
    }

    /// Applies an indication to the state machine.
    ///
    /// Every indication is logged by name; only time-sync delivery and
    /// socket closure change state.
    pub fn handle_indication(&self, event: &IndicationEvent) -> LinkChange {
        let change = match event.kind() {
            Some(Indication::NtpServerDelivery) if self.mark_joined() => {
                log::info!("Connected");
                LinkChange::Joined
            }
            Some(Indication::SocketClosed) => {
                if let Some(id) = self.socket_closed() {
                    log::info!("Connection lost (socket {})", id.0);
                    LinkChange::SocketLost
                } else {
                    LinkChange::None
                }
            }
            _ => LinkChange::None,
        };

        if change == LinkChange::None {
            log::debug!("WIND: {} {}", event.name(), event.message);
        } else {
            log::info!("WIND: {} {}", event.name(), event.message);
        }
        change
    }

    /// Logs an asynchronous transport error. Never changes state.
    pub fn handle_error(&self, event: &ErrorEvent) -> LinkChange {
        log::warn!("ERROR: {} {}", event.code, event.message);
        LinkChange::None
    }

    /// Dispatches any transport event to the matching handler.
    pub fn handle_event(&self, event: &TransportEvent) -> LinkChange {
        match event {
            TransportEvent::Indication(ind) => self.handle_indication(ind),
            TransportEvent::Error(err) => self.handle_error(err),
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the connection flags for UI and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionSnapshot {
    /// Network fully up, including time sync.
    pub joined: bool,
    /// The open socket, if any.
    pub socket: Option<SocketId>,
}

impl ConnectionSnapshot {
    /// Returns true while a socket is open.
    pub fn socket_open(&self) -> bool {
        self.socket.is_some()
    }
}

/// State change caused by a transport event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkChange {
    /// Nothing changed.
    None,
    /// The network just came up.
    Joined,
    /// The open socket was closed by the peer or the chip.
    SocketLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ntp() -> IndicationEvent {
        IndicationEvent::new(Indication::NtpServerDelivery, "NTP server delivery")
    }

    fn closed() -> IndicationEvent {
        IndicationEvent::new(Indication::SocketClosed, "Socket Closed:0")
    }

    // =========================================================================
    // Join Tests
    // =========================================================================

    #[test]
    fn initial_state_is_disconnected() {
        let state = ConnectionState::new();
        assert_eq!(state.snapshot(), ConnectionSnapshot::default());
        assert!(!state.is_socket_open());
    }

    #[test]
    fn ntp_delivery_joins_and_leaves_socket_alone() {
        let state = ConnectionState::new();
        assert_eq!(state.handle_indication(&ntp()), LinkChange::Joined);
        assert!(state.is_joined());
        assert_eq!(state.socket(), None);
    }

    #[test]
    fn ntp_delivery_with_open_socket_keeps_socket() {
        let state = ConnectionState::new();
        state.socket_opened(SocketId(3));
        state.handle_indication(&ntp());
        assert_eq!(state.socket(), Some(SocketId(3)));
    }

    #[test]
    fn second_ntp_delivery_is_a_no_op() {
        let state = ConnectionState::new();
        state.handle_indication(&ntp());
        let before = state.snapshot();
        assert_eq!(state.handle_indication(&ntp()), LinkChange::None);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn mark_joined_reports_only_first_transition() {
        let state = ConnectionState::new();
        assert!(state.mark_joined());
        assert!(!state.mark_joined());
        assert!(state.is_joined());
    }

    // =========================================================================
    // Socket Tests
    // =========================================================================

    #[test]
    fn socket_closed_indication_clears_socket() {
        let state = ConnectionState::new();
        state.socket_opened(SocketId(0));
        assert!(state.is_socket_open());

        assert_eq!(state.handle_indication(&closed()), LinkChange::SocketLost);
        assert!(!state.is_socket_open());
    }

    #[test]
    fn socket_closed_without_open_socket_is_a_no_op() {
        let state = ConnectionState::new();
        assert_eq!(state.handle_indication(&closed()), LinkChange::None);
    }

    #[test]
    fn socket_closed_does_not_touch_join_flag() {
        let state = ConnectionState::new();
        state.mark_joined();
        state.socket_opened(SocketId(1));
        state.handle_indication(&closed());
        assert!(state.is_joined());
    }

    #[test]
    fn socket_id_survives_packing() {
        let state = ConnectionState::new();
        state.socket_opened(SocketId(u16::MAX));
        assert_eq!(state.socket(), Some(SocketId(u16::MAX)));
        assert_eq!(state.socket_closed(), Some(SocketId(u16::MAX)));
        assert_eq!(state.socket_closed(), None);
    }

    // =========================================================================
    // Diagnostics-only Events
    // =========================================================================

    #[test]
    fn other_indications_do_not_change_state() {
        let state = ConnectionState::new();
        state.socket_opened(SocketId(2));
        for kind in Indication::ALL {
            if matches!(kind, Indication::NtpServerDelivery | Indication::SocketClosed) {
                continue;
            }
            let event = IndicationEvent::new(kind, "diag");
            assert_eq!(state.handle_indication(&event), LinkChange::None);
        }
        assert_eq!(
            state.snapshot(),
            ConnectionSnapshot {
                joined: false,
                socket: Some(SocketId(2)),
            }
        );
    }

    #[test]
    fn unknown_codes_do_not_change_state() {
        let state = ConnectionState::new();
        let event = IndicationEvent::from_raw(4000, "vendor");
        assert_eq!(state.handle_indication(&event), LinkChange::None);
        assert!(!state.is_joined());
    }

    #[test]
    fn error_events_are_logged_only() {
        let state = ConnectionState::new();
        state.socket_opened(SocketId(0));
        let event = TransportEvent::Error(ErrorEvent::new(17, "Busy"));
        assert_eq!(state.handle_event(&event), LinkChange::None);
        assert!(state.is_socket_open());
    }

    #[test]
    fn handle_event_routes_indications() {
        let state = ConnectionState::new();
        let event: TransportEvent = ntp().into();
        assert_eq!(state.handle_event(&event), LinkChange::Joined);
    }
}
