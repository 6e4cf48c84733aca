//! Outbound notifications sent to the remote peer.
//!
//! Notifications are fixed ASCII strings written to the socket byte for
//! byte, with no terminator or framing.

/// A notification the controller sends on the socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Notification {
    /// The touch sensor is being pressed.
    OpenRequested,
    /// The light sensor is covered while the door is open.
    CarInGarage,
    /// The light sensor cleared again after a car came in.
    ClearToClose,
}

impl Notification {
    /// Text sent on the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use garage_link::Notification;
    ///
    /// assert_eq!(Notification::CarInGarage.as_str(), "Car in the garage");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            Notification::OpenRequested => "Someone wants to open the garage",
            Notification::CarInGarage => "Car in the garage",
            Notification::ClearToClose => "You can close the garage",
        }
    }

    /// Wire bytes (UTF-8, untransformed).
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl core::fmt::Display for Notification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
