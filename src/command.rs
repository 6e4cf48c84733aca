//! Inbound text commands and the line buffer that reassembles them.
//!
//! The wire protocol is plain text with no framing: whatever bytes arrive
//! in one poll form one command. Only the exact tokens `open` and `close`
//! are recognized; everything else, the empty string included, is ignored.

use heapless::String as HString;

/// Capacity of the socket read buffer and of the reassembled command.
pub const READ_BUFFER_LEN: usize = 512;

/// A command received from the remote peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Command {
    /// Open the door.
    Open,
    /// Close the door.
    Close,
    /// Anything else. Dispatching it does nothing.
    Unknown,
}

impl Command {
    /// Parses a command by exact, case-sensitive match.
    ///
    /// # Examples
    ///
    /// ```
    /// use garage_link::Command;
    ///
    /// assert_eq!(Command::parse("open"), Command::Open);
    /// assert_eq!(Command::parse("close"), Command::Close);
    /// assert_eq!(Command::parse("Open"), Command::Unknown);
    /// assert_eq!(Command::parse("open\n"), Command::Unknown);
    /// assert_eq!(Command::parse(""), Command::Unknown);
    /// ```
    pub fn parse(text: &str) -> Self {
        match text {
            "open" => Command::Open,
            "close" => Command::Close,
            _ => Command::Unknown,
        }
    }

    /// Returns the wire token, if the command has one.
    pub const fn as_str(&self) -> Option<&'static str> {
        match self {
            Command::Open => Some("open"),
            Command::Close => Some("close"),
            Command::Unknown => None,
        }
    }
}

/// Accumulates bytes drained from the socket into command text.
///
/// Zero bytes mark unused read-buffer slots and are skipped. Each absorbed
/// slot is zeroed again so the same read buffer can be reused on the next
/// poll without stale data leaking into the next command.
#[derive(Debug, Default)]
pub struct LineBuffer {
    text: HString<READ_BUFFER_LEN>,
    overflowed: bool,
}

impl LineBuffer {
    /// Creates an empty line buffer.
    pub const fn new() -> Self {
        Self {
            text: HString::new(),
            overflowed: false,
        }
    }

    /// Appends every non-zero slot of `buffer` in index order, zeroing each
    /// slot it consumes.
    ///
    /// Each byte is taken as one character (Latin-1), matching what a
    /// byte-per-character peer sends. Returns the number of bytes absorbed.
    pub fn absorb(&mut self, buffer: &mut [u8]) -> usize {
        let mut absorbed = 0;
        for slot in buffer.iter_mut().filter(|b| **b != 0) {
            if self.text.push(char::from(*slot)).is_err() {
                self.overflowed = true;
            }
            *slot = 0;
            absorbed += 1;
        }
        absorbed
    }

    /// Current accumulated text.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Returns true if nothing has been absorbed since the last take.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns true if bytes were dropped because the buffer was full.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Parses the accumulated text and clears the buffer.
    ///
    /// An overflowed buffer never yields a recognized command.
    pub fn take_command(&mut self) -> Command {
        let command = if self.overflowed {
            Command::Unknown
        } else {
            Command::parse(self.text.as_str())
        };
        self.clear();
        command
    }

    /// Discards any accumulated text.
    pub fn clear(&mut self) {
        self.text.clear();
        self.overflowed = false;
    }
}
