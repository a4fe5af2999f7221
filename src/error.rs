//! Error types for waylink.

use thiserror::Error;

/// Main error type for all waylink operations.
#[derive(Debug, Error)]
pub enum WaylinkError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection (a `recv` returned zero bytes).
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The kernel accepted fewer bytes than a flush requested.
    ///
    /// There is no partial-write retry loop; the connection is
    /// unusable once this is reported.
    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Stream desynchronization: a malformed size field, a cursor
    /// overrun inside a message, or a truncated string.
    #[error("framing error: {0}")]
    Framing(String),

    /// Protocol violation that is not a framing fault (e.g. a message
    /// addressed to the null object).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The peer reported a fatal error on the root object's control
    /// channel. The connection is unusable by protocol contract.
    #[error("peer error on object {object_id} (code {code}): {message}")]
    Remote {
        object_id: u32,
        code: u32,
        message: String,
    },

    /// A send-buffer allocation would meet or exceed the arena capacity.
    #[error("send buffer full: requested {requested} bytes, capacity {capacity}")]
    BufferFull { requested: usize, capacity: usize },

    /// No free object ID below the protocol maximum.
    #[error("object ID space exhausted")]
    IdSpaceExhausted,

    /// A required environment variable is missing (socket discovery).
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Result type alias using WaylinkError.
pub type Result<T> = std::result::Result<T, WaylinkError>;
