//! Error types for the session and transport core
//!
//! Transport and framing errors are fatal to the session; a refused
//! handshake is fatal to that connect attempt only; a server error parsed
//! from a call summary is delivered as a value and leaves the session
//! usable.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the session core
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    // =========================================================================
    // Framing errors
    // =========================================================================
    /// Invalid packet type received
    #[error("invalid packet type: {0}")]
    InvalidPacketType(u8),

    /// Packet too short to contain a valid header
    #[error("packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    /// Unexpected packet type received
    #[error("unexpected packet type: expected {expected:?}, got {actual:?}")]
    UnexpectedPacketType {
        expected: crate::constants::PacketType,
        actual: crate::constants::PacketType,
    },

    /// Chunked byte-string decoding hit a chunk larger than the protocol allows
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(u8),

    /// MARKER packet with a type the protocol does not define
    #[error("unknown marker type: {0}")]
    UnknownMarkerType(u8),

    /// The in-stream needed a DATA packet but something else arrived
    #[error("the packet received is not a data packet")]
    NonDataPacket,

    /// The packet read loop gave up after repeated retransmissions
    #[error("abnormal response")]
    AbnormalResponse,

    // =========================================================================
    // Buffer errors
    // =========================================================================
    /// Not enough data in the in-stream to satisfy a read
    #[error("buffer underflow: need {needed} bytes but only {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    // =========================================================================
    // Connection errors
    // =========================================================================
    /// Connection refused by the server with reason codes
    #[error("connection refused by the server. user reason: {user_reason}; system reason: {system_reason}; error message: {message}")]
    ConnectionRefused {
        user_reason: u8,
        system_reason: u8,
        message: String,
    },

    /// Connection refused without a recognizable refusal packet
    #[error("connection refused by the server due to unknown reason")]
    Refused,

    /// Redirect packet carried a port that does not parse as a decimal number
    #[error("redirect packet with wrong port: {0}")]
    InvalidRedirectPort(String),

    /// Redirect chain exceeded the client-side bound
    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),

    /// Server kept signalling break without a reset
    #[error("connection break")]
    ConnectionBreak,

    /// Connection closed unexpectedly
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// Connection timeout
    #[error("connection timeout after {0:?}")]
    ConnectionTimeout(std::time::Duration),

    /// Server requires native network encryption which this client does not speak
    #[error("native network encryption and data integrity is required but not supported")]
    NativeNetworkEncryptionRequired,

    // =========================================================================
    // Server errors
    // =========================================================================
    /// Oracle server error parsed from a call summary; the session stays usable
    #[error("ORA-{code:05}: {message}")]
    OracleError { code: u32, message: String },

    // =========================================================================
    // TLS errors
    // =========================================================================
    /// TLS configuration or negotiation failure
    #[error("TLS error: {0}")]
    Tls(String),

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a new Oracle server error
    pub fn oracle(code: u32, message: impl Into<String>) -> Self {
        Error::OracleError {
            code,
            message: message.into(),
        }
    }

    /// Check if this is a connection-level error (the session is broken)
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Error::ConnectionRefused { .. }
                | Error::ConnectionClosed
                | Error::ConnectionTimeout(_)
                | Error::ConnectionBreak
                | Error::Io(_)
        )
    }

    /// Check if this is a server error that leaves the session usable
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::OracleError { .. })
    }
}
