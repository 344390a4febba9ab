//! TNS protocol constants
//!
//! Numeric values are fixed by the Oracle TNS wire protocol and match the
//! tags used by every compatible client.

/// Size of the TNS packet header in bytes
pub const PACKET_HEADER_SIZE: usize = 8;

/// TNS packet types (packet header byte 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Initial connection request from client
    Connect = 1,
    /// Server accepts connection
    Accept = 2,
    /// Server acknowledges (rarely used)
    Ack = 3,
    /// Server refuses connection
    Refuse = 4,
    /// Server redirects to a different address
    Redirect = 5,
    /// Data packet (carries the logical byte stream)
    Data = 6,
    /// Null packet
    Null = 7,
    /// Abort connection
    Abort = 9,
    /// Server requests retransmission of everything sent so far
    Resend = 11,
    /// Marker packet (break / reset)
    Marker = 12,
    /// Attention packet
    Attention = 13,
    /// Control packet (inband notifications)
    Control = 14,
}

impl TryFrom<u8> for PacketType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PacketType::Connect),
            2 => Ok(PacketType::Accept),
            3 => Ok(PacketType::Ack),
            4 => Ok(PacketType::Refuse),
            5 => Ok(PacketType::Redirect),
            6 => Ok(PacketType::Data),
            7 => Ok(PacketType::Null),
            9 => Ok(PacketType::Abort),
            11 => Ok(PacketType::Resend),
            12 => Ok(PacketType::Marker),
            13 => Ok(PacketType::Attention),
            14 => Ok(PacketType::Control),
            _ => Err(crate::error::Error::InvalidPacketType(value)),
        }
    }
}

/// Protocol version thresholds
#[allow(missing_docs)]
pub mod version {
    /// Version requested in the CONNECT packet
    pub const DESIRED: u16 = 319;
    /// Lowest version the client will talk
    pub const MINIMUM: u16 = 300;
    /// First version that uses a 32-bit packet length after the handshake
    pub const MIN_LARGE_LENGTH: u16 = 315;
}

/// Marker packet types and payload values
#[allow(missing_docs)]
pub mod marker {
    /// markerType signalling an unconditional break
    pub const TYPE_BREAK: u8 = 0;
    /// markerType whose meaning depends on the data byte
    pub const TYPE_DATA: u8 = 1;
    /// markerData value that turns a TYPE_DATA marker into a reset
    pub const DATA_RESET: u8 = 2;
}

/// CLR length indicators (first byte of an encoded byte string)
#[allow(missing_docs)]
pub mod clr {
    /// Largest length encodable with a single prefix byte
    pub const MAX_INLINE: usize = 0xFC;
    /// Introduces the chunked form
    pub const LONG_INDICATOR: u8 = 0xFE;
    /// Decodes to an empty value
    pub const NULL_INDICATOR: u8 = 0xFF;
    /// Default chunk size for the chunked form
    pub const DEFAULT_CHUNK_SIZE: usize = 0x40;
    /// Safety cap for the legacy null-terminated chunk run
    pub const ESCAPE_RUN_CAP: usize = 4 * 1024;
}

/// CONNECT packet layout constants
#[allow(missing_docs)]
pub mod connect {
    /// Offset of the connect data within the CONNECT packet
    pub const DATA_OFFSET: u16 = 74;
    /// Largest connect string carried inline; longer strings are flushed
    /// as a follow-up DATA packet
    pub const MAX_INLINE_DATA: usize = 230;
    /// Protocol characteristics advertised by the client
    pub const PROTOCOL_CHARACTERISTICS: u16 = 0x7F08;
    /// NSI flag: security renegotiation supported
    pub const NSI_SUPPORT_SECURITY_RENEG: u8 = 0x80;
    /// NSI flag: native network encryption disabled
    pub const NSI_DISABLE_NA: u8 = 0x04;
    /// NSI flag: server requires native network encryption
    pub const NSI_NA_REQUIRED: u8 = 0x10;
}

/// Default session data unit (max packet size) before negotiation
pub const DEFAULT_SDU: u32 = 8192;

/// Default transport data unit before negotiation
pub const DEFAULT_TDU: u32 = 0xFFFF;

/// Framing overhead subtracted from the SDU when segmenting the
/// logical out-stream into DATA packets
pub const DATA_PACKET_OVERHEAD: u32 = 20;
