//! TNS packet header encoding/decoding
//!
//! Every on-wire unit starts with an 8-byte header:
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! | Length (2 or 4) | zeros / length  | Type(1)| Flags(1)| Reserved (2)   |
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! ```
//!
//! Before handshake completion, and for negotiated versions below 315, the
//! length is a big-endian u16 over bytes [0..2] with two zero bytes after
//! it. Once the handshake has completed at version >= 315, the length is a
//! big-endian u32 over bytes [0..4]. Byte [4] is always the packet type.

use bytes::{BufMut, BytesMut};

use crate::constants::{PacketType, PACKET_HEADER_SIZE};
use crate::error::{Error, Result};

/// TNS packet header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Total packet length including the header
    pub length: u32,
    /// Packet type tag
    pub packet_type: PacketType,
    /// Packet flags
    pub flags: u8,
}

impl PacketHeader {
    /// Create a new packet header
    pub fn new(packet_type: PacketType, length: u32) -> Self {
        Self {
            length,
            packet_type,
            flags: 0,
        }
    }

    /// Create a new packet header with flags
    pub fn with_flags(packet_type: PacketType, length: u32, flags: u8) -> Self {
        Self {
            length,
            packet_type,
            flags,
        }
    }

    /// Parse a header from raw bytes.
    ///
    /// `large` selects the 32-bit length field used after the handshake at
    /// version >= 315.
    pub fn parse(data: &[u8], large: bool) -> Result<Self> {
        if data.len() < PACKET_HEADER_SIZE {
            return Err(Error::PacketTooShort {
                expected: PACKET_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let length = if large {
            u32::from_be_bytes([data[0], data[1], data[2], data[3]])
        } else {
            u16::from_be_bytes([data[0], data[1]]) as u32
        };
        let packet_type = PacketType::try_from(data[4])?;
        let flags = data[5];

        Ok(Self {
            length,
            packet_type,
            flags,
        })
    }

    /// Append the encoded header to `buf`
    pub fn write(&self, buf: &mut BytesMut, large: bool) {
        if large {
            buf.put_u32(self.length);
        } else {
            buf.put_u16(self.length as u16);
            buf.put_u16(0);
        }
        buf.put_u8(self.packet_type as u8);
        buf.put_u8(self.flags);
        buf.put_u16(0);
    }

    /// Length of the payload that follows the header
    pub fn payload_length(&self) -> usize {
        (self.length as usize).saturating_sub(PACKET_HEADER_SIZE)
    }
}
