//! REFUSE packet
//!
//! The server's negative handshake reply: a user reason code, a system
//! reason code, and a listener error message such as
//! `(DESCRIPTION=(ERR=12514)...)`.

use crate::constants::PacketType;
use crate::error::{Error, Result};
use crate::packet::Packet;

/// Parsed REFUSE packet
#[derive(Debug)]
pub struct RefusePacket {
    /// User-level reason code
    pub user_reason: u8,
    /// System-level reason code
    pub system_reason: u8,
    /// Listener error message
    pub message: String,
}

impl RefusePacket {
    /// Parse a REFUSE packet payload
    pub fn parse(packet: &Packet) -> Result<Self> {
        if packet.packet_type() != PacketType::Refuse {
            return Err(Error::UnexpectedPacketType {
                expected: PacketType::Refuse,
                actual: packet.packet_type(),
            });
        }
        let body = &packet.payload;
        if body.len() < 4 {
            return Err(Error::PacketTooShort {
                expected: 12,
                actual: body.len(),
            });
        }

        let user_reason = body[0];
        let system_reason = body[1];
        let data_len = u16::from_be_bytes([body[2], body[3]]) as usize;
        let message = if data_len > 0 && body.len() >= 4 + data_len {
            String::from_utf8_lossy(&body[4..4 + data_len]).into_owned()
        } else {
            String::new()
        };

        Ok(Self {
            user_reason,
            system_reason,
            message,
        })
    }

    /// Turn the refusal into the handshake error surfaced to callers
    pub fn into_error(self) -> Error {
        Error::ConnectionRefused {
            user_reason: self.user_reason,
            system_reason: self.system_reason,
            message: self.message,
        }
    }
}
