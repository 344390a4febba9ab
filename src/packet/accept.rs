//! ACCEPT packet
//!
//! The server's positive handshake reply. Carries the negotiated protocol
//! version, service options and data unit sizes; the caller installs these
//! into the live session context and marks the handshake complete.
//!
//! Payload layout (offsets after the 8-byte header):
//! ```text
//! Offset | Size | Description
//! -------+------+------------------
//!      0 |    2 | Protocol version
//!      2 |    2 | Service options
//!      4 |    2 | SDU size (16-bit)
//!      6 |    2 | TDU size (16-bit)
//!      8 |    2 | Hardware byte order
//!     10 |    2 | Accept data length
//!     12 |    2 | Accept data offset
//!     14 |    1 | Flags 0
//!     15 |    1 | Flags 1
//!     16 |    8 | Reserved
//!     24 |    4 | SDU size (32-bit, version >= 315)
//! ```

use crate::constants::{connect, version, PacketType};
use crate::context::SessionContext;
use crate::error::{Error, Result};
use crate::packet::Packet;

/// Parsed ACCEPT packet
#[derive(Debug)]
pub struct AcceptPacket {
    /// Negotiated protocol version
    pub version: u16,
    /// Negotiated service options
    pub options: u16,
    /// Negotiated session data unit
    pub session_data_unit: u32,
    /// Negotiated transport data unit
    pub transport_data_unit: u32,
    /// Server flags
    pub flags: u8,
}

impl AcceptPacket {
    /// Parse an ACCEPT packet payload
    pub fn parse(packet: &Packet) -> Result<Self> {
        if packet.packet_type() != PacketType::Accept {
            return Err(Error::UnexpectedPacketType {
                expected: PacketType::Accept,
                actual: packet.packet_type(),
            });
        }
        let body = &packet.payload;
        if body.len() < 16 {
            return Err(Error::PacketTooShort {
                expected: 24,
                actual: body.len(),
            });
        }

        let version = u16::from_be_bytes([body[0], body[1]]);
        let options = u16::from_be_bytes([body[2], body[3]]);
        let sdu_16 = u16::from_be_bytes([body[4], body[5]]) as u32;
        let tdu_16 = u16::from_be_bytes([body[6], body[7]]) as u32;
        let flags = body[14];

        if flags & connect::NSI_NA_REQUIRED != 0 {
            return Err(Error::NativeNetworkEncryptionRequired);
        }

        // version >= 315 renegotiates the SDU as a 32-bit quantity
        let session_data_unit = if version >= version::MIN_LARGE_LENGTH && body.len() >= 28 {
            u32::from_be_bytes([body[24], body[25], body[26], body[27]])
        } else {
            sdu_16
        };

        Ok(Self {
            version,
            options,
            session_data_unit,
            transport_data_unit: tdu_16,
            flags,
        })
    }

    /// Install the negotiated parameters into the live session context.
    /// The caller flips `handshake_complete` once the whole handshake is
    /// settled.
    pub fn apply(&self, ctx: &mut SessionContext) {
        ctx.version = self.version;
        ctx.options = self.options;
        ctx.session_data_unit = self.session_data_unit;
        ctx.transport_data_unit = self.transport_data_unit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionOption;
    use crate::constants::PACKET_HEADER_SIZE;
    use crate::packet::PacketHeader;
    use bytes::Bytes;

    fn make_accept(payload: &[u8]) -> Packet {
        let header = PacketHeader::new(
            PacketType::Accept,
            (PACKET_HEADER_SIZE + payload.len()) as u32,
        );
        Packet::new(header, Bytes::copy_from_slice(payload))
    }

    #[test]
    fn parse_modern_accept() {
        let payload = [
            0x01, 0x3E, // version 318
            0x00, 0x01, // options
            0x20, 0x00, // SDU 8192
            0xFF, 0xFF, // TDU 65535
            0x00, 0x00, // byte order
            0x00, 0x00, // data length
            0x00, 0x00, // data offset
            0x04, // flags 0
            0x04, // flags 1
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // reserved
            0x00, 0x00, 0x40, 0x00, // SDU 32-bit: 16384
        ];
        let accept = AcceptPacket::parse(&make_accept(&payload)).unwrap();
        assert_eq!(accept.version, 318);
        assert_eq!(accept.session_data_unit, 16384);
        assert_eq!(accept.transport_data_unit, 0xFFFF);
    }

    #[test]
    fn parse_pre_315_uses_sixteen_bit_sdu() {
        let payload = [
            0x01, 0x36, // version 310
            0x00, 0x01, 0x20, 0x00, // SDU 8192
            0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x04,
        ];
        let accept = AcceptPacket::parse(&make_accept(&payload)).unwrap();
        assert_eq!(accept.version, 310);
        assert_eq!(accept.session_data_unit, 8192);
    }

    #[test]
    fn na_required_is_rejected() {
        let payload = [
            0x01, 0x3E, 0x00, 0x01, 0x20, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x10, // NSI_NA_REQUIRED
            0x00,
        ];
        assert!(matches!(
            AcceptPacket::parse(&make_accept(&payload)),
            Err(Error::NativeNetworkEncryptionRequired)
        ));
    }

    #[test]
    fn apply_overwrites_context() {
        let opt = ConnectionOption::new("localhost", 1521);
        let mut ctx = SessionContext::new(&opt);
        let accept = AcceptPacket {
            version: 318,
            options: 1,
            session_data_unit: 8192,
            transport_data_unit: 0xFFFF,
            flags: 4,
        };
        accept.apply(&mut ctx);
        assert_eq!(ctx.version, 318);
        assert_eq!(ctx.session_data_unit, 8192);
        assert!(!ctx.handshake_complete);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let header = PacketHeader::new(PacketType::Data, 10);
        let packet = Packet::new(header, Bytes::from_static(&[0, 0]));
        assert!(AcceptPacket::parse(&packet).is_err());
    }
}
