//! DATA packet
//!
//! Carries a slice of the logical byte stream. The body starts with a
//! 2-byte data-flags word at packet offset 8; the opaque payload follows at
//! offset 10. One DATA packet holds at most `SessionDataUnit - 20` payload
//! bytes; the session segments larger flushes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{PacketType, PACKET_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::packet::{Packet, PacketHeader};

/// Packet-absolute offset of the payload
const PAYLOAD_OFFSET: usize = PACKET_HEADER_SIZE + 2;

/// A DATA packet
#[derive(Debug, Clone)]
pub struct DataPacket {
    /// Data flags word (0 for plain stream data)
    pub data_flags: u16,
    /// The opaque payload
    pub payload: Bytes,
}

impl DataPacket {
    /// Wrap a payload slice in a DATA packet
    pub fn new(payload: Bytes) -> Self {
        Self {
            data_flags: 0,
            payload,
        }
    }

    /// Parse an inbound DATA packet
    pub fn parse(packet: &Packet) -> Result<Self> {
        if packet.packet_type() != PacketType::Data {
            return Err(Error::UnexpectedPacketType {
                expected: PacketType::Data,
                actual: packet.packet_type(),
            });
        }
        let body = &packet.payload;
        if body.len() < 2 {
            return Err(Error::PacketTooShort {
                expected: PAYLOAD_OFFSET,
                actual: body.len(),
            });
        }
        Ok(Self {
            data_flags: u16::from_be_bytes([body[0], body[1]]),
            payload: packet.payload.slice(2..),
        })
    }

    /// Serialize with the header width selected by the negotiated context
    pub fn bytes(&self, large: bool) -> Bytes {
        let length = (PAYLOAD_OFFSET + self.payload.len()) as u32;
        let mut buf = BytesMut::with_capacity(length as usize);
        PacketHeader::new(PacketType::Data, length).write(&mut buf, large);
        buf.put_u16(self.data_flags);
        buf.put_slice(&self.payload);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload() {
        let pck = DataPacket::new(Bytes::new());
        let bytes = pck.bytes(false);
        assert_eq!(bytes.len(), 10);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 10);
        assert_eq!(bytes[4], PacketType::Data as u8);
    }

    #[test]
    fn roundtrip() {
        let pck = DataPacket::new(Bytes::from_static(b"hello"));
        for large in [false, true] {
            let raw = pck.bytes(large);
            let packet = Packet::from_bytes(raw, large).unwrap();
            let parsed = DataPacket::parse(&packet).unwrap();
            assert_eq!(parsed.data_flags, 0);
            assert_eq!(&parsed.payload[..], b"hello");
        }
    }

    #[test]
    fn non_data_is_rejected() {
        let header = PacketHeader::new(PacketType::Marker, 11);
        let packet = Packet::new(header, Bytes::from_static(&[1, 0, 2]));
        assert!(DataPacket::parse(&packet).is_err());
    }
}
