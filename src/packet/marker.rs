//! MARKER packet
//!
//! Out-of-band flow control. The 3-byte body is `[marker_type, 0,
//! marker_data]`: type 0 signals a break, type 1 with data 2 signals a
//! stream reset, type 1 with any other data is also a break, and any other
//! type is a protocol error. The client acknowledges a reset by echoing a
//! type-1/data-2 marker.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::{marker, PacketType, PACKET_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::packet::{Packet, PacketHeader};

/// What a marker tells the client to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Interrupt the current exchange
    Break,
    /// Reset the logical stream
    Reset,
}

/// A MARKER packet
#[derive(Debug, Clone, Copy)]
pub struct MarkerPacket {
    /// Marker type byte
    pub marker_type: u8,
    /// Marker data byte
    pub marker_data: u8,
}

impl MarkerPacket {
    /// The acknowledgement marker echoed after a stream reset
    pub fn reset_ack() -> Self {
        Self {
            marker_type: marker::TYPE_DATA,
            marker_data: marker::DATA_RESET,
        }
    }

    /// Parse an inbound MARKER packet
    pub fn parse(packet: &Packet) -> Result<Self> {
        if packet.packet_type() != PacketType::Marker {
            return Err(Error::UnexpectedPacketType {
                expected: PacketType::Marker,
                actual: packet.packet_type(),
            });
        }
        let body = &packet.payload;
        if body.len() < 3 {
            return Err(Error::PacketTooShort {
                expected: PACKET_HEADER_SIZE + 3,
                actual: body.len(),
            });
        }
        Ok(Self {
            marker_type: body[0],
            marker_data: body[2],
        })
    }

    /// Classify the marker, rejecting unknown types
    pub fn kind(&self) -> Result<MarkerKind> {
        match self.marker_type {
            marker::TYPE_BREAK => Ok(MarkerKind::Break),
            marker::TYPE_DATA if self.marker_data == marker::DATA_RESET => Ok(MarkerKind::Reset),
            marker::TYPE_DATA => Ok(MarkerKind::Break),
            other => Err(Error::UnknownMarkerType(other)),
        }
    }

    /// Serialize with the header width selected by the negotiated context
    pub fn bytes(&self, large: bool) -> Bytes {
        let length = (PACKET_HEADER_SIZE + 3) as u32;
        let mut buf = BytesMut::with_capacity(length as usize);
        PacketHeader::new(PacketType::Marker, length).write(&mut buf, large);
        buf.put_u8(self.marker_type);
        buf.put_u8(0);
        buf.put_u8(self.marker_data);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_marker(body: &[u8]) -> MarkerPacket {
        let header = PacketHeader::new(PacketType::Marker, (PACKET_HEADER_SIZE + body.len()) as u32);
        MarkerPacket::parse(&Packet::new(header, Bytes::copy_from_slice(body))).unwrap()
    }

    #[test]
    fn classification() {
        assert_eq!(parse_marker(&[0, 0, 0]).kind().unwrap(), MarkerKind::Break);
        assert_eq!(parse_marker(&[1, 0, 2]).kind().unwrap(), MarkerKind::Reset);
        assert_eq!(parse_marker(&[1, 0, 1]).kind().unwrap(), MarkerKind::Break);
        assert!(matches!(
            parse_marker(&[9, 0, 0]).kind(),
            Err(Error::UnknownMarkerType(9))
        ));
    }

    #[test]
    fn reset_ack_bytes() {
        let raw = MarkerPacket::reset_ack().bytes(false);
        assert_eq!(
            &raw[..],
            &[0x00, 0x0B, 0x00, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02]
        );
    }

    #[test]
    fn roundtrip_large_header() {
        let raw = MarkerPacket::reset_ack().bytes(true);
        let packet = Packet::from_bytes(raw, true).unwrap();
        let parsed = MarkerPacket::parse(&packet).unwrap();
        assert_eq!(parsed.kind().unwrap(), MarkerKind::Reset);
    }
}
