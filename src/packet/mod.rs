//! TNS packet layer
//!
//! A [`Packet`] is one framed wire unit: the 8-byte header plus its raw
//! payload. The session's packet reader classifies inbound packets into the
//! [`TnsPacket`] sum; RESEND and CONNECT never appear there (RESEND is
//! absorbed by the reader, CONNECT is outbound-only).

mod accept;
mod connect;
mod data;
mod header;
mod marker;
mod redirect;
mod refuse;

pub use accept::AcceptPacket;
pub use connect::ConnectPacket;
pub use data::DataPacket;
pub use header::PacketHeader;
pub use marker::{MarkerKind, MarkerPacket};
pub use redirect::RedirectPacket;
pub use refuse::RefusePacket;

use bytes::Bytes;

use crate::constants::{PacketType, PACKET_HEADER_SIZE};
use crate::error::Result;

/// A complete framed packet: header plus raw payload
#[derive(Debug, Clone)]
pub struct Packet {
    /// The packet header
    pub header: PacketHeader,
    /// Everything after the 8-byte header
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet from an already-parsed header and payload
    pub fn new(header: PacketHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Parse a packet from raw wire bytes
    pub fn from_bytes(data: Bytes, large: bool) -> Result<Self> {
        let header = PacketHeader::parse(&data, large)?;
        let payload = data.slice(PACKET_HEADER_SIZE..);
        Ok(Self { header, payload })
    }

    /// The packet type tag
    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type
    }
}

/// A classified inbound packet
#[derive(Debug)]
pub enum TnsPacket {
    /// Handshake accepted; carries the negotiated context parameters
    Accept(AcceptPacket),
    /// Handshake refused with reason codes and a message
    Refuse(RefusePacket),
    /// Server redirects the client to another listener
    Redirect(RedirectPacket),
    /// Opaque payload bytes for the logical in-stream
    Data(DataPacket),
    /// Flow-control break or reset signal
    Marker(MarkerPacket),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_splits_header_and_payload() {
        let data = Bytes::from_static(&[
            0x00, 0x0A, // length 10
            0x00, 0x00, 0x06, // DATA
            0x00, 0x00, 0x00, 0x41, 0x42, // payload "AB"
        ]);
        let packet = Packet::from_bytes(data, false).unwrap();
        assert_eq!(packet.packet_type(), PacketType::Data);
        assert_eq!(&packet.payload[..], b"AB");
    }
}
