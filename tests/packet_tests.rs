//! Packet construction and parsing tests over the public API

use bytes::Bytes;
use oracle_net::constants::{PacketType, PACKET_HEADER_SIZE};
use oracle_net::{
    AcceptPacket, ConnectionOption, ConnectPacket, DataPacket, MarkerKind, MarkerPacket, Packet,
    PacketHeader, RedirectPacket, RefusePacket, SessionContext,
};

fn make_packet(packet_type: PacketType, flags: u8, payload: &[u8]) -> Packet {
    let header = PacketHeader::with_flags(
        packet_type,
        (PACKET_HEADER_SIZE + payload.len()) as u32,
        flags,
    );
    Packet::new(header, Bytes::copy_from_slice(payload))
}

mod connect_packet {
    use super::*;

    #[test]
    fn inline_descriptor() {
        let option = ConnectionOption::new("dbhost", 1521)
            .with_conn_data("(DESCRIPTION=(CONNECT_DATA=(SERVICE_NAME=ORCL)))");
        let ctx = SessionContext::new(&option);
        let pck = ConnectPacket::new(&ctx, &option);

        assert!(!pck.data_overflows());
        let raw = pck.bytes();
        assert_eq!(raw[4], PacketType::Connect as u8);
        assert_eq!(u16::from_be_bytes([raw[0], raw[1]]) as usize, raw.len());
        assert!(raw.len() > 74);
        assert!(raw[74..].starts_with(b"(DESCRIPTION="));
    }

    #[test]
    fn oversize_descriptor_matches_offset() {
        let option = ConnectionOption::new("dbhost", 1521).with_conn_data("S".repeat(400));
        let ctx = SessionContext::new(&option);
        let pck = ConnectPacket::new(&ctx, &option);

        assert!(pck.data_overflows());
        assert_eq!(pck.length, pck.data_offset as u32);
        assert_eq!(pck.bytes().len(), 74);
    }
}

mod accept_packet {
    use super::*;

    #[test]
    fn negotiated_values_land_in_context() {
        let payload = [
            0x01, 0x3E, // version 318
            0x00, 0x01, // options
            0x08, 0x00, // SDU 2048 (16-bit)
            0xFF, 0xFF, // TDU
            0x00, 0x00, // byte order
            0x00, 0x00, 0x00, 0x00, // data len/offset
            0x04, 0x04, // flags
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // reserved
            0x00, 0x00, 0x20, 0x00, // SDU 32-bit: 8192
        ];
        let accept = AcceptPacket::parse(&make_packet(PacketType::Accept, 0, &payload)).unwrap();

        let option = ConnectionOption::new("dbhost", 1521);
        let mut ctx = SessionContext::new(&option);
        accept.apply(&mut ctx);
        ctx.handshake_complete = true;

        assert_eq!(ctx.version, 318);
        assert_eq!(ctx.session_data_unit, 8192);
        assert!(ctx.uses_large_length());
    }
}

mod refuse_packet {
    use super::*;

    #[test]
    fn reasons_and_message_surface_in_error() {
        let message = b"bad user";
        let mut payload = vec![0x01, 0x02];
        payload.extend_from_slice(&(message.len() as u16).to_be_bytes());
        payload.extend_from_slice(message);

        let refuse = RefusePacket::parse(&make_packet(PacketType::Refuse, 0, &payload)).unwrap();
        assert_eq!(refuse.user_reason, 1);
        assert_eq!(refuse.system_reason, 2);

        let text = refuse.into_error().to_string();
        assert!(text.contains('1'));
        assert!(text.contains('2'));
        assert!(text.contains("bad user"));
    }
}

mod redirect_packet {
    use super::*;

    #[test]
    fn host_port_and_reconnect_data() {
        let data = "newhost:1522\0connData123";
        let mut payload = (data.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(data.as_bytes());

        let pck =
            RedirectPacket::parse(&make_packet(PacketType::Redirect, 0x02, &payload)).unwrap();
        assert_eq!(pck.host(), "newhost");
        assert_eq!(pck.port(), "1522");
        assert_eq!(pck.reconnect_data, "connData123");
    }

    #[test]
    fn descriptor_address_fields() {
        let data = "(ADDRESS=(PROTOCOL=tcps)(HOST=scan.example.com)(PORT=2484))";
        let mut payload = (data.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(data.as_bytes());

        let pck = RedirectPacket::parse(&make_packet(PacketType::Redirect, 0, &payload)).unwrap();
        assert_eq!(pck.protocol(), "tcps");
        assert_eq!(pck.host(), "scan.example.com");
        assert_eq!(pck.port(), "2484");
    }
}

mod data_packet {
    use super::*;

    #[test]
    fn header_width_follows_negotiation() {
        let pck = DataPacket::new(Bytes::from_static(b"payload"));

        let small = pck.bytes(false);
        assert_eq!(u16::from_be_bytes([small[0], small[1]]) as usize, small.len());

        let large = pck.bytes(true);
        assert_eq!(
            u32::from_be_bytes([large[0], large[1], large[2], large[3]]) as usize,
            large.len()
        );
        assert_eq!(&large[10..], b"payload");
    }
}

mod marker_packet {
    use super::*;

    #[test]
    fn break_and_reset_classification() {
        let break_pck =
            MarkerPacket::parse(&make_packet(PacketType::Marker, 0, &[0, 0, 0])).unwrap();
        assert_eq!(break_pck.kind().unwrap(), MarkerKind::Break);

        let reset_pck =
            MarkerPacket::parse(&make_packet(PacketType::Marker, 0, &[1, 0, 2])).unwrap();
        assert_eq!(reset_pck.kind().unwrap(), MarkerKind::Reset);

        let soft_break =
            MarkerPacket::parse(&make_packet(PacketType::Marker, 0, &[1, 0, 1])).unwrap();
        assert_eq!(soft_break.kind().unwrap(), MarkerKind::Break);

        let unknown = MarkerPacket::parse(&make_packet(PacketType::Marker, 0, &[7, 0, 0])).unwrap();
        assert!(unknown.kind().is_err());
    }
}
