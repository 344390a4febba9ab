//! REDIRECT packet
//!
//! The server points the client at a different listener, commonly for RAC
//! load balancing, SCAN listeners or Connection Manager. The 2-byte data
//! length sits at the start of the payload; the body itself is either
//! inline at bytes [10..10+len] of the packet, or delivered as a following
//! DATA packet when the declared packet length does not reach past the
//! length field.
//!
//! With header flag bit 0x02 set, a NUL inside the body splits it into the
//! redirect address and opaque reconnect data that must be echoed back in
//! the next CONNECT. The address is either a `(ADDRESS=...)` descriptor or
//! bare `host:port` text.

use crate::constants::PacketType;
use crate::error::{Error, Result};
use crate::packet::Packet;

/// Packet-absolute offset where an inline redirect body starts
const BODY_OFFSET: u32 = 10;

/// Flag bit marking a body that carries reconnect data after a NUL
const FLAG_HAS_RECONNECT_DATA: u8 = 0x02;

/// Parsed REDIRECT packet
#[derive(Debug, Clone)]
pub struct RedirectPacket {
    /// Declared length of the redirect body
    pub data_len: u16,
    flags: u8,
    needs_body: bool,
    /// Address of the listener to reconnect to
    pub redirect_addr: String,
    /// Opaque data echoed back in the follow-up CONNECT
    pub reconnect_data: String,
}

impl RedirectPacket {
    /// Parse a REDIRECT packet. When the body is split into a following
    /// DATA packet, [`RedirectPacket::needs_body`] is true and the caller
    /// must feed that packet's payload to [`RedirectPacket::apply_body`].
    pub fn parse(packet: &Packet) -> Result<Self> {
        if packet.packet_type() != PacketType::Redirect {
            return Err(Error::UnexpectedPacketType {
                expected: PacketType::Redirect,
                actual: packet.packet_type(),
            });
        }
        let body = &packet.payload;
        if body.len() < 2 {
            return Err(Error::PacketTooShort {
                expected: BODY_OFFSET as usize,
                actual: body.len(),
            });
        }
        let data_len = u16::from_be_bytes([body[0], body[1]]);

        let mut pck = Self {
            data_len,
            flags: packet.header.flags,
            needs_body: packet.header.length <= BODY_OFFSET,
            redirect_addr: String::new(),
            reconnect_data: String::new(),
        };
        if !pck.needs_body {
            let end = (2 + data_len as usize).min(body.len());
            let inline = String::from_utf8_lossy(&body[2..end]).into_owned();
            pck.apply_body(&inline);
        }
        Ok(pck)
    }

    /// Whether the redirect body arrives as a following DATA packet
    pub fn needs_body(&self) -> bool {
        self.needs_body
    }

    /// Interpret the redirect body text
    pub fn apply_body(&mut self, data: &str) {
        self.needs_body = false;
        match data.find('\0') {
            Some(pos) if pos > 0 && self.flags & FLAG_HAS_RECONNECT_DATA != 0 => {
                self.redirect_addr = data[..pos].to_string();
                self.reconnect_data = data[pos + 1..].to_string();
            }
            _ => {
                // a trailing NUL on a plain address is not part of it
                self.redirect_addr = data.trim_end_matches('\0').to_string();
            }
        }
    }

    /// Protocol tag carried in the redirect address, if any
    pub fn protocol(&self) -> String {
        extract_keyword(&self.redirect_addr, "PROTOCOL=").unwrap_or_default()
    }

    /// Host carried in the redirect address, if any
    pub fn host(&self) -> String {
        if let Some(host) = extract_keyword(&self.redirect_addr, "HOST=") {
            return host;
        }
        match self.redirect_addr.rsplit_once(':') {
            Some((host, _)) if !host.is_empty() => host.to_string(),
            _ => String::new(),
        }
    }

    /// Port carried in the redirect address, as unparsed text
    pub fn port(&self) -> String {
        if let Some(port) = extract_keyword(&self.redirect_addr, "PORT=") {
            return port;
        }
        match self.redirect_addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => port.to_string(),
            _ => String::new(),
        }
    }
}

/// Pull `(KEY=value)` out of a TNS address descriptor
fn extract_keyword(address: &str, key: &str) -> Option<String> {
    let start = address.find(key)? + key.len();
    let end = address[start..].find(')')?;
    Some(address[start..start + end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PACKET_HEADER_SIZE;
    use crate::packet::PacketHeader;
    use bytes::Bytes;

    fn make_redirect(body: &[u8], flags: u8) -> Packet {
        let header = PacketHeader::with_flags(
            PacketType::Redirect,
            (PACKET_HEADER_SIZE + body.len()) as u32,
            flags,
        );
        Packet::new(header, Bytes::copy_from_slice(body))
    }

    fn with_len(data: &str) -> Vec<u8> {
        let mut body = (data.len() as u16).to_be_bytes().to_vec();
        body.extend_from_slice(data.as_bytes());
        body
    }

    #[test]
    fn inline_host_port_with_reconnect_data() {
        let body = with_len("newhost:1522\0connData123");
        let pck = RedirectPacket::parse(&make_redirect(&body, 0x02)).unwrap();

        assert!(!pck.needs_body());
        assert_eq!(pck.redirect_addr, "newhost:1522");
        assert_eq!(pck.reconnect_data, "connData123");
        assert_eq!(pck.host(), "newhost");
        assert_eq!(pck.port(), "1522");
        assert_eq!(pck.protocol(), "");
    }

    #[test]
    fn inline_descriptor_address() {
        let body = with_len("(ADDRESS=(PROTOCOL=tcp)(HOST=10.0.0.5)(PORT=1521))");
        let pck = RedirectPacket::parse(&make_redirect(&body, 0)).unwrap();

        assert_eq!(pck.protocol(), "tcp");
        assert_eq!(pck.host(), "10.0.0.5");
        assert_eq!(pck.port(), "1521");
        assert!(pck.reconnect_data.is_empty());
    }

    #[test]
    fn without_flag_the_whole_body_is_the_address() {
        let body = with_len("addr\0ignored");
        let pck = RedirectPacket::parse(&make_redirect(&body, 0)).unwrap();
        assert_eq!(pck.redirect_addr, "addr\0ignored");
    }

    #[test]
    fn split_body_comes_from_follow_up_packet() {
        // declared length covers only header + length field
        let header = PacketHeader::with_flags(PacketType::Redirect, 10, 0x02);
        let packet = Packet::new(header, Bytes::from_static(&[0x00, 0x18]));
        let mut pck = RedirectPacket::parse(&packet).unwrap();

        assert!(pck.needs_body());
        pck.apply_body("otherhost:1523\0extra");
        assert_eq!(pck.host(), "otherhost");
        assert_eq!(pck.port(), "1523");
        assert_eq!(pck.reconnect_data, "extra");
    }
}
