//! CONNECT packet
//!
//! Sent by the client to open the handshake. The body encodes the requested
//! session parameters; the connect descriptor follows at offset 74. A
//! descriptor longer than 230 bytes does not fit the packet: the header then
//! declares `length == data_offset` and the descriptor is flushed as a
//! DATA packet immediately after.
//!
//! Body layout (packet-absolute offsets):
//! ```text
//! Offset | Size | Description
//! -------+------+------------------
//!      8 |    2 | Protocol version (desired)
//!     10 |    2 | Protocol version (minimum)
//!     12 |    2 | Service options
//!     14 |    2 | SDU size (16-bit)
//!     16 |    2 | TDU size (16-bit)
//!     18 |    2 | Protocol characteristics
//!     20 |    2 | Line turnaround (0)
//!     22 |    2 | Value of 1
//!     24 |    2 | Connect data length
//!     26 |    2 | Connect data offset (74)
//!     28 |    4 | Max receivable data (0)
//!     32 |    2 | NSI flags (x2)
//!     34 |   24 | Reserved (zeros)
//!     58 |    4 | SDU size (32-bit)
//!     62 |    4 | TDU size (32-bit)
//!     66 |    4 | Connect flags 1
//!     70 |    4 | Connect flags 2
//!     74 |    n | Connect data (when it fits)
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::ConnectionOption;
use crate::constants::{connect, PacketType};
use crate::context::SessionContext;
use crate::packet::PacketHeader;

/// Outbound CONNECT packet
#[derive(Debug)]
pub struct ConnectPacket {
    /// Declared packet length
    pub length: u32,
    /// Offset of the connect data within the packet
    pub data_offset: u16,
    /// The connect descriptor string
    pub connect_data: String,
    nsi_flags: u8,
    version: u16,
    lo_version: u16,
    options: u16,
    sdu: u32,
    tdu: u32,
}

impl ConnectPacket {
    /// Build a CONNECT packet from the requested context and target
    pub fn new(ctx: &SessionContext, conn_option: &ConnectionOption) -> Self {
        let connect_data = conn_option.conn_data.clone();
        let length = if connect_data.len() > connect::MAX_INLINE_DATA {
            connect::DATA_OFFSET as u32
        } else {
            connect::DATA_OFFSET as u32 + connect_data.len() as u32
        };
        Self {
            length,
            data_offset: connect::DATA_OFFSET,
            connect_data,
            nsi_flags: connect::NSI_SUPPORT_SECURITY_RENEG | connect::NSI_DISABLE_NA,
            version: ctx.version,
            lo_version: ctx.lo_version,
            options: ctx.options,
            sdu: ctx.session_data_unit,
            tdu: ctx.transport_data_unit,
        }
    }

    /// Whether the connect data must be flushed as a follow-up DATA packet
    pub fn data_overflows(&self) -> bool {
        self.length == self.data_offset as u32
    }

    /// Serialize the packet. The CONNECT always precedes the handshake, so
    /// the 16-bit length form is used unconditionally.
    pub fn bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.length as usize);
        let header = PacketHeader::new(PacketType::Connect, self.length);
        header.write(&mut buf, false);

        buf.put_u16(self.version);
        buf.put_u16(self.lo_version);
        buf.put_u16(self.options);
        buf.put_u16(self.sdu.min(0xFFFF) as u16);
        buf.put_u16(self.tdu.min(0xFFFF) as u16);
        buf.put_u16(connect::PROTOCOL_CHARACTERISTICS);
        buf.put_u16(0); // line turnaround
        buf.put_u16(1);
        buf.put_u16(self.connect_data.len() as u16);
        buf.put_u16(self.data_offset);
        buf.put_u32(0); // max receivable data
        buf.put_u8(self.nsi_flags);
        buf.put_u8(self.nsi_flags);
        buf.put_bytes(0, 24);
        buf.put_u32(self.sdu);
        buf.put_u32(self.tdu);
        buf.put_u32(0); // connect flags 1
        buf.put_u32(0); // connect flags 2

        debug_assert_eq!(buf.len(), connect::DATA_OFFSET as usize);
        if !self.data_overflows() {
            buf.put_slice(self.connect_data.as_bytes());
        }
        buf.freeze()
    }
}
