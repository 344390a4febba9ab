//! The session: one transport, one logical byte stream
//!
//! A [`Session`] owns the socket (plain or TLS), drives the CONNECT
//! handshake with redirect and refuse handling, frames the stream into TNS
//! packets, and exposes the cursor-style codec (see [`codec`](self)) that
//! higher TTC layers marshal through.
//!
//! One session serves one caller at a time; there is no internal locking.
//! Every packet written since the last buffer reset is retained for RESEND
//! replay, so long exchanges should call [`Session::reset_buffer`] between
//! requests to keep memory bounded.

mod codec;

use std::future::Future;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::config::ConnectionOption;
use crate::constants::{PacketType, DATA_PACKET_OVERHEAD, PACKET_HEADER_SIZE};
use crate::context::SessionContext;
use crate::converters::StringConverter;
use crate::error::{Error, Result};
use crate::packet::{
    AcceptPacket, ConnectPacket, DataPacket, MarkerKind, MarkerPacket, Packet, RedirectPacket,
    RefusePacket, TnsPacket,
};
use crate::summary::Summary;
use crate::transport::{self, NetStream, SslMaterials};

/// Upper bound on server-driven redirect hops for one connect attempt
pub const MAX_REDIRECTS: usize = 10;

/// Retry bound for the packet read loop (RESEND restarts, marker drains)
const READ_TRIALS: usize = 3;

/// A typed structure that knows how to marshal itself through a session.
///
/// Each higher-layer message owns its wire shape; the session only supplies
/// the codec operations.
#[async_trait::async_trait]
pub trait Data: Send {
    /// Serialize this value into the session's out-stream
    async fn write(&self, session: &mut Session) -> Result<()>;
    /// Deserialize this value from the session's in-stream
    async fn read(&mut self, session: &mut Session) -> Result<()>;
}

/// Frozen copy of the session's stream state, restored by
/// [`Session::load_state`]
#[derive(Debug, Clone)]
struct SessionState {
    summary: Option<Summary>,
    send_pcks: Vec<Bytes>,
    in_buffer: Vec<u8>,
    out_buffer: Vec<u8>,
    index: usize,
}

/// A TNS session over one TCP (optionally TLS-wrapped) connection
pub struct Session {
    stream: Option<NetStream>,
    conn_option: ConnectionOption,
    /// Parameters negotiated during the handshake
    pub context: SessionContext,
    send_pcks: Vec<Bytes>,
    pub(crate) in_buffer: Vec<u8>,
    pub(crate) out_buffer: BytesMut,
    pub(crate) index: usize,
    /// Most recent server call summary, if any
    pub summary: Option<Summary>,
    states: Vec<SessionState>,
    /// Character set converter for server text
    pub str_conv: Option<Box<dyn StringConverter>>,
    /// Chunked byte strings use 4-byte compressed chunk lengths
    pub use_big_clr_chunks: bool,
    /// Chunk size for the chunked byte-string form
    pub clr_chunk_size: usize,
    ssl: SslMaterials,
}

impl Session {
    /// Create a detached session for the given target
    pub fn new(conn_option: ConnectionOption) -> Self {
        let context = SessionContext::new(&conn_option);
        Self {
            stream: None,
            conn_option,
            context,
            send_pcks: Vec::new(),
            in_buffer: Vec::new(),
            out_buffer: BytesMut::new(),
            index: 0,
            summary: None,
            states: Vec::new(),
            str_conv: None,
            use_big_clr_chunks: false,
            clr_chunk_size: crate::constants::clr::DEFAULT_CHUNK_SIZE,
            ssl: SslMaterials::default(),
        }
    }

    /// The current connection target (rewritten by redirects)
    pub fn conn_option(&self) -> &ConnectionOption {
        &self.conn_option
    }

    /// Whether the session currently holds a transport
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    // =========================================================================
    // Handshake driver
    // =========================================================================

    /// Dial the target and drive the CONNECT handshake, following server
    /// redirects until an ACCEPT or a refusal.
    pub async fn connect(&mut self) -> Result<()> {
        let mut redirects = 0;
        loop {
            self.disconnect().await;
            // a reused session negotiates from scratch
            self.context.handshake_complete = false;
            debug!(peer = %self.conn_option, "connect");

            let tcp = transport::dial(&self.conn_option).await?;
            self.stream = Some(NetStream::Plain(tcp));
            if self.conn_option.ssl {
                debug!("using SSL/TLS");
                self.negotiate().await?;
            }

            let connect_pck = ConnectPacket::new(&self.context, &self.conn_option);
            let overflow = connect_pck.data_overflows();
            let connect_data = connect_pck.connect_data.clone();
            self.write_packet(connect_pck.bytes()).await?;
            if overflow {
                self.put_bytes(connect_data.as_bytes());
                self.write().await?;
            }

            match self.read_packet().await? {
                Some(TnsPacket::Accept(accept)) => {
                    accept.apply(&mut self.context);
                    self.context.handshake_complete = true;
                    debug!(version = self.context.version, "handshake complete");
                    return Ok(());
                }
                Some(TnsPacket::Redirect(redirect)) => {
                    redirects += 1;
                    if redirects > MAX_REDIRECTS {
                        return Err(Error::TooManyRedirects(MAX_REDIRECTS));
                    }
                    debug!(addr = %redirect.redirect_addr, "redirect");
                    self.conn_option.conn_data = redirect.reconnect_data.clone();
                    let protocol = redirect.protocol();
                    if !protocol.is_empty() {
                        self.conn_option.protocol = protocol;
                    }
                    let host = redirect.host();
                    if !host.is_empty() {
                        self.conn_option.host = host;
                    }
                    let port = redirect.port();
                    if !port.is_empty() {
                        self.conn_option.port = port
                            .parse()
                            .map_err(|_| Error::InvalidRedirectPort(port.clone()))?;
                    }
                }
                Some(TnsPacket::Refuse(refuse)) => return Err(refuse.into_error()),
                _ => return Err(Error::Refused),
            }
        }
    }

    /// Tear the transport down. Safe to call repeatedly and on a session
    /// that never connected; the session may be reconnected afterwards.
    pub async fn disconnect(&mut self) {
        self.reset_buffer();
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
    }

    /// Clear all stream state: summary, replay list, both buffers, cursor
    pub fn reset_buffer(&mut self) {
        self.summary = None;
        self.send_pcks.clear();
        self.in_buffer.clear();
        self.out_buffer.clear();
        self.index = 0;
    }

    // =========================================================================
    // Logical stream I/O
    // =========================================================================

    /// Flush the out-stream: segment it into DATA packets of at most
    /// `SessionDataUnit - 20` bytes and write them in order. An empty
    /// buffer still produces one empty DATA packet. The buffer is consumed
    /// on success; on a mid-stream failure it is reset and the session
    /// must be reconnected.
    pub async fn write(&mut self) -> Result<()> {
        let large = self.context.uses_large_length();
        let data = self.out_buffer.split().freeze();
        if data.is_empty() {
            let raw = DataPacket::new(Bytes::new()).bytes(large);
            return self.write_packet(raw).await;
        }

        let segment = self
            .context
            .session_data_unit
            .saturating_sub(DATA_PACKET_OVERHEAD)
            .max(1) as usize;
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + segment).min(data.len());
            let raw = DataPacket::new(data.slice(offset..end)).bytes(large);
            if let Err(err) = self.write_packet(raw).await {
                self.out_buffer.clear();
                return Err(err);
            }
            offset = end;
        }
        Ok(())
    }

    /// Read `n` bytes from the logical in-stream. When the in-buffer runs
    /// short, exactly one DATA packet is pulled from the wire first.
    pub(crate) async fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.index + n > self.in_buffer.len() {
            match self.read_packet().await? {
                Some(TnsPacket::Data(data)) => self.in_buffer.extend_from_slice(&data.payload),
                Some(_) | None => return Err(Error::NonDataPacket),
            }
        }
        if self.index + n > self.in_buffer.len() {
            return Err(Error::BufferUnderflow {
                needed: n,
                available: self.in_buffer.len() - self.index,
            });
        }
        let ret = self.in_buffer[self.index..self.index + n].to_vec();
        self.index += n;
        Ok(ret)
    }

    // =========================================================================
    // Packet I/O
    // =========================================================================

    /// Serialize-and-send: the packet joins the replay list before the
    /// write so a RESEND arriving mid-write still sees it.
    pub async fn write_packet(&mut self, raw: Bytes) -> Result<()> {
        self.send_pcks.push(raw.clone());
        trace!(len = raw.len(), packet_type = raw[4], "write packet");
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        stream.write_all(&raw).await.map_err(Error::Io)
    }

    /// Read one framed packet, absorbing RESEND requests by replaying the
    /// send list.
    async fn read_packet_raw(&mut self) -> Result<Bytes> {
        let mut trials = 0;
        loop {
            if trials >= READ_TRIALS {
                return Err(Error::AbnormalResponse);
            }
            trials += 1;

            let mut head = [0u8; PACKET_HEADER_SIZE];
            self.read_stream_exact(&mut head).await?;

            let declared = if self.context.uses_large_length() {
                u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize
            } else {
                u16::from_be_bytes([head[0], head[1]]) as usize
            };
            if declared < PACKET_HEADER_SIZE {
                return Err(Error::PacketTooShort {
                    expected: PACKET_HEADER_SIZE,
                    actual: declared,
                });
            }
            let mut body = vec![0u8; declared - PACKET_HEADER_SIZE];
            self.read_stream_exact(&mut body).await?;

            if head[4] == PacketType::Resend as u8 {
                trace!(pending = self.send_pcks.len(), "resend requested");
                if self.conn_option.ssl {
                    self.negotiate().await?;
                }
                let pcks = self.send_pcks.clone();
                let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
                for pck in &pcks {
                    stream.write_all(pck).await.map_err(Error::Io)?;
                }
                continue;
            }

            let mut raw = BytesMut::with_capacity(declared);
            raw.extend_from_slice(&head);
            raw.extend_from_slice(&body);
            trace!(len = declared, packet_type = head[4], "read packet");
            return Ok(raw.freeze());
        }
    }

    /// Read and classify one packet.
    ///
    /// Returns `None` when a MARKER sequence was fully absorbed into
    /// session state (buffers reset, acknowledgement sent, any error
    /// stream parsed into [`Session::summary`]). A summary with a non-zero
    /// return code surfaces as [`Error::OracleError`]; the session stays
    /// usable afterwards.
    pub async fn read_packet(&mut self) -> Result<Option<TnsPacket>> {
        let raw = self.read_packet_raw().await?;
        let large = self.context.uses_large_length();
        let packet = Packet::from_bytes(raw, large)?;

        match packet.packet_type() {
            PacketType::Accept => Ok(Some(TnsPacket::Accept(AcceptPacket::parse(&packet)?))),
            PacketType::Refuse => Ok(Some(TnsPacket::Refuse(RefusePacket::parse(&packet)?))),
            PacketType::Redirect => {
                let mut redirect = RedirectPacket::parse(&packet)?;
                if redirect.needs_body() {
                    let raw = self.read_packet_raw().await?;
                    let follow = Packet::from_bytes(raw, large)?;
                    let data = DataPacket::parse(&follow)?;
                    redirect.apply_body(&String::from_utf8_lossy(&data.payload));
                }
                Ok(Some(TnsPacket::Redirect(redirect)))
            }
            PacketType::Data => Ok(Some(TnsPacket::Data(DataPacket::parse(&packet)?))),
            PacketType::Marker => {
                let marker = MarkerPacket::parse(&packet)?;
                self.handle_marker(marker).await?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Drain a break/reset marker sequence and re-synchronize the stream.
    ///
    /// Boxed because parsing the error report recurses through the codec
    /// back into the packet reader.
    fn handle_marker<'a>(
        &'a mut self,
        first: MarkerPacket,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let large = self.context.uses_large_length();

            let mut kind = first.kind()?;
            let mut trials = 1;
            while kind == MarkerKind::Break {
                if trials > READ_TRIALS {
                    return Err(Error::ConnectionBreak);
                }
                let raw = self.read_packet_raw().await?;
                let packet = Packet::from_bytes(raw, large)?;
                let marker = MarkerPacket::parse(&packet).map_err(|_| Error::ConnectionBreak)?;
                kind = marker.kind()?;
                trials += 1;
            }

            self.reset_buffer();
            self.write_packet(MarkerPacket::reset_ack().bytes(large)).await?;
            if let Some(hash) = self.context.advanced_service.hash_algo.as_mut() {
                hash.init()?;
            }

            // the server now restarts the stream with an error report
            let raw = self.read_packet_raw().await?;
            let packet = Packet::from_bytes(raw, large)?;
            let data = DataPacket::parse(&packet)?;
            self.in_buffer = data.payload.to_vec();
            self.index = 0;

            let msg = self.get_byte().await?;
            if msg == 4 {
                let summary = Summary::read(self).await?;
                self.summary = Some(summary);
                if self.has_error() {
                    return Err(self.get_error());
                }
            }
            Ok(())
        })
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Push a deep copy of the stream state (summary, replay list, both
    /// buffers, cursor) so a speculative read can be undone.
    pub fn save_state(&mut self) {
        self.states.push(SessionState {
            summary: self.summary.clone(),
            send_pcks: self.send_pcks.clone(),
            in_buffer: self.in_buffer.clone(),
            out_buffer: self.out_buffer.to_vec(),
            index: self.index,
        });
    }

    /// Pop the most recent snapshot back into the live fields. A no-op on
    /// an empty stack. Socket state is not restored.
    pub fn load_state(&mut self) {
        if let Some(state) = self.states.pop() {
            self.summary = state.summary;
            self.send_pcks = state.send_pcks;
            self.in_buffer = state.in_buffer;
            self.out_buffer.clear();
            self.out_buffer.extend_from_slice(&state.out_buffer);
            self.index = state.index;
        }
    }

    // =========================================================================
    // Server error reporting
    // =========================================================================

    /// Whether the most recent summary carries a non-zero return code
    pub fn has_error(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.ret_code != 0)
    }

    /// The most recent server error, decoded with the session's string
    /// converter when one is configured
    pub fn get_error(&self) -> Error {
        match &self.summary {
            Some(summary) if summary.ret_code != 0 => {
                let message = match &self.str_conv {
                    Some(conv) => conv.decode(&summary.error_message),
                    None => String::from_utf8_lossy(&summary.error_message).into_owned(),
                };
                Error::OracleError {
                    code: summary.ret_code,
                    message,
                }
            }
            _ => Error::OracleError {
                code: 0,
                message: String::new(),
            },
        }
    }

    // =========================================================================
    // TLS
    // =========================================================================

    /// Ingest raw DER certificates, PKCS#1 private keys and certificate
    /// requests for the TLS pathway
    pub fn load_ssl_data(
        &mut self,
        certs: &[Vec<u8>],
        keys: &[Vec<u8>],
        cert_requests: &[Vec<u8>],
    ) -> Result<()> {
        self.ssl.load_ssl_data(certs, keys, cert_requests)
    }

    /// Wrap the live socket in a TLS client session. Re-invoked on RESEND
    /// replay, in which case the existing TLS state is discarded and the
    /// handshake runs again over the raw socket.
    async fn negotiate(&mut self) -> Result<()> {
        let stream = self.stream.take().ok_or(Error::ConnectionClosed)?;
        let tcp = stream.into_tcp();
        let host = self.conn_option.host.clone();
        let verify = self.conn_option.ssl_verify;
        let tls = self.ssl.negotiate(tcp, &host, verify).await?;
        self.stream = Some(NetStream::Secure(Box::new(tls)));
        Ok(())
    }

    // =========================================================================
    // Capability seams
    // =========================================================================

    /// Marshal a typed structure into the out-stream
    pub async fn put_data<D: Data + ?Sized>(&mut self, data: &D) -> Result<()> {
        data.write(self).await
    }

    /// Unmarshal a typed structure from the in-stream
    pub async fn get_data<D: Data + ?Sized>(&mut self, data: &mut D) -> Result<()> {
        data.read(self).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Fill `buf` completely from the transport. Partial reads continue
    /// the loop; a zero-byte read means the peer went away.
    async fn read_stream_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = stream.read(&mut buf[filled..]).await.map_err(Error::Io)?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            filled += n;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn seed_in_buffer(&mut self, data: Vec<u8>) {
        self.in_buffer = data;
        self.index = 0;
    }

    #[cfg(test)]
    pub(crate) fn out_bytes(&self) -> &[u8] {
        &self.out_buffer
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.conn_option.socket_addr())
            .field("connected", &self.stream.is_some())
            .field("handshake_complete", &self.context.handshake_complete)
            .field("in_buffer", &self.in_buffer.len())
            .field("index", &self.index)
            .field("out_buffer", &self.out_buffer.len())
            .field("send_pcks", &self.send_pcks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::new(ConnectionOption::new("localhost", 1521))
    }

    #[tokio::test]
    async fn snapshot_restore_is_deep() {
        let mut session = test_session();
        session.seed_in_buffer(vec![1, 2, 3, 4]);
        session.put_bytes(b"out");
        session.index = 2;

        session.save_state();

        session.put_bytes(b"more");
        session.in_buffer.extend_from_slice(&[9, 9]);
        session.index = 5;
        session.summary = Some(Summary {
            ret_code: 1,
            ..Default::default()
        });

        session.load_state();
        assert_eq!(session.in_buffer, vec![1, 2, 3, 4]);
        assert_eq!(session.out_bytes(), b"out");
        assert_eq!(session.index, 2);
        assert!(session.summary.is_none());
    }

    #[tokio::test]
    async fn load_state_on_empty_stack_is_noop() {
        let mut session = test_session();
        session.put_bytes(b"data");
        session.load_state();
        assert_eq!(session.out_bytes(), b"data");
    }

    #[tokio::test]
    async fn reset_buffer_clears_everything() {
        let mut session = test_session();
        session.seed_in_buffer(vec![1, 2, 3]);
        session.index = 1;
        session.put_bytes(b"pending");
        session.summary = Some(Summary::default());
        session.send_pcks.push(Bytes::from_static(b"pck"));

        session.reset_buffer();
        assert!(session.in_buffer.is_empty());
        assert!(session.out_bytes().is_empty());
        assert_eq!(session.index, 0);
        assert!(session.summary.is_none());
        assert!(session.send_pcks.is_empty());
    }

    #[tokio::test]
    async fn disconnect_is_idempotent_on_detached_session() {
        let mut session = test_session();
        session.disconnect().await;
        session.disconnect().await;
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn get_error_without_summary_is_empty() {
        let session = test_session();
        assert!(!session.has_error());
        match session.get_error() {
            Error::OracleError { code, message } => {
                assert_eq!(code, 0);
                assert!(message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn get_error_decodes_with_converter() {
        use crate::converters::AsciiConverter;

        let mut session = test_session();
        session.str_conv = Some(Box::new(AsciiConverter));
        session.summary = Some(Summary {
            ret_code: 1017,
            error_message: b"ORA-01017: invalid username/password".to_vec(),
            ..Default::default()
        });
        assert!(session.has_error());
        match session.get_error() {
            Error::OracleError { code, message } => {
                assert_eq!(code, 1017);
                assert!(message.contains("invalid username"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
