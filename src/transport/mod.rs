//! Transport layer
//!
//! A session owns exactly one live transport: either a plain TCP stream or
//! a TLS stream wrapped around one. TLS is negotiated after dialing, before
//! the CONNECT packet goes out (and again when a RESEND replay requires
//! it).

mod tcp;
pub mod tls;

pub use tcp::dial;
pub use tls::SslMaterials;

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// The session's transport: plain TCP or TLS over TCP
pub enum NetStream {
    /// Plain TCP stream
    Plain(TcpStream),
    /// TLS stream over TCP
    Secure(Box<TlsStream<TcpStream>>),
}

impl NetStream {
    /// Read into `buf`, returning the number of bytes read
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NetStream::Plain(s) => s.read(buf).await,
            NetStream::Secure(s) => s.read(buf).await,
        }
    }

    /// Write all of `buf`
    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            NetStream::Plain(s) => {
                s.write_all(buf).await?;
                s.flush().await
            }
            NetStream::Secure(s) => {
                s.write_all(buf).await?;
                s.flush().await
            }
        }
    }

    /// Shut the transport down
    pub async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            NetStream::Plain(s) => s.shutdown().await,
            NetStream::Secure(s) => s.shutdown().await,
        }
    }

    /// Unwrap back to the raw TCP stream, discarding any TLS state.
    /// Used when TLS must be renegotiated over the same socket.
    pub fn into_tcp(self) -> TcpStream {
        match self {
            NetStream::Plain(s) => s,
            NetStream::Secure(s) => s.into_inner().0,
        }
    }

    /// Whether the transport is TLS-wrapped
    pub fn is_secure(&self) -> bool {
        matches!(self, NetStream::Secure(_))
    }
}

impl std::fmt::Debug for NetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetStream::Plain(_) => f.write_str("NetStream::Plain"),
            NetStream::Secure(_) => f.write_str("NetStream::Secure"),
        }
    }
}
