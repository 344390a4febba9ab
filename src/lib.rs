#![warn(missing_docs)]

//! # oracle-net
//!
//! Session and transport core for the Oracle TNS (Transparent Network
//! Substrate) protocol, in pure Rust. No OCI or ODPI-C dependencies.
//!
//! This crate covers the bottom of an Oracle client stack: it dials the
//! listener (TCP, optionally TLS-wrapped after a plaintext preface),
//! drives the CONNECT handshake with redirect and refuse handling, frames
//! the byte stream into TNS packets, and exposes a cursor-style
//! reader/writer over a logical in/out byte stream. Higher TTC (Two-Task
//! Common) layers such as authentication, statement execution and row
//! decoding marshal themselves through the [`session::Data`] capability
//! and are out of scope here.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use oracle_net::{ConnectionOption, Session};
//!
//! # async fn example() -> oracle_net::Result<()> {
//! let option = ConnectionOption::new("dbhost", 1521)
//!     .with_conn_data("(DESCRIPTION=(CONNECT_DATA=(SERVICE_NAME=ORCL)))");
//!
//! let mut session = Session::new(option);
//! session.connect().await?;
//!
//! // write a request through the codec and flush it as DATA packets
//! session.put_byte(0x11);
//! session.put_uint(42, 4, true, true);
//! session.write().await?;
//!
//! // read the reply off the logical in-stream
//! let message_type = session.get_byte().await?;
//! # let _ = message_type;
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## TLS
//!
//! For `tcps` targets the socket is wrapped in a TLS client session after
//! dialing and before the CONNECT packet. Client identity and trust
//! anchors are loaded from raw DER material with
//! [`Session::load_ssl_data`]; a wallet layer above this crate supplies
//! those bytes.
//!
//! ## Concurrency
//!
//! A session is a single-caller object: operations are sequential, there
//! is no internal locking, and cancellation happens by dropping the
//! session (closing the socket). Callers that share a session across
//! tasks must serialize access themselves.

pub mod config;
pub mod constants;
pub mod context;
pub mod converters;
pub mod error;
pub mod packet;
pub mod session;
pub mod summary;
pub mod transport;

pub use config::ConnectionOption;
pub use context::{AdvancedService, HashAlgo, SessionContext};
pub use converters::StringConverter;
pub use error::{Error, Result};
pub use packet::{
    AcceptPacket, ConnectPacket, DataPacket, MarkerKind, MarkerPacket, Packet, PacketHeader,
    RedirectPacket, RefusePacket, TnsPacket,
};
pub use session::{Data, Session};
pub use summary::Summary;
pub use transport::{NetStream, SslMaterials};
