//! Connection target description
//!
//! A [`ConnectionOption`] names the listener to dial and how to dial it.
//! It is produced by a surrounding DSN/driver layer; the session core only
//! reads it, except for the redirect driver which rewrites the target when
//! the server points the client elsewhere.

use std::fmt;
use std::time::Duration;

/// Default Oracle listener port
pub const DEFAULT_PORT: u16 = 1521;

/// Default TCP dial timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Target descriptor for one session.
///
/// `host`, `port`, `protocol` and `conn_data` are rewritten by the redirect
/// driver when the server issues a REDIRECT; everything else is fixed for
/// the lifetime of the session.
#[derive(Debug, Clone)]
pub struct ConnectionOption {
    /// Listener host
    pub host: String,
    /// Listener port
    pub port: u16,
    /// Protocol tag ("tcp" or "tcps")
    pub protocol: String,
    /// Negotiate TLS after dialing, before the CONNECT packet
    pub ssl: bool,
    /// Verify the server certificate during TLS negotiation
    pub ssl_verify: bool,
    /// Connect descriptor sent in the CONNECT packet and echoed back on
    /// redirect
    pub conn_data: String,
    /// TCP dial timeout
    pub connect_timeout: Duration,
}

impl ConnectionOption {
    /// Create an option record for a plain TCP target
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: "tcp".to_string(),
            ssl: false,
            ssl_verify: true,
            conn_data: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Enable TLS for this target
    pub fn with_ssl(mut self, verify: bool) -> Self {
        self.ssl = true;
        self.ssl_verify = verify;
        self.protocol = "tcps".to_string();
        self
    }

    /// Set the connect descriptor carried in the CONNECT packet
    pub fn with_conn_data(mut self, conn_data: impl Into<String>) -> Self {
        self.conn_data = conn_data.into();
        self
    }

    /// Set the TCP dial timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Socket address string for dialing
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ConnectionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}
