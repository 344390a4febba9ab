//! TCP dialer

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::ConnectionOption;
use crate::error::{Error, Result};

/// Dial the listener named by `conn_option`
pub async fn dial(conn_option: &ConnectionOption) -> Result<TcpStream> {
    let addr = conn_option.socket_addr();
    let stream = timeout(conn_option.connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| Error::ConnectionTimeout(conn_option.connect_timeout))?
        .map_err(Error::Io)?;

    stream.set_nodelay(true).map_err(Error::Io)?;
    Ok(stream)
}
