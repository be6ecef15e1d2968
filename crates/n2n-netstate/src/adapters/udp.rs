//! Management port transport over UDP.
//!
//! The daemon answers one command datagram with any number of response
//! datagrams and no terminator. The response ends when nothing arrives
//! within the read deadline: `first_read_timeout` for the first datagram,
//! `read_timeout` after each one. The whole session is capped by
//! `session_timeout`.

use crate::domain::config::MgmtConfig;
use crate::domain::errors::MgmtError;
use crate::ports::ControlTransport;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::trace;

pub struct UdpControlTransport {
    addr: String,
    first_read_timeout: Duration,
    read_timeout: Duration,
    session_timeout: Duration,
    buffer_size: usize,
}

impl UdpControlTransport {
    pub fn new(config: &MgmtConfig) -> Self {
        Self {
            addr: config.addr.clone(),
            first_read_timeout: config.first_read_timeout,
            read_timeout: config.read_timeout,
            session_timeout: config.session_timeout,
            buffer_size: config.buffer_size,
        }
    }

    async fn resolve(&self) -> Result<SocketAddr, MgmtError> {
        let invalid = |reason: String| MgmtError::InvalidAddress {
            addr: self.addr.clone(),
            reason,
        };
        tokio::net::lookup_host(&self.addr)
            .await
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("no address".to_string()))
    }

    async fn session(&self, command: &str) -> Result<String, MgmtError> {
        let target = self.resolve().await?;
        let bind = if target.is_ipv4() {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
        } else {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
        };

        let socket = UdpSocket::bind(bind).await.map_err(MgmtError::Connect)?;
        socket.connect(target).await.map_err(MgmtError::Connect)?;
        socket
            .send(command.as_bytes())
            .await
            .map_err(MgmtError::Send)?;

        let mut buffer = vec![0u8; self.buffer_size];
        let mut response = Vec::new();
        let mut deadline = self.first_read_timeout;
        let mut datagrams = 0usize;

        loop {
            match timeout(deadline, socket.recv(&mut buffer)).await {
                // silence ends the response
                Err(_) => break,
                Ok(Ok(n)) => {
                    response.extend_from_slice(&buffer[..n]);
                    datagrams += 1;
                    deadline = self.read_timeout;
                }
                Ok(Err(e)) => return Err(MgmtError::Receive(e)),
            }
        }

        trace!(target_addr = %target, datagrams, bytes = response.len(), "Management response collected");
        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}

#[async_trait]
impl ControlTransport for UdpControlTransport {
    async fn exchange(&self, command: &str) -> Result<String, MgmtError> {
        timeout(self.session_timeout, self.session(command))
            .await
            .map_err(|_| MgmtError::Timeout(self.session_timeout))?
    }
}
