//! The TCP connection to the printer.

use std::{
    future::Future,
    net::{SocketAddr, SocketAddrV4},
    path::Path,
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::{
    error::{Error, Result},
    transport::{Transport, DEFAULT_RECEIVE_SIZE},
};

/// The port label printers listen on.
pub const DEFAULT_PORT: u16 = 9100;

/// Timeouts applied at each stage of the connection's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Resolving the host and establishing the TCP connection.
    pub connect: Duration,
    /// Draining the banner right after connecting.
    pub flush: Duration,
    /// Ordinary request/response exchanges.
    pub standard: Duration,
    /// Replies that may take a while, e.g. while a label is printing.
    pub long: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(3),
            flush: Duration::from_secs(1),
            standard: Duration::from_secs(5),
            long: Duration::from_secs(30),
        }
    }
}

/// A raw TCP connection to the printer.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    addr: SocketAddrV4,
    timeouts: Timeouts,
}

impl Connection {
    /// Connect to `host:port` with the default timeouts.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with(host, port, Timeouts::default()).await
    }

    /// Connect to `host:port`, resolving the host to an IPv4 address first.
    ///
    /// Any banner the printer pushes right after the connection is
    /// established is discarded.
    pub async fn connect_with(host: &str, port: u16, timeouts: Timeouts) -> Result<Self> {
        let addr = resolve_ipv4(host, port, timeouts.connect).await?;
        tracing::debug!(host, %addr, "connecting to printer");

        let stream = connect_within(host, port, timeouts.connect, TcpStream::connect(addr)).await?;

        tracing::info!(host, %addr, "connected to printer");

        let mut connection = Self {
            stream,
            addr,
            timeouts,
        };
        connection.flush().await;

        Ok(connection)
    }

    /// The address we are connected to.
    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    /// Discard whatever the printer sent unprompted. Best effort: a timeout
    /// or read error is not a failure.
    pub async fn flush(&mut self) {
        let mut buf = vec![0u8; DEFAULT_RECEIVE_SIZE];
        match tokio::time::timeout(self.timeouts.flush, self.stream.read(&mut buf)).await {
            Ok(Ok(n)) => tracing::debug!(bytes = n, "flushed banner"),
            Ok(Err(err)) => tracing::debug!(error = %err, "ignoring error while flushing"),
            Err(_) => tracing::trace!("nothing to flush"),
        }
    }
}

impl Transport for Connection {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        tracing::trace!(bytes = data.len(), "sending");
        tokio::time::timeout(self.timeouts.standard, self.stream.write_all(data))
            .await
            .map_err(|_| timed_out("sending", self.timeouts.standard))??;
        Ok(())
    }

    async fn send_file(&mut self, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::open(path).await?;
        let sent = tokio::time::timeout(self.timeouts.long, async {
            let sent = tokio::io::copy(&mut file, &mut self.stream).await?;
            self.stream.flush().await?;
            Ok::<_, std::io::Error>(sent)
        })
        .await
        .map_err(|_| timed_out("streaming the image", self.timeouts.long))??;
        tracing::debug!(path = %path.display(), bytes = sent, "streamed file");
        Ok(sent)
    }

    async fn receive(&mut self, long_timeout: bool, max_bytes: usize) -> Result<Vec<u8>> {
        let timeout = if long_timeout {
            self.timeouts.long
        } else {
            self.timeouts.standard
        };

        let mut buf = vec![0u8; max_bytes.min(DEFAULT_RECEIVE_SIZE)];
        let n = tokio::time::timeout(timeout, self.stream.read(&mut buf))
            .await
            .map_err(|_| timed_out("waiting for a reply", timeout))??;
        buf.truncate(n);

        tracing::trace!(bytes = n, long_timeout, "received");
        Ok(buf)
    }

    async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Await `connect` under `timeout`, mapping failures to connection errors.
async fn connect_within<S>(
    host: &str,
    port: u16,
    timeout: Duration,
    connect: impl Future<Output = std::io::Result<S>>,
) -> Result<S> {
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::ConnectionRefused => Err(Error::ConnectRefused {
            host: host.to_string(),
            port,
        }),
        Ok(Err(err)) => Err(Error::Connect {
            host: host.to_string(),
            port,
            source: err,
        }),
        Err(_) => Err(Error::ConnectTimeout {
            host: host.to_string(),
            port,
            timeout,
        }),
    }
}

fn timed_out(what: &str, timeout: Duration) -> Error {
    Error::Transport(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!(
            "timed out after {} seconds {what}; check that the printer is powered on and reachable",
            timeout.as_secs()
        ),
    ))
}

/// Resolve `host` to its first IPv4 address. The printer protocol does not
/// work over IPv6.
async fn resolve_ipv4(host: &str, port: u16, timeout: Duration) -> Result<SocketAddrV4> {
    let resolved = tokio::time::timeout(timeout, tokio::net::lookup_host((host, port)))
        .await
        .map_err(|_| Error::Resolution {
            host: host.to_string(),
            reason: format!("lookup timed out after {} seconds", timeout.as_secs()),
            hint: String::new(),
        })?;

    let addrs: Vec<SocketAddr> = match resolved {
        Ok(addrs) => addrs.collect(),
        Err(err) => {
            return Err(Error::Resolution {
                host: host.to_string(),
                reason: err.to_string(),
                hint: String::new(),
            });
        }
    };

    if let Some(addr) = addrs.iter().find_map(|addr| match addr {
        SocketAddr::V4(v4) => Some(*v4),
        SocketAddr::V6(_) => None,
    }) {
        return Ok(addr);
    }

    let hint = if addrs.is_empty() {
        String::new()
    } else {
        "\nNote: The hostname resolves to IPv6 but not IPv4.\n\
         The printer may only have an IPv6 address, or IPv4 may be disabled."
            .to_string()
    };

    Err(Error::Resolution {
        host: host.to_string(),
        reason: "no IPv4 address found".to_string(),
        hint,
    })
}
