//! Newline-delimited TCP transport built on `tokio::net`.
//!
//! One frame is one line. The trailing `\n` (and an optional `\r` before
//! it) is stripped on receive and appended on send. Bytes left without a
//! terminator when the peer closes are delivered as a last frame.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Largest frame accepted from a peer, excluding the terminator.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const LISTEN_BACKLOG: u32 = 128;

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new transport to the given address with SO_REUSEADDR set,
    /// so a restarted server can reclaim its port immediately.
    pub async fn bind(host: &str) -> Result<Self, TransportError> {
        let addr = tokio::net::lookup_host(host)
            .await
            .map_err(TransportError::AcceptFailed)?
            .next()
            .ok_or_else(|| {
                TransportError::AcceptFailed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no address resolved for {host}"),
                ))
            })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(TransportError::AcceptFailed)?;
        socket
            .set_reuseaddr(true)
            .map_err(TransportError::AcceptFailed)?;
        socket.bind(addr).map_err(TransportError::AcceptFailed)?;
        let listener = socket
            .listen(LISTEN_BACKLOG)
            .map_err(TransportError::AcceptFailed)?;

        tracing::info!(%addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Per-round updates are tiny; don't let Nagle batch them.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %peer, "accepted TCP connection");

        let (read_half, write_half) = stream.into_split();
        Ok(TcpConnection {
            id,
            peer,
            reader: Mutex::new(FrameReader {
                half: BufReader::new(read_half),
                buf: Vec::new(),
            }),
            writer: Mutex::new(write_half),
        })
    }
}

/// A single line-framed TCP connection.
///
/// Reads and writes go through separate halves behind separate locks, so
/// a task parked in `recv` never blocks a `send`.
pub struct TcpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    reader: Mutex<FrameReader>,
    writer: Mutex<OwnedWriteHalf>,
}

impl TcpConnection {
    /// Returns the remote peer's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.extend_from_slice(data);
        frame.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        self.reader.lock().await.next_frame().await
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Buffered read half plus the line received so far.
///
/// `read_until` appends to `buf` as bytes arrive, so a `recv` dropped
/// inside `tokio::select!` loses nothing and the next call picks up the
/// partial line.
struct FrameReader {
    half: BufReader<OwnedReadHalf>,
    buf: Vec<u8>,
}

impl FrameReader {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            if self.buf.last() == Some(&b'\n') {
                let mut frame = std::mem::take(&mut self.buf);
                frame.pop();
                strip_cr(&mut frame);
                return Ok(Some(frame));
            }

            if self.buf.len() > MAX_FRAME_LEN {
                return Err(TransportError::FrameTooLarge {
                    limit: MAX_FRAME_LEN,
                });
            }

            // Never buffer more than one byte past the limit.
            let room = (MAX_FRAME_LEN + 1 - self.buf.len()) as u64;
            let n = (&mut self.half)
                .take(room)
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(TransportError::ReceiveFailed)?;

            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let mut frame = std::mem::take(&mut self.buf);
                strip_cr(&mut frame);
                return Ok(Some(frame));
            }
        }
    }
}

fn strip_cr(frame: &mut Vec<u8>) {
    if frame.last() == Some(&b'\r') {
        frame.pop();
    }
}
