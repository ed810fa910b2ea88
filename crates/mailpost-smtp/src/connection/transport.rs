//! Socket ownership and raw chunk I/O.

use crate::config::TransportMode;
use crate::error::{Error, Result};
use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the single read used for each reply.
///
/// RFC 5321 caps a reply line at 512 octets including CRLF.
pub const READ_CHUNK_SIZE: usize = 512;

/// Owns the socket of one SMTP session.
///
/// The socket is held in an `Option`: `None` before connecting and after
/// closing. Closing is idempotent.
#[derive(Debug)]
pub struct Transport<S> {
    stream: Option<S>,
    mode: TransportMode,
    debug: bool,
    timeout: Option<Duration>,
}

impl<S> Transport<S> {
    /// Creates a transport with no socket.
    #[must_use]
    pub const fn new(debug: bool, timeout: Option<Duration>) -> Self {
        Self {
            stream: None,
            mode: TransportMode::Plain,
            debug,
            timeout,
        }
    }

    /// Takes ownership of a connected socket, replacing any previous one.
    pub fn attach(&mut self, stream: S, mode: TransportMode) {
        self.stream = Some(stream);
        self.mode = mode;
    }

    /// Returns true if a socket is held.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the mode of the current (or last) socket.
    #[must_use]
    pub const fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Returns true if wire traffic should be logged.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Returns the bounded wait applied to each read and write.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads one chunk of at most [`READ_CHUNK_SIZE`] bytes.
    ///
    /// Returns `None` if no socket is held or the peer closed the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or times out.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        let mut buf = BytesMut::zeroed(READ_CHUNK_SIZE);
        let n = with_timeout(self.timeout, stream.read(&mut buf[..])).await?;
        if n == 0 {
            return Ok(None);
        }

        buf.truncate(n);
        Ok(Some(buf.freeze()))
    }

    /// Writes all bytes and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if no socket is held, or the write fails or times out.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::NotConnected);
        };

        with_timeout(self.timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
    }

    /// Shuts down and releases the socket.
    ///
    /// A no-op when no socket is held. The socket is dropped even if the
    /// shutdown fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        let result = with_timeout(self.timeout, stream.shutdown()).await;
        drop(stream);
        result
    }
}

/// Runs an I/O future, bounded by `limit` when set.
async fn with_timeout<T>(
    limit: Option<Duration>,
    future: impl Future<Output = io::Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| Error::Timeout(limit))?
            .map_err(Error::from),
        None => future.await.map_err(Error::from),
    }
}
