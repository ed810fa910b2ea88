//! One command line out, one reply in.

use super::Transport;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::parse_reply;
use crate::types::{Reply, ReplyCode};
use tokio::io::{AsyncRead, AsyncWrite};

/// Command/reply channel over a [`Transport`].
///
/// Writes and reads are not paired here; [`CommandChannel::execute`] does a
/// write followed by exactly one read. A reply is expected to arrive in a
/// single read.
#[derive(Debug)]
pub struct CommandChannel<S> {
    transport: Transport<S>,
}

impl<S> CommandChannel<S> {
    /// Creates a channel over a transport.
    #[must_use]
    pub const fn new(transport: Transport<S>) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &Transport<S> {
        &self.transport
    }

    /// Returns the underlying transport mutably.
    pub const fn transport_mut(&mut self) -> &mut Transport<S> {
        &mut self.transport
    }
}

impl<S> CommandChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Writes one command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_command(&mut self, command: &Command) -> Result<()> {
        if self.transport.debug() {
            tracing::debug!(%command, "C:");
        }
        self.transport.write(&command.serialize()).await
    }

    /// Writes raw message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_data(&mut self, data: &[u8]) -> Result<()> {
        if self.transport.debug() {
            tracing::debug!(bytes = data.len(), "C: <message data>");
        }
        self.transport.write(data).await
    }

    /// Reads and parses one reply.
    ///
    /// Returns `None` if the connection is closed or absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the reply is malformed.
    pub async fn read_reply(&mut self) -> Result<Option<Reply>> {
        let Some(chunk) = self.transport.read_chunk().await? else {
            if self.transport.debug() {
                tracing::debug!("S: <end of stream>");
            }
            return Ok(None);
        };

        let reply = parse_reply(&chunk)?;
        if self.transport.debug() {
            if let Some(reply) = &reply {
                tracing::debug!(code = %reply.code, message = %reply.message, "S:");
            }
        }
        Ok(reply)
    }

    /// Reads one reply and checks its code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedReply`] on a different code and
    /// [`Error::NoReply`] if the connection yielded nothing.
    pub async fn expect(&mut self, expected: ReplyCode) -> Result<Reply> {
        match self.read_reply().await? {
            None => Err(Error::NoReply { expected }),
            Some(reply) if reply.code == expected => Ok(reply),
            Some(reply) => Err(Error::UnexpectedReply {
                expected,
                actual: reply.code,
                message: reply.message,
            }),
        }
    }

    /// Writes a command and checks the reply against the code it expects.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the reply does not match.
    pub async fn execute(&mut self, command: &Command) -> Result<Reply> {
        self.write_command(command).await?;
        self.expect(command.expected_reply()).await
    }

    /// Closes the underlying transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}
