//! SMTP session: connect and log in, send messages, close.

use crate::auth::authenticate;
use crate::config::{ClientOptions, ConnectOptions, TransportMode};
use crate::connection::{self, CommandChannel, SmtpStream, Transport};
use crate::error::{Error, Result};
use crate::send::send_message;
use crate::types::Reply;
use mailpost_mime::{Message, MessageComposer};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Where a session is in its lifecycle.
///
/// ```text
/// Unconnected ── connect ──→ Connected ── handshake ──→ Authenticated
///                                                        │      ↑
///                                                      send   done
///                                                        ↓      │
///                                              TransactionInProgress
/// any failure or close ──→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connection has been made.
    #[default]
    Unconnected,
    /// Socket open, handshake not finished.
    Connected,
    /// Logged in and idle.
    Authenticated,
    /// A message is being sent.
    TransactionInProgress,
    /// Socket released.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconnected => "unconnected",
            Self::Connected => "connected",
            Self::Authenticated => "authenticated",
            Self::TransactionInProgress => "transaction in progress",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// SMTP client session.
///
/// Every operation takes `&mut self`, so at most one transaction is in
/// flight. Failures during connect or send close the connection before the
/// error is returned, except for invalid addresses and header values, which
/// are rejected before anything is written.
#[derive(Debug)]
pub struct SmtpClient<S = SmtpStream> {
    channel: CommandChannel<S>,
    options: ClientOptions,
    state: SessionState,
}

impl<S> SmtpClient<S> {
    /// Creates an unconnected client.
    #[must_use]
    pub const fn new(options: ClientOptions) -> Self {
        Self {
            channel: CommandChannel::new(Transport::new(options.debug, options.timeout)),
            options,
            state: SessionState::Unconnected,
        }
    }

    /// Returns the session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the options fixed at construction.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Returns true while a socket is held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.channel.transport().is_open()
    }

    fn ensure_can_connect(&self) -> Result<()> {
        match self.state {
            SessionState::Unconnected | SessionState::Closed => Ok(()),
            state => Err(Error::InvalidState(format!("cannot connect while {state}"))),
        }
    }
}

impl SmtpClient<SmtpStream> {
    /// Connects over plain TCP and logs in.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the handshake fails.
    pub async fn connect(&mut self, options: &ConnectOptions) -> Result<()> {
        self.connect_with(TransportMode::Plain, options).await
    }

    /// Connects over implicit TLS and logs in.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, the TLS handshake or the login
    /// fails.
    pub async fn connect_tls(&mut self, options: &ConnectOptions) -> Result<()> {
        self.connect_with(TransportMode::Encrypted, options).await
    }

    /// Connects in the given mode and logs in.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the handshake fails.
    pub async fn connect_with(&mut self, mode: TransportMode, options: &ConnectOptions) -> Result<()> {
        self.ensure_can_connect()?;

        let port = options.port_for(mode);
        let timeout = self.options.timeout;
        let stream = match mode {
            TransportMode::Plain => bounded(timeout, connection::connect(&options.hostname, port)).await?,
            TransportMode::Encrypted => {
                bounded(
                    timeout,
                    connection::connect_tls(&options.hostname, port, options.cert_file.as_deref()),
                )
                .await?
            }
        };

        self.connect_stream(stream, mode, options).await
    }
}

impl<S> SmtpClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs the handshake over an already connected stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails; the stream is closed first.
    pub async fn connect_stream(
        &mut self,
        stream: S,
        mode: TransportMode,
        options: &ConnectOptions,
    ) -> Result<()> {
        self.ensure_can_connect()?;

        self.channel.transport_mut().attach(stream, mode);
        self.state = SessionState::Connected;
        tracing::debug!(host = %options.hostname, ?mode, "Connected");

        if let Err(e) = authenticate(&mut self.channel, options).await {
            self.abort().await;
            return Err(e);
        }

        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless logged in, [`Error::Mime`] for
    /// an invalid address or header value (the session stays usable), or the
    /// transport or protocol error that ended the session.
    pub async fn send(&mut self, message: &Message) -> Result<Reply> {
        if self.state != SessionState::Authenticated {
            return Err(Error::InvalidState(format!(
                "cannot send while {}",
                self.state
            )));
        }

        let composer = MessageComposer::new(self.options.encoding);
        self.state = SessionState::TransactionInProgress;

        match send_message(&mut self.channel, &composer, message).await {
            Ok(reply) => {
                self.state = SessionState::Authenticated;
                Ok(reply)
            }
            Err(e @ Error::Mime(_)) => {
                self.state = SessionState::Authenticated;
                Err(e)
            }
            Err(e) => {
                self.abort().await;
                Err(e)
            }
        }
    }

    /// Releases the connection.
    ///
    /// Safe to call at any time and any number of times.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails; the socket is released anyway.
    pub async fn close(&mut self) -> Result<()> {
        let result = self.channel.close().await;
        if self.state != SessionState::Unconnected {
            self.state = SessionState::Closed;
        }
        result
    }

    async fn abort(&mut self) {
        if let Err(e) = self.channel.close().await {
            tracing::warn!(error = %e, "Failed to shut down connection");
        }
        self.state = SessionState::Closed;
    }
}

/// Connects, logs in, sends one message and closes.
///
/// The connection is closed on every path.
///
/// # Errors
///
/// Returns the first error from connecting or sending, otherwise an error
/// from closing.
pub async fn send_mail(
    mode: TransportMode,
    options: &ConnectOptions,
    client_options: ClientOptions,
    message: &Message,
) -> Result<Reply> {
    let mut client = SmtpClient::new(client_options);

    let result = async {
        client.connect_with(mode, options).await?;
        client.send(message).await
    }
    .await;

    let closed = client.close().await;
    let reply = result?;
    closed?;
    Ok(reply)
}

async fn bounded<T>(limit: Option<Duration>, future: impl Future<Output = Result<T>>) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => future.await,
    }
}
