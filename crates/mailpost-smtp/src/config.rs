//! Session configuration types.

use mailpost_mime::TransferEncoding;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Port used for plain connections when none is configured.
pub const DEFAULT_PORT: u16 = 25;

/// Port used for implicit TLS connections when none is configured.
pub const DEFAULT_TLS_PORT: u16 = 465;

/// Whether the socket is wrapped with TLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransportMode {
    /// Plain TCP (port 25).
    #[default]
    Plain,
    /// TLS from the first byte (port 465).
    Encrypted,
}

impl TransportMode {
    /// Returns the default port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => DEFAULT_PORT,
            Self::Encrypted => DEFAULT_TLS_PORT,
        }
    }
}

/// Where to connect and how to log in.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectOptions {
    /// Server hostname. Also sent in `HELO` unless `helo_name` is set.
    pub hostname: String,
    /// Server port; the mode's default port when `None`.
    pub port: Option<u16>,
    /// Login name for `AUTH LOGIN`.
    pub username: String,
    /// Password for `AUTH LOGIN`.
    pub password: String,
    /// PEM file with extra trusted certificates (TLS only).
    pub cert_file: Option<PathBuf>,
    /// Name announced in `HELO`.
    pub helo_name: Option<String>,
}

impl ConnectOptions {
    /// Creates options with no explicit port, certificate or HELO name.
    #[must_use]
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            port: None,
            username: username.into(),
            password: password.into(),
            cert_file: None,
            helo_name: None,
        }
    }

    /// Creates an options builder.
    #[must_use]
    pub fn builder(hostname: impl Into<String>) -> ConnectOptionsBuilder {
        ConnectOptionsBuilder::new(hostname)
    }

    /// Returns the port to dial for `mode`.
    #[must_use]
    pub fn port_for(&self, mode: TransportMode) -> u16 {
        self.port.unwrap_or_else(|| mode.default_port())
    }

    /// Returns the name sent in `HELO`.
    #[must_use]
    pub fn helo_name(&self) -> &str {
        self.helo_name.as_deref().unwrap_or(&self.hostname)
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("cert_file", &self.cert_file)
            .field("helo_name", &self.helo_name)
            .finish()
    }
}

/// Builder for [`ConnectOptions`].
#[derive(Debug, Clone)]
pub struct ConnectOptionsBuilder {
    options: ConnectOptions,
}

impl ConnectOptionsBuilder {
    /// Creates a builder for the given server.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            options: ConnectOptions::new(hostname, String::new(), String::new()),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.options.port = Some(port);
        self
    }

    /// Sets the login credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.options.username = username.into();
        self.options.password = password.into();
        self
    }

    /// Sets a PEM file with extra trusted certificates.
    #[must_use]
    pub fn cert_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cert_file = Some(path.into());
        self
    }

    /// Sets the name announced in `HELO`.
    #[must_use]
    pub fn helo_name(mut self, name: impl Into<String>) -> Self {
        self.options.helo_name = Some(name.into());
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> ConnectOptions {
        self.options
    }
}

/// Client behaviour fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientOptions {
    /// Log every command line and reply at debug level.
    pub debug: bool,
    /// Transfer encoding applied to every body part.
    pub encoding: TransferEncoding,
    /// Bounded wait for connect, each read and each write.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }
}

/// Builder for [`ClientOptions`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Enables or disables wire logging.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    /// Sets the body transfer encoding.
    #[must_use]
    pub const fn encoding(mut self, encoding: TransferEncoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Builds the options.
    #[must_use]
    pub const fn build(self) -> ClientOptions {
        self.options
    }
}
