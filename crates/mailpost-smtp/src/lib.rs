//! # mailpost-smtp
//!
//! A minimal SMTP submission client: one session, one login, messages sent
//! one at a time.
//!
//! ## Features
//!
//! - **Transports**: plain TCP (port 25) or implicit TLS (port 465) with
//!   extra trusted roots loaded from a PEM file
//! - **Authentication**: `AUTH LOGIN` after `HELO`
//! - **Messages**: plain text or `multipart/alternative` (text + HTML), with
//!   the body transfer encoding fixed per client
//! - **Strict replies**: every reply must carry exactly the code the command
//!   expects; anything else ends the operation
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpost_smtp::{ClientOptions, ConnectOptions, Message, SmtpClient};
//!
//! #[tokio::main]
//! async fn main() -> mailpost_smtp::Result<()> {
//!     let options = ConnectOptions::builder("smtp.example.com")
//!         .credentials("user@example.com", "password")
//!         .build();
//!
//!     let mut client = SmtpClient::new(ClientOptions::default());
//!     client.connect_tls(&options).await?;
//!
//!     let message = Message::new("Me <user@example.com>", "friend@example.org", "Hello")
//!         .text("Plain text version")
//!         .html("<p>HTML version</p>");
//!     client.send(&message).await?;
//!
//!     client.close().await
//! }
//! ```
//!
//! ## Session
//!
//! ```text
//! S: 220            C: HELO <name>       S: 250
//! C: AUTH LOGIN     S: 334
//! C: <user b64>     S: 334
//! C: <pass b64>     S: 235
//! C: MAIL FROM: <a> S: 250
//! C: RCPT TO: <b>   S: 250
//! C: DATA           S: 354
//! C: <payload>.     S: 250
//! ```
//!
//! ## Limitations
//!
//! Each reply is taken from a single read of at most 512 bytes. Multi-line
//! replies (`250-...`) are not reassembled, and a reply split across reads is
//! not joined. There is no `EHLO`, `STARTTLS` or `QUIT`.
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Sockets, raw I/O and the command channel
//! - [`parser`]: Reply parser
//! - [`types`]: Reply types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod auth;
mod client;
mod config;
mod error;
mod send;

pub mod command;
pub mod connection;
pub mod parser;
pub mod types;

pub use auth::authenticate;
pub use client::{SessionState, SmtpClient, send_mail};
pub use config::{
    ClientOptions, ClientOptionsBuilder, ConnectOptions, ConnectOptionsBuilder, DEFAULT_PORT,
    DEFAULT_TLS_PORT, TransportMode,
};
pub use error::{Error, Result};
pub use mailpost_mime::{Mailbox, Message, TransferEncoding};
pub use send::{DATA_TERMINATOR, Envelope, dot_stuff, encode_data, send_message};
pub use types::{Reply, ReplyCode};
