//! # mailpost-mime
//!
//! MIME composition for outgoing email.
//!
//! ## Features
//!
//! - **Address parsing**: `Name <addr>` and bare `addr` forms, split into
//!   envelope and display forms
//! - **Message composition**: single-part `text/plain` or
//!   `multipart/alternative` (plain text + HTML)
//! - **Encoding**: Base64, Quoted-Printable, RFC 2047 header encoding
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpost_mime::{Message, MessageComposer, TransferEncoding};
//!
//! let message = Message::new("Sender <sender@example.com>", "recipient@example.com", "Test")
//!     .text("Plain text version")
//!     .html("<h1>HTML version</h1>"); // Creates multipart/alternative
//!
//! let composed = MessageComposer::new(TransferEncoding::QuotedPrintable).compose(&message)?;
//! println!("{composed}");
//! ```
//!
//! ## Limitations
//!
//! Multipart boundaries are derived from the current time and are not checked
//! against the body content. Attachments are not supported.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod compose;
mod content_type;
mod error;
mod header;
mod mailbox;
mod message;

pub mod encoding;

pub use compose::{BOUNDARY_PREFIX, ComposedMessage, MessageComposer, Part, generate_boundary};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use mailbox::Mailbox;
pub use message::{Message, TransferEncoding};
