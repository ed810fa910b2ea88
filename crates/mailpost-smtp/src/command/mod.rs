//! SMTP command builder.
//!
//! A command line is its verb followed by its arguments, joined with single
//! spaces and terminated by CRLF. Each command also knows the reply code the
//! server must answer with.

use crate::types::ReplyCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailpost_mime::Mailbox;
use std::fmt;

/// Credential sent during `AUTH LOGIN`.
///
/// Kept out of `Debug` and `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a credential.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the base64 form sent on the wire.
    #[must_use]
    pub fn encoded(&self) -> String {
        STANDARD.encode(self.0.as_bytes())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO - Simple greeting
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// AUTH LOGIN - Begin LOGIN authentication
    AuthLogin,
    /// Username line of the LOGIN exchange (sent base64-encoded)
    AuthUsername(Secret),
    /// Password line of the LOGIN exchange (sent base64-encoded)
    AuthPassword(Secret),
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender mailbox
        from: Mailbox,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient mailbox
        to: Mailbox,
    },
    /// DATA - Begin message data
    Data,
}

impl Command {
    /// Returns the command verb; empty for bare credential lines.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::AuthLogin => "AUTH LOGIN",
            Self::AuthUsername(_) | Self::AuthPassword(_) => "",
            Self::MailFrom { .. } => "MAIL FROM:",
            Self::RcptTo { .. } => "RCPT TO:",
            Self::Data => "DATA",
        }
    }

    /// Returns the command arguments.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Helo { hostname } => vec![hostname.clone()],
            Self::AuthUsername(secret) | Self::AuthPassword(secret) => vec![secret.encoded()],
            Self::MailFrom { from } => vec![from.envelope()],
            Self::RcptTo { to } => vec![to.envelope()],
            Self::AuthLogin | Self::Data => Vec::new(),
        }
    }

    /// Returns the reply code the server must send after this command.
    #[must_use]
    pub const fn expected_reply(&self) -> ReplyCode {
        match self {
            Self::Helo { .. } | Self::MailFrom { .. } | Self::RcptTo { .. } => ReplyCode::OK,
            Self::AuthLogin | Self::AuthUsername(_) => ReplyCode::AUTH_CONTINUE,
            Self::AuthPassword(_) => ReplyCode::AUTH_SUCCESS,
            Self::Data => ReplyCode::START_DATA,
        }
    }

    /// Serializes the command to bytes.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = self.verb().to_string();
        for arg in self.args() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&arg);
        }
        line.push_str("\r\n");
        line.into_bytes()
    }
}

impl fmt::Display for Command {
    /// Formats the command line for logs, with credentials masked.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthUsername(_) | Self::AuthPassword(_) => f.write_str("<credentials>"),
            _ => {
                let line = self.serialize();
                f.write_str(String::from_utf8_lossy(&line).trim_end())
            }
        }
    }
}
