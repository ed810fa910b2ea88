//! MIME composition for outgoing messages.
//!
//! A message with an HTML body becomes `multipart/alternative` with the plain
//! text part first and the HTML part second. The text part is emitted even
//! when no text body was given. Everything else is a single `text/plain` part.

use crate::content_type::ContentType;
use crate::encoding::encode_rfc2047;
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::mailbox::Mailbox;
use crate::message::{Message, TransferEncoding};
use chrono::{Local, Utc};
use std::fmt;

/// Literal prefix of generated multipart boundaries.
pub const BOUNDARY_PREFIX: &str = "boundary";

/// Generates a multipart boundary from the current time.
///
/// Two messages composed within the same millisecond share a boundary, and
/// nothing checks the body for the token. Uniqueness is best-effort only.
#[must_use]
pub fn generate_boundary() -> String {
    format!("{BOUNDARY_PREFIX}{}", Utc::now().timestamp_millis())
}

/// MIME body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Encoded part body.
    pub body: String,
}

impl Part {
    fn text(content_type: ContentType, encoding: TransferEncoding, body: &str) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("Content-Transfer-Encoding", encoding.as_str());
        Self {
            headers,
            body: encoding.encode(body),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n{}", self.headers, self.body)
    }
}

/// A fully composed message, ready to be sent after `DATA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    /// Top-level headers.
    pub headers: Headers,
    /// Body parts; one for `text/plain`, two for `multipart/alternative`.
    pub parts: Vec<Part>,
    /// Multipart boundary, if the message is multipart.
    pub boundary: Option<String>,
}

impl ComposedMessage {
    /// Returns true if this is a multipart message.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        self.boundary.is_some()
    }

    /// Returns the top-level Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("Content-Type")
    }
}

impl fmt::Display for ComposedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.boundary {
            Some(boundary) => {
                write!(f, "{}\r\n", self.headers)?;
                for part in &self.parts {
                    write!(f, "--{boundary}\r\n{part}\r\n")?;
                }
                write!(f, "--{boundary}--")
            }
            None => {
                // Single part: its headers continue the top-level block
                write!(f, "{}", self.headers)?;
                for part in &self.parts {
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

/// Builds MIME headers and body for a [`Message`].
#[derive(Debug, Clone, Default)]
pub struct MessageComposer {
    encoding: TransferEncoding,
    boundary: Option<String>,
}

impl MessageComposer {
    /// Creates a composer that encodes bodies with `encoding`.
    #[must_use]
    pub const fn new(encoding: TransferEncoding) -> Self {
        Self {
            encoding,
            boundary: None,
        }
    }

    /// Uses a fixed multipart boundary instead of a generated one.
    #[must_use]
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Returns the configured transfer encoding.
    #[must_use]
    pub const fn encoding(&self) -> TransferEncoding {
        self.encoding
    }

    /// Composes headers and body.
    ///
    /// # Errors
    ///
    /// Returns an error if the from or to address cannot be parsed, or the
    /// date contains line breaks.
    pub fn compose(&self, message: &Message) -> Result<ComposedMessage> {
        let from = Mailbox::parse(&message.from)?;
        let to = Mailbox::parse(&message.to)?;
        self.compose_with(message, &from, &to)
    }

    /// Composes headers and body using already parsed mailboxes.
    ///
    /// An empty HTML body counts as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the date contains line breaks.
    pub fn compose_with(
        &self,
        message: &Message,
        from: &Mailbox,
        to: &Mailbox,
    ) -> Result<ComposedMessage> {
        let date = match &message.date {
            Some(date) if date.contains(['\r', '\n']) => {
                return Err(Error::InvalidHeader {
                    name: "DATE",
                    reason: "value cannot contain line breaks".into(),
                });
            }
            Some(date) => date.clone(),
            None => Local::now().to_rfc2822(),
        };

        let mut headers = Headers::new();
        headers.add("SUBJECT", encode_rfc2047(&message.subject, "utf-8"));
        headers.add("FROM", from.display());
        headers.add("TO", to.display());
        headers.add("DATE", date);
        headers.add("MIME-Version", "1.0");

        let text = message.text.as_deref().unwrap_or_default();

        let composed = match message.html.as_deref().filter(|html| !html.is_empty()) {
            Some(html) => {
                let boundary = self.boundary.clone().unwrap_or_else(generate_boundary);
                headers.add(
                    "Content-Type",
                    ContentType::multipart_alternative(boundary.as_str()).to_string(),
                );

                let parts = vec![
                    Part::text(ContentType::text_plain(), self.encoding, text),
                    Part::text(ContentType::text_html(), self.encoding, html),
                ];

                ComposedMessage {
                    headers,
                    parts,
                    boundary: Some(boundary),
                }
            }
            None => ComposedMessage {
                headers,
                parts: vec![Part::text(ContentType::text_plain(), self.encoding, text)],
                boundary: None,
            },
        };

        Ok(composed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::similar_names)]
mod tests {
    use super::*;

    const DATE: &str = "Tue, 1 Oct 2024 10:00:00 +0000";

    fn message() -> Message {
        Message::new("Sender <sender@example.com>", "rcpt@example.com", "Greetings").date(DATE)
    }

    #[test]
    fn test_single_part_text() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let composed = composer.compose(&message().text("Hello there")).unwrap();

        assert!(!composed.is_multipart());
        assert_eq!(
            composed.to_string(),
            "SUBJECT: Greetings\r\n\
             FROM: Sender <sender@example.com>\r\n\
             TO: <rcpt@example.com>\r\n\
             DATE: Tue, 1 Oct 2024 10:00:00 +0000\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             Hello there"
        );
    }

    #[test]
    fn test_multipart_alternative() {
        let composer = MessageComposer::new(TransferEncoding::EightBit).with_boundary("boundary42");
        let composed = composer
            .compose(&message().text("plain").html("<b>rich</b>"))
            .unwrap();

        assert!(composed.is_multipart());
        assert_eq!(
            composed.content_type(),
            Some("multipart/alternative; boundary=boundary42; charset=utf-8")
        );
        assert_eq!(
            composed.to_string(),
            "SUBJECT: Greetings\r\n\
             FROM: Sender <sender@example.com>\r\n\
             TO: <rcpt@example.com>\r\n\
             DATE: Tue, 1 Oct 2024 10:00:00 +0000\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/alternative; boundary=boundary42; charset=utf-8\r\n\
             \r\n\
             --boundary42\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             plain\r\n\
             --boundary42\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             <b>rich</b>\r\n\
             --boundary42--"
        );
    }

    #[test]
    fn test_html_only_keeps_empty_text_part() {
        let composer = MessageComposer::new(TransferEncoding::QuotedPrintable);
        let composed = composer.compose(&message().html("<p>x</p>")).unwrap();

        assert_eq!(composed.parts.len(), 2);
        assert_eq!(
            composed.parts[0].headers.get("content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(composed.parts[0].body, "");
        assert_eq!(composed.parts[1].body, "<p>x</p>");
    }

    #[test]
    fn test_parts_carry_configured_encoding() {
        let composer = MessageComposer::new(TransferEncoding::Base64);
        let composed = composer.compose(&message().text("a").html("b")).unwrap();

        for part in &composed.parts {
            assert_eq!(part.headers.get("Content-Transfer-Encoding"), Some("base64"));
        }
        assert_eq!(composed.parts[0].body, "YQ==");
        assert_eq!(composed.parts[1].body, "Yg==");
    }

    #[test]
    fn test_generated_boundary() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let composed = composer.compose(&message().html("<p/>")).unwrap();

        let boundary = composed.boundary.unwrap();
        let stamp = boundary.strip_prefix(BOUNDARY_PREFIX).unwrap();
        assert!(stamp.parse::<i64>().is_ok());
    }

    #[test]
    fn test_missing_text_body_is_empty() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let composed = composer.compose(&message()).unwrap();

        assert!(composed.to_string().ends_with("Content-Transfer-Encoding: 7bit\r\n\r\n"));
    }

    #[test]
    fn test_default_date_is_rfc2822() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let composed = composer
            .compose(&Message::new("a@example.com", "b@example.com", "s"))
            .unwrap();

        let date = composed.headers.get("DATE").unwrap();
        assert!(chrono::DateTime::parse_from_rfc2822(date).is_ok());
    }

    #[test]
    fn test_non_ascii_subject_encoded() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let composed = composer
            .compose(&Message::new("a@example.com", "b@example.com", "Héllo").date(DATE))
            .unwrap();

        assert_eq!(composed.headers.get("SUBJECT"), Some("=?utf-8?B?SMOpbGxv?="));
    }

    #[test]
    fn test_empty_html_is_single_part() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let composed = composer.compose(&message().text("hi").html("")).unwrap();

        assert!(!composed.is_multipart());
        assert_eq!(composed.parts.len(), 1);
        assert!(composed.to_string().ends_with("text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\r\nhi"));
    }

    #[test]
    fn test_date_with_line_break_rejected() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        let message = message()
            .text("x")
            .date("Tue, 1 Oct 2024 10:00:00 +0000\r\nBcc: victim@example.com");

        assert!(matches!(
            composer.compose(&message),
            Err(Error::InvalidHeader { name: "DATE", .. })
        ));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let composer = MessageComposer::new(TransferEncoding::SevenBit);
        assert!(composer.compose(&Message::new("", "b@example.com", "s")).is_err());
    }
}
