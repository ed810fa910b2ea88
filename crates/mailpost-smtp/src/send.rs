//! One mail transaction: `MAIL FROM`, `RCPT TO`, `DATA`, payload.

use crate::command::Command;
use crate::connection::CommandChannel;
use crate::error::Result;
use crate::types::{Reply, ReplyCode};
use mailpost_mime::{Mailbox, Message, MessageComposer};
use tokio::io::{AsyncRead, AsyncWrite};

/// End-of-data marker sent after the payload.
pub const DATA_TERMINATOR: &str = "\r\n.\r\n";

/// Sender and recipient of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Sender mailbox.
    pub from: Mailbox,
    /// Recipient mailbox.
    pub to: Mailbox,
}

impl Envelope {
    /// Parses the sender and recipient of a message.
    ///
    /// # Errors
    ///
    /// Returns an error if either address is invalid.
    pub fn from_message(message: &Message) -> Result<Self> {
        Ok(Self {
            from: Mailbox::parse(&message.from)?,
            to: Mailbox::parse(&message.to)?,
        })
    }
}

/// Doubles a leading `.` on every line of the payload.
#[must_use]
pub fn dot_stuff(payload: &str) -> String {
    let mut out = String::with_capacity(payload.len() + 8);
    for (i, line) in payload.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
    }
    out
}

/// Returns the bytes written after `DATA`: the stuffed payload and the
/// terminator.
#[must_use]
pub fn encode_data(payload: &str) -> Vec<u8> {
    let mut data = dot_stuff(payload);
    data.push_str(DATA_TERMINATOR);
    data.into_bytes()
}

/// Sends one message over an authenticated channel.
///
/// The message is composed before anything is written, so an invalid
/// address or header value leaves the session untouched.
///
/// # Errors
///
/// Returns an error on an invalid address or header value, a transport
/// failure, or the first reply that does not match.
pub async fn send_message<S>(
    channel: &mut CommandChannel<S>,
    composer: &MessageComposer,
    message: &Message,
) -> Result<Reply>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Envelope { from, to } = Envelope::from_message(message)?;
    let composed = composer.compose_with(message, &from, &to)?;

    channel
        .execute(&Command::MailFrom { from: from.clone() })
        .await?;
    channel.execute(&Command::RcptTo { to: to.clone() }).await?;
    channel.execute(&Command::Data).await?;

    channel.write_data(&encode_data(&composed.to_string())).await?;
    let reply = channel.expect(ReplyCode::OK).await?;

    tracing::info!(
        from = from.address(),
        to = to.address(),
        multipart = composed.is_multipart(),
        "Message accepted"
    );
    Ok(reply)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TransportMode;
    use crate::connection::Transport;
    use crate::error::Error;
    use mailpost_mime::TransferEncoding;
    use proptest::prelude::*;
    use tokio_test::io::{Builder, Mock};

    const DATE: &str = "Tue, 1 Oct 2024 10:00:00 +0000";

    fn channel(mock: Mock) -> CommandChannel<Mock> {
        let mut transport = Transport::new(false, None);
        transport.attach(mock, TransportMode::Plain);
        CommandChannel::new(transport)
    }

    #[test]
    fn test_dot_stuff() {
        assert_eq!(dot_stuff("a\r\n.b\r\nc"), "a\r\n..b\r\nc");
        assert_eq!(dot_stuff(".start"), "..start");
        assert_eq!(dot_stuff("no dots"), "no dots");
        assert_eq!(dot_stuff("a.b\r\n."), "a.b\r\n..");
    }

    #[test]
    fn test_encode_data_terminates() {
        assert_eq!(encode_data("Hi"), b"Hi\r\n.\r\n");
        assert_eq!(encode_data("x\r\n.\r\ny"), b"x\r\n..\r\ny\r\n.\r\n");
    }

    #[test]
    fn test_envelope_from_message() {
        let message = Message::new("Sender <sender@example.com>", "rcpt@example.com", "s");
        let envelope = Envelope::from_message(&message).unwrap();
        assert_eq!(envelope.from.envelope(), "<sender@example.com>");
        assert_eq!(envelope.to.envelope(), "<rcpt@example.com>");
    }

    #[tokio::test]
    async fn test_send_text_message() {
        let payload = b"SUBJECT: Hi\r\n\
            FROM: Sender <sender@example.com>\r\n\
            TO: <rcpt@example.com>\r\n\
            DATE: Tue, 1 Oct 2024 10:00:00 +0000\r\n\
            MIME-Version: 1.0\r\n\
            Content-Type: text/plain; charset=utf-8\r\n\
            Content-Transfer-Encoding: 7bit\r\n\
            \r\n\
            Hello\r\n\
            ..\r\n\
            Bye\r\n.\r\n";

        let mock = Builder::new()
            .write(b"MAIL FROM: <sender@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO: <rcpt@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 End data with <CR><LF>.<CR><LF>\r\n")
            .write(payload)
            .read(b"250 Queued as 12345\r\n")
            .build();

        let message = Message::new("Sender <sender@example.com>", "rcpt@example.com", "Hi")
            .text("Hello\n.\nBye")
            .date(DATE);
        let composer = MessageComposer::new(TransferEncoding::SevenBit);

        let reply = send_message(&mut channel(mock), &composer, &message)
            .await
            .unwrap();
        assert_eq!(reply.message, "Queued as 12345");
    }

    #[tokio::test]
    async fn test_send_rejected_recipient_skips_data() {
        let mock = Builder::new()
            .write(b"MAIL FROM: <sender@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO: <nobody@example.com>\r\n")
            .read(b"550 No such user\r\n")
            .build();

        let message = Message::new("sender@example.com", "nobody@example.com", "s").text("x");
        let composer = MessageComposer::new(TransferEncoding::SevenBit);

        let err = send_message(&mut channel(mock), &composer, &message)
            .await
            .unwrap_err();
        assert_eq!(err.expected_code(), Some(ReplyCode::OK));
        assert_eq!(err.actual_code(), Some(ReplyCode::new(550)));
    }

    #[tokio::test]
    async fn test_send_invalid_address_writes_nothing() {
        let mock = Builder::new().build();

        let message = Message::new("sender@example.com", "bad\r\nRCPT TO: <x@y>", "s");
        let composer = MessageComposer::new(TransferEncoding::SevenBit);

        let err = send_message(&mut channel(mock), &composer, &message)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Mime(_)));
    }

    #[tokio::test]
    async fn test_send_bracketed_address_with_comment() {
        let mock = Builder::new()
            .write(b"MAIL FROM: <a@example.com>\r\n")
            .read(b"421 Closing\r\n")
            .build();

        let message = Message::new("Name <a@example.com> (work)", "b@example.com", "s");
        let composer = MessageComposer::new(TransferEncoding::SevenBit);

        let err = send_message(&mut channel(mock), &composer, &message)
            .await
            .unwrap_err();
        assert_eq!(err.actual_code(), Some(ReplyCode::new(421)));
    }

    #[tokio::test]
    async fn test_send_date_injection_writes_nothing() {
        let mock = Builder::new().build();

        let message = Message::new("a@example.com", "b@example.com", "s")
            .date("now\r\nBcc: victim@example.com");
        let composer = MessageComposer::new(TransferEncoding::SevenBit);

        let err = send_message(&mut channel(mock), &composer, &message)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Mime(_)));
    }

    #[tokio::test]
    async fn test_send_final_reply_mismatch() {
        let mock = Builder::new()
            .write(b"MAIL FROM: <a@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"RCPT TO: <b@example.com>\r\n")
            .read(b"250 OK\r\n")
            .write(b"DATA\r\n")
            .read(b"354 go ahead\r\n")
            .write(
                b"SUBJECT: s\r\nFROM: <a@example.com>\r\nTO: <b@example.com>\r\n\
                  DATE: Tue, 1 Oct 2024 10:00:00 +0000\r\nMIME-Version: 1.0\r\n\
                  Content-Type: text/plain; charset=utf-8\r\n\
                  Content-Transfer-Encoding: 7bit\r\n\r\nx\r\n.\r\n",
            )
            .read(b"552 Message size exceeds limit\r\n")
            .build();

        let message = Message::new("a@example.com", "b@example.com", "s")
            .text("x")
            .date(DATE);
        let composer = MessageComposer::new(TransferEncoding::SevenBit);

        let err = send_message(&mut channel(mock), &composer, &message)
            .await
            .unwrap_err();
        assert_eq!(err.actual_code(), Some(ReplyCode::new(552)));
        assert!(err.is_permanent());
    }

    proptest! {
        #[test]
        fn stuffed_lines_never_start_with_lone_dot(lines in prop::collection::vec("[.a-z ]{0,12}", 0..8)) {
            let payload = lines.join("\r\n");
            let stuffed = dot_stuff(&payload);
            for (original, line) in payload.split("\r\n").zip(stuffed.split("\r\n")) {
                if original.starts_with('.') {
                    prop_assert_eq!(line, format!(".{original}"));
                } else {
                    prop_assert_eq!(line, original);
                }
            }
        }
    }
}
