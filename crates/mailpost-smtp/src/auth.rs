//! Greeting, `HELO` and `AUTH LOGIN`.

use crate::command::{Command, Secret};
use crate::config::ConnectOptions;
use crate::connection::CommandChannel;
use crate::error::Result;
use crate::types::ReplyCode;
use tokio::io::{AsyncRead, AsyncWrite};

/// Runs the opening exchange of a session.
///
/// ```text
/// S: 220 greeting
/// C: HELO <name>          S: 250
/// C: AUTH LOGIN           S: 334
/// C: base64(username)     S: 334
/// C: base64(password)     S: 235
/// ```
///
/// # Errors
///
/// Returns the first transport or protocol error. Nothing is retried.
pub async fn authenticate<S>(channel: &mut CommandChannel<S>, options: &ConnectOptions) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = channel.expect(ReplyCode::SERVICE_READY).await?;
    tracing::debug!(greeting = %greeting.message, "Server ready");

    channel
        .execute(&Command::Helo {
            hostname: options.helo_name().to_string(),
        })
        .await?;

    channel.execute(&Command::AuthLogin).await?;
    channel
        .execute(&Command::AuthUsername(Secret::new(options.username.as_str())))
        .await?;
    channel
        .execute(&Command::AuthPassword(Secret::new(options.password.as_str())))
        .await?;

    tracing::info!(host = %options.hostname, user = %options.username, "Authenticated");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TransportMode;
    use crate::connection::Transport;
    use crate::error::Error;
    use tokio_test::io::{Builder, Mock};

    fn channel(mock: Mock) -> CommandChannel<Mock> {
        let mut transport = Transport::new(false, None);
        transport.attach(mock, TransportMode::Plain);
        CommandChannel::new(transport)
    }

    fn options() -> ConnectOptions {
        ConnectOptions::new("smtp.example.com", "user", "pass")
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mock = Builder::new()
            .read(b"220 smtp.example.com ESMTP\r\n")
            .write(b"HELO smtp.example.com\r\n")
            .read(b"250 smtp.example.com\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"235 Authentication successful\r\n")
            .build();

        authenticate(&mut channel(mock), &options()).await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticate_uses_helo_name() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"HELO client.example.org\r\n")
            .read(b"250 hello\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"235 ok\r\n")
            .build();

        let options = ConnectOptions::builder("smtp.example.com")
            .credentials("user", "pass")
            .helo_name("client.example.org")
            .build();
        authenticate(&mut channel(mock), &options).await.unwrap();
    }

    #[tokio::test]
    async fn test_authenticate_bad_greeting() {
        let mock = Builder::new()
            .read(b"554 No SMTP service here\r\n")
            .build();

        let err = authenticate(&mut channel(mock), &options()).await.unwrap_err();
        assert_eq!(err.expected_code(), Some(ReplyCode::SERVICE_READY));
        assert_eq!(err.actual_code().map(ReplyCode::as_u16), Some(554));
    }

    #[tokio::test]
    async fn test_authenticate_rejected_password() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"HELO smtp.example.com\r\n")
            .read(b"250 hello\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"535 Authentication credentials invalid\r\n")
            .build();

        let err = authenticate(&mut channel(mock), &options()).await.unwrap_err();
        match err {
            Error::UnexpectedReply {
                expected, actual, ..
            } => {
                assert_eq!(expected, ReplyCode::AUTH_SUCCESS);
                assert_eq!(actual.as_u16(), 535);
            }
            other => panic!("Expected UnexpectedReply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_auth_not_offered() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"HELO smtp.example.com\r\n")
            .read(b"250 hello\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"504 Unrecognized authentication type\r\n")
            .build();

        let err = authenticate(&mut channel(mock), &options()).await.unwrap_err();
        assert_eq!(err.expected_code(), Some(ReplyCode::AUTH_CONTINUE));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn test_authenticate_connection_dropped() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"HELO smtp.example.com\r\n")
            .build();

        let err = authenticate(&mut channel(mock), &options()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NoReply {
                expected: ReplyCode::OK
            }
        ));
    }
}
