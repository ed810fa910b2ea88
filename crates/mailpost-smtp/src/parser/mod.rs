//! SMTP response parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses an SMTP reply from one chunk of server output.
///
/// The first three characters, trimmed, are the code; the trimmed remainder
/// is the message. An empty chunk yields `None`.
///
/// Only single-line replies are understood. A multi-line reply
/// (`250-First\r\n250 Last\r\n`) read in one chunk keeps its continuation
/// lines inside `message`.
///
/// # Errors
///
/// Returns an error if the code is not numeric.
pub fn parse_reply(chunk: &[u8]) -> Result<Option<Reply>> {
    if chunk.is_empty() {
        return Ok(None);
    }

    let text = String::from_utf8_lossy(chunk);
    let split = text.char_indices().nth(3).map_or(text.len(), |(i, _)| i);
    let (code_str, rest) = text.split_at(split);

    let code = code_str
        .trim()
        .parse::<u16>()
        .map_err(|_| Error::MalformedReply(text.trim().to_string()))?;

    Ok(Some(Reply::new(ReplyCode::new(code), rest.trim())))
}
