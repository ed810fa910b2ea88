//! Email address parsing.
//!
//! An address is given as a raw string and used in two forms: the envelope
//! form (`<addr>`) sent with `MAIL FROM` / `RCPT TO`, and the display form
//! written into the `FROM` / `TO` headers.
//!
//! Accepted grammar:
//!
//! ```text
//! mailbox   = [display-name WSP] "<" address ">" [trailing-text]
//!           / address
//! ```
//!
//! The bracketed address is taken from the last `<` that starts the input or
//! follows whitespace, up to the last `>` after it. A bare address may not
//! contain angle brackets.

use crate::error::{Error, Result};
use std::fmt;

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    name: Option<String>,
    address: String,
    display: String,
}

impl Mailbox {
    /// Parses a raw address string.
    ///
    /// `"Jane <jane@example.com>"` keeps the original text as display form;
    /// a bare `"jane@example.com"` is bracketed for both forms.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty, contains line breaks, or
    /// has angle brackets outside a single `<addr>` pair.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains(['\r', '\n']) {
            return Err(Error::InvalidAddress(
                "Address cannot contain line breaks".into(),
            ));
        }

        let input = raw.trim();
        if input.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        match split_bracketed(input) {
            Some((name, address)) => {
                let address = address.trim();
                if address.is_empty() {
                    return Err(Error::InvalidAddress(format!(
                        "No address between brackets: {input}"
                    )));
                }
                if address.contains(['<', '>']) {
                    return Err(Error::InvalidAddress(format!(
                        "Nested angle brackets: {input}"
                    )));
                }
                Ok(Self {
                    name: name.map(str::to_string),
                    address: address.to_string(),
                    display: input.to_string(),
                })
            }
            None if input.contains(['<', '>']) => Err(Error::InvalidAddress(format!(
                "Unbalanced angle brackets: {input}"
            ))),
            None => Ok(Self {
                name: None,
                address: input.to_string(),
                display: format!("<{input}>"),
            }),
        }
    }

    /// Returns the display name, if one was given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the bare address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the envelope form, `<addr>`.
    #[must_use]
    pub fn envelope(&self) -> String {
        format!("<{}>", self.address)
    }

    /// Returns the display form used in message headers.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Splits `[name WSP] "<" addr ">" [rest]` into its name and address.
fn split_bracketed(input: &str) -> Option<(Option<&str>, &str)> {
    for (open, _) in input.match_indices('<').rev() {
        let before = &input[..open];
        if !before.is_empty() && !before.ends_with(char::is_whitespace) {
            continue;
        }

        let rest = &input[open + 1..];
        let Some(close) = rest.rfind('>') else {
            continue;
        };

        let name = before.trim_end();
        return Some(((!name.is_empty()).then_some(name), &rest[..close]));
    }

    None
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_named_address() {
        let mailbox = Mailbox::parse("Name <a@b.com>").unwrap();
        assert_eq!(mailbox.envelope(), "<a@b.com>");
        assert_eq!(mailbox.display(), "Name <a@b.com>");
        assert_eq!(mailbox.name(), Some("Name"));
        assert_eq!(mailbox.address(), "a@b.com");
    }

    #[test]
    fn test_bare_address() {
        let mailbox = Mailbox::parse("a@b.com").unwrap();
        assert_eq!(mailbox.envelope(), "<a@b.com>");
        assert_eq!(mailbox.display(), "<a@b.com>");
        assert!(mailbox.name().is_none());
    }

    #[test]
    fn test_bracketed_without_name() {
        let mailbox = Mailbox::parse("<a@b.com>").unwrap();
        assert_eq!(mailbox.envelope(), "<a@b.com>");
        assert_eq!(mailbox.display(), "<a@b.com>");
        assert!(mailbox.name().is_none());
    }

    #[test]
    fn test_quoted_display_name_with_spaces() {
        let mailbox = Mailbox::parse("\"Doe, Jane\" <jane@example.com>").unwrap();
        assert_eq!(mailbox.envelope(), "<jane@example.com>");
        assert_eq!(mailbox.display(), "\"Doe, Jane\" <jane@example.com>");
        assert_eq!(mailbox.name(), Some("\"Doe, Jane\""));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let mailbox = Mailbox::parse("  a@b.com \t").unwrap();
        assert_eq!(mailbox.envelope(), "<a@b.com>");
    }

    #[test]
    fn test_bracket_without_separator_rejected() {
        // No whitespace before the bracket, so this would be a bare address
        // with brackets inside it
        assert!(Mailbox::parse("Name<a@b.com>").is_err());
        assert!(Mailbox::parse("a@b.com>").is_err());
        assert!(Mailbox::parse("Name <a@b.com").is_err());
    }

    #[test]
    fn test_text_after_closing_bracket() {
        let mailbox = Mailbox::parse("Name <a@b.com> (work)").unwrap();
        assert_eq!(mailbox.envelope(), "<a@b.com>");
        assert_eq!(mailbox.address(), "a@b.com");
        assert_eq!(mailbox.name(), Some("Name"));
        assert_eq!(mailbox.display(), "Name <a@b.com> (work)");
    }

    #[test]
    fn test_nested_brackets_rejected() {
        assert!(Mailbox::parse("Name <x <a@b.com>>").is_err());
    }

    #[test]
    fn test_empty_address() {
        assert!(Mailbox::parse("").is_err());
        assert!(Mailbox::parse("   ").is_err());
    }

    #[test]
    fn test_empty_brackets() {
        assert!(Mailbox::parse("Name <>").is_err());
    }

    #[test]
    fn test_line_break_rejected() {
        assert!(Mailbox::parse("a@b.com\r\nRCPT TO:<x@y.com>").is_err());
        assert!(Mailbox::parse("Name <a@b.com>\n").is_err());
    }

    proptest! {
        #[test]
        fn named_addresses_split(
            name in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            local in "[a-z0-9.]{1,16}",
            domain in "[a-z]{1,12}\\.[a-z]{2,4}",
        ) {
            let raw = format!("{name} <{local}@{domain}>");
            let mailbox = Mailbox::parse(&raw).unwrap();
            prop_assert_eq!(mailbox.envelope(), format!("<{local}@{domain}>"));
            prop_assert_eq!(mailbox.display(), raw.as_str());
        }

        #[test]
        fn bare_addresses_bracketed(
            local in "[a-z0-9.]{1,16}",
            domain in "[a-z]{1,12}\\.[a-z]{2,4}",
        ) {
            let raw = format!("{local}@{domain}");
            let mailbox = Mailbox::parse(&raw).unwrap();
            let expected = format!("<{raw}>");
            prop_assert_eq!(mailbox.envelope(), expected.clone());
            prop_assert_eq!(mailbox.display(), expected.as_str());
        }
    }
}
