//! Purpose: Parse the reply envelope: status head block plus raw body text.
//! Exports: `Reply`, `ReplyHead`.
//! Role: Transport-side boundary; the decoder only ever sees the body.
//! Invariants: The head ends at the first blank line; the body is untouched text.
//! Invariants: Parsing is total; a missing or malformed status code is left unset
//! for the transport to reject, never guessed at.

use super::decode::{decode, key_value_pairs};
use super::value::ResultTree;

/// Status header block preceding a reply body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplyHead {
    pub version: Option<String>,
    pub status_code: Option<i64>,
    pub status_text: Option<String>,
    pub session_id: Option<String>,
    pub account_balance: Option<String>,
}

/// One parsed registrar reply: head fields plus the verbatim body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
    pub head: ReplyHead,
    pub body: String,
}

impl Reply {
    /// Split raw response text at the first blank line and parse the head.
    /// A reply without a blank line is all head with an empty body.
    pub fn parse(raw: &str) -> Self {
        let (head_text, body) = split_head(raw);
        let mut head = ReplyHead::default();
        for (name, value) in key_value_pairs(head_text) {
            if name.eq_ignore_ascii_case("Version") {
                head.version = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("Status-Code") {
                head.status_code = value.parse().ok();
            } else if name.eq_ignore_ascii_case("Status-Text") {
                head.status_text = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("Session-Id") {
                head.session_id = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("Account-Balance") {
                head.account_balance = Some(value.to_string());
            }
        }
        Self {
            head,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.head.status_code == Some(0)
    }

    /// Decode the body into a tree. Total, like the decoder itself.
    pub fn decode_body(&self) -> ResultTree {
        decode(&self.body)
    }
}

fn split_head(raw: &str) -> (&str, &str) {
    // Blank-line scan that tolerates mixed \n and \r\n endings.
    let bytes = raw.as_bytes();
    let mut offset = 0;
    while offset < bytes.len() {
        let line_end = raw[offset..]
            .find('\n')
            .map(|pos| offset + pos)
            .unwrap_or(bytes.len());
        let line = raw[offset..line_end].trim_end_matches('\r');
        if line.is_empty() {
            let body_start = (line_end + 1).min(bytes.len());
            return (&raw[..offset], &raw[body_start..]);
        }
        offset = line_end + 1;
    }
    (raw, "")
}
