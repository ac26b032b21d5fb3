//! Telegram message addressing.
//!
//! Public chats are addressed by username (`https://t.me/<name>/<selector>`),
//! everything else by its internal numeric id (`https://t.me/c/<id>/<selector>`).

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

pub const TELEGRAM_BASE: &str = "https://t.me";
pub const USERNAME_SIGIL: char = '@';

/// Builds the canonical link for a chat and message selector.
///
/// The selector is passed through untouched; only emptiness is checked here.
pub fn resolve_locator(chat_id: &str, selector: &str) -> Result<String> {
    if chat_id.is_empty() {
        return Err(Error::invalid("chat id cannot be empty"));
    }
    if selector.is_empty() {
        return Err(Error::invalid("message selector cannot be empty"));
    }

    match chat_id.strip_prefix(USERNAME_SIGIL) {
        Some(username) => Ok(format!("{TELEGRAM_BASE}/{username}/{selector}")),
        None => Ok(format!("{TELEGRAM_BASE}/c/{chat_id}/{selector}")),
    }
}

/// What to download: a ready-made link or a chat plus message selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Url(String),
    Message { chat_id: String, selector: String },
}

impl Locator {
    pub fn url(url: impl Into<String>) -> Self {
        Locator::Url(url.into())
    }

    pub fn message(chat_id: impl Into<String>, selector: impl ToString) -> Self {
        Locator::Message {
            chat_id: chat_id.into(),
            selector: selector.to_string(),
        }
    }

    pub fn resolve(&self) -> Result<String> {
        match self {
            Locator::Url(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(Error::invalid("link cannot be empty"));
                }
                let parsed = Url::parse(raw)
                    .map_err(|err| Error::invalid(format!("invalid link {raw}: {err}")))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(Error::invalid(format!(
                        "unsupported link scheme: {}",
                        parsed.scheme()
                    )));
                }
                Ok(raw.to_string())
            }
            Locator::Message { chat_id, selector } => resolve_locator(chat_id, selector),
        }
    }
}

/// A message-id expression: `123`, `100-200` or `1,5,10`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSelector {
    Single(u64),
    Range(u64, u64),
    List(Vec<u64>),
}

impl MessageSelector {
    pub fn range(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(Error::invalid(format!(
                "range start {start} is after range end {end}"
            )));
        }
        Ok(MessageSelector::Range(start, end))
    }
}

impl FromStr for MessageSelector {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid("message selector cannot be empty"));
        }

        if trimmed.contains(',') {
            let ids = trimmed
                .split(',')
                .map(|part| parse_message_id(part.trim()))
                .collect::<Result<Vec<_>>>()?;
            return Ok(MessageSelector::List(ids));
        }

        if let Some((start, end)) = trimmed.split_once('-') {
            let start = parse_message_id(start.trim())?;
            let end = parse_message_id(end.trim())?;
            return MessageSelector::range(start, end);
        }

        Ok(MessageSelector::Single(parse_message_id(trimmed)?))
    }
}

impl fmt::Display for MessageSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSelector::Single(id) => write!(f, "{id}"),
            MessageSelector::Range(start, end) => write!(f, "{start}-{end}"),
            MessageSelector::List(ids) => {
                let joined = ids
                    .iter()
                    .map(u64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                f.write_str(&joined)
            }
        }
    }
}

fn parse_message_id(part: &str) -> Result<u64> {
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::invalid(format!("invalid message id: {part:?}")));
    }
    part.parse()
        .map_err(|_| Error::invalid(format!("message id out of range: {part}")))
}
