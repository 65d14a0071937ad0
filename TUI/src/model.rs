//! Conversation data model: modes, messages and chat sessions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to sessions created through "new chat".
pub const DEFAULT_TITLE: &str = "New Chat";

/// Title length for a session opened implicitly by the first send.
pub const NEW_SESSION_TITLE_CHARS: usize = 30;

/// Title length when the first message of a session renames it.
pub const FIRST_MESSAGE_TITLE_CHARS: usize = 35;

const ELLIPSIS: &str = "...";

/// Assistant response domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Chat,
    Image,
    Math,
    Code,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Chat, Mode::Image, Mode::Math, Mode::Code];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Image => "image",
            Mode::Math => "math",
            Mode::Code => "code",
        }
    }

    /// Next mode in tab order, wrapping around.
    pub fn next(self) -> Mode {
        let idx = Mode::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Mode::ALL[(idx + 1) % Mode::ALL.len()]
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected chat, image, math or code)")]
pub struct ModeParseError(pub String);

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModeParseError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Fresh random (v4) id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub mode: Mode,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_typing: bool,
}

impl Message {
    pub fn user(content: &str, mode: Mode, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::User,
            content: content.to_string(),
            mode,
            timestamp: now,
            is_typing: false,
        }
    }

    /// Transient "response pending" marker.
    pub fn placeholder(mode: Mode, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            content: String::new(),
            mode,
            timestamp: now,
            is_typing: true,
        }
    }

    pub fn assistant(content: &str, mode: Mode, now: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            content: content.to_string(),
            mode,
            timestamp: now,
            is_typing: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub title: String,
    pub messages: Vec<Message>,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(title: String, mode: Mode, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            title,
            messages: Vec::new(),
            mode,
            created_at: now,
        }
    }

    /// The outstanding typing placeholder, if a reply is pending.
    pub fn pending_placeholder(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_typing)
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.pending_placeholder().is_some()
    }
}

/// First `limit` characters of `text`, with "..." appended when cut.
pub fn derive_title(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{}{}", head, ELLIPSIS)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_short_text_untouched() {
        assert_eq!(
            derive_title("Explain quantum computing", FIRST_MESSAGE_TITLE_CHARS),
            "Explain quantum computing"
        );
    }

    #[test]
    fn test_title_truncates_with_ellipsis() {
        let text = "a".repeat(50);
        let title = derive_title(&text, FIRST_MESSAGE_TITLE_CHARS);
        assert_eq!(title, format!("{}...", "a".repeat(35)));
    }

    #[test]
    fn test_title_exact_limit_not_truncated() {
        let text = "b".repeat(30);
        assert_eq!(derive_title(&text, NEW_SESSION_TITLE_CHARS), text);
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        let text = "é".repeat(40);
        let title = derive_title(&text, FIRST_MESSAGE_TITLE_CHARS);
        assert_eq!(title.chars().count(), 38);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_mode_parse_and_display() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
        assert_eq!(" Code ".parse::<Mode>(), Ok(Mode::Code));
        assert!("poetry".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_next_wraps() {
        assert_eq!(Mode::Chat.next(), Mode::Image);
        assert_eq!(Mode::Code.next(), Mode::Chat);
    }

    #[test]
    fn test_message_serializes_lowercase_enums() {
        let msg = Message::user("hi", Mode::Math, Utc::now());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["mode"], "math");
        assert!(json.get("is_typing").is_none());

        let typing = serde_json::to_value(Message::placeholder(Mode::Chat, Utc::now())).unwrap();
        assert_eq!(typing["is_typing"], true);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Message::assistant("x", Mode::Chat, Utc::now());
        let b = Message::assistant("x", Mode::Chat, Utc::now());
        assert_ne!(a.id, b.id);
        assert_ne!(SessionId::generate(), SessionId::generate());
    }
}
