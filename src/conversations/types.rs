use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a conversation before its first user message
pub const DEFAULT_TITLE: &str = "New chat";

/// Maximum number of characters kept when deriving a title
pub const TITLE_MAX_CHARS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            ts: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
        }
    }

    /// Text searched by the history filter: the title followed by every message
    pub fn haystack(&self) -> String {
        let mut hay = self.title.clone();
        for message in &self.messages {
            hay.push(' ');
            hay.push_str(&message.content);
        }
        hay
    }

    /// Push a message, deriving the title from it when it is the opening user message
    pub(crate) fn push(&mut self, message: Message) {
        let derive = self.title == DEFAULT_TITLE
            && self.messages.is_empty()
            && message.role == Role::User;
        if derive {
            self.title = derive_title(&message.content);
        }
        self.messages.push(message);
    }
}

/// Build a conversation title from the first user message
pub fn derive_title(content: &str) -> String {
    let text = content.trim();
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push('…');
    }
    title
}

/// Short opaque identifier for a new conversation
pub fn new_conversation_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
