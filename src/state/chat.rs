#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use time::OffsetDateTime;

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// A single conversation message. Never edited after it is appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub author: Author,
    pub created_at: OffsetDateTime,
}

impl Message {
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }
}

/// Append-only conversation log.
///
/// Ids are ordinals that keep increasing across [`MessageLog::remove`], so a
/// message id is never reused within a session.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    last_id: u64,
}

impl MessageLog {
    /// Append a message and return its id.
    pub fn push(&mut self, author: Author, text: impl Into<String>) -> u64 {
        self.last_id += 1;
        self.messages.push(Message {
            id: self.last_id,
            text: text.into(),
            author,
            created_at: OffsetDateTime::now_utc(),
        });
        self.last_id
    }

    /// Drop the message with `id`, keeping the order of the rest. Returns
    /// whether it was present.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
