//! Append-only chat message store.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use bizdesk_core::{BizDeskError, Result};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub department_id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MessageLog {
    messages: Vec<ChatMessage>,
    last_created_at: Option<DateTime<Utc>>,
}

impl MessageLog {
    fn push(&mut self, department_id: &str, role: Role, content: String) -> ChatMessage {
        // Timestamps never go backwards, even if the wall clock does.
        let now = Utc::now().trunc_subsecs(3);
        let created_at = self.last_created_at.map_or(now, |last| last.max(now));
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            department_id: department_id.to_string(),
            role,
            content,
            created_at,
        };
        self.last_created_at = Some(created_at);
        self.messages.push(message.clone());
        message
    }
}

/// Thread-safe message store. Messages are kept in global insertion order.
#[derive(Debug)]
pub struct MessageStore {
    log: RwLock<MessageLog>,
    max_chars: usize,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore {
    /// Content bound used when none is configured.
    pub const DEFAULT_MAX_CHARS: usize = 4000;

    pub fn new() -> Self {
        Self::with_max_chars(Self::DEFAULT_MAX_CHARS)
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            log: RwLock::new(MessageLog::default()),
            max_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Append a message. Fails if the content is over the bound or the
    /// department id is blank; registry membership is the caller's check.
    pub fn add_message(
        &self,
        department_id: &str,
        role: Role,
        content: impl Into<String>,
    ) -> Result<ChatMessage> {
        let content = content.into();
        self.check(department_id, &content)?;

        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        let message = log.push(department_id, role, content);
        drop(log);

        tracing::debug!("💬 [{}] {:?} message stored", department_id, role);
        Ok(message)
    }

    /// Append a user message and its reply as one write. Both are validated
    /// first, so either both are stored or neither is.
    pub fn append_turn(
        &self,
        department_id: &str,
        user: impl Into<String>,
        reply: impl Into<String>,
    ) -> Result<(ChatMessage, ChatMessage)> {
        let (user, reply) = (user.into(), reply.into());
        self.check(department_id, &user)?;
        self.check(department_id, &reply)?;

        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        let user = log.push(department_id, Role::User, user);
        let reply = log.push(department_id, Role::Assistant, reply);
        drop(log);

        tracing::debug!("💬 [{}] chat turn stored", department_id);
        Ok((user, reply))
    }

    fn check(&self, department_id: &str, content: &str) -> Result<()> {
        if department_id.trim().is_empty() {
            return Err(BizDeskError::validation("departmentId is required"));
        }
        let chars = content.chars().count();
        if chars > self.max_chars {
            return Err(BizDeskError::validation(format!(
                "message is {chars} characters, limit is {}",
                self.max_chars
            )));
        }
        Ok(())
    }

    /// Messages of one department, or of all departments when `None`, in insertion order.
    pub fn get_messages(&self, department_id: Option<&str>) -> Vec<ChatMessage> {
        let log = self.log.read().unwrap_or_else(PoisonError::into_inner);
        log.messages
            .iter()
            .filter(|m| department_id.is_none_or(|dep| m.department_id == dep))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.log.read().unwrap_or_else(PoisonError::into_inner).messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_department_order() {
        let store = MessageStore::new();
        store.add_message("hr", Role::User, "first").unwrap();
        store.add_message("it", Role::User, "other").unwrap();
        store.add_message("hr", Role::Assistant, "second").unwrap();
        store.add_message("hr", Role::User, "third").unwrap();

        let hr: Vec<_> = store
            .get_messages(Some("hr"))
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(hr, ["first", "second", "third"]);

        let it = store.get_messages(Some("it"));
        assert_eq!(it.len(), 1);
        assert!(it.iter().all(|m| m.department_id == "it"));
    }

    #[test]
    fn test_all_messages_global_order() {
        let store = MessageStore::new();
        store.add_message("hr", Role::User, "a").unwrap();
        store.add_message("it", Role::User, "b").unwrap();
        store.add_message("hr", Role::User, "c").unwrap();
        let all: Vec<_> = store.get_messages(None).into_iter().map(|m| m.content).collect();
        assert_eq!(all, ["a", "b", "c"]);
    }

    #[test]
    fn test_timestamps_monotonic() {
        let store = MessageStore::new();
        for i in 0..50 {
            store.add_message("ops", Role::User, format!("m{i}")).unwrap();
        }
        let messages = store.get_messages(None);
        assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_content_bound_counts_characters() {
        let store = MessageStore::with_max_chars(4);
        assert!(store.add_message("hr", Role::User, "ééàà").is_ok());
        let err = store.add_message("hr", Role::User, "abcde").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_default_bound_is_4000() {
        let store = MessageStore::new();
        assert!(store.add_message("hr", Role::User, "x".repeat(4000)).is_ok());
        assert!(store.add_message("hr", Role::User, "x".repeat(4001)).is_err());
    }

    #[test]
    fn test_blank_department_rejected() {
        let store = MessageStore::new();
        assert!(store.add_message("", Role::User, "hi").unwrap_err().is_validation());
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_turn_is_all_or_nothing() {
        let store = MessageStore::with_max_chars(20);
        let err = store
            .append_turn("hr", "hi", "a reply that is well over twenty characters")
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());

        let (user, reply) = store.append_turn("hr", "hi", "hello").unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(reply.role, Role::Assistant);
        assert!(user.created_at <= reply.created_at);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_wire_format() {
        let store = MessageStore::new();
        let msg = store.add_message("hr", Role::Assistant, "hello").unwrap();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["departmentId"], "hr");
        assert!(json["createdAt"].is_i64());
    }
}
