//! Chat service: appends a user message, generates the reply, appends it.

use std::sync::Arc;

use bizdesk_core::{BizDeskError, DepartmentRegistry, Result};

use crate::messages::{ChatMessage, MessageStore};
use crate::responder::{KeywordResponder, ResponseGenerator};

/// Sequences a chat submission against the message store and responder.
#[derive(Clone)]
pub struct ChatService {
    registry: Arc<DepartmentRegistry>,
    messages: Arc<MessageStore>,
    responder: Arc<dyn ResponseGenerator>,
}

impl ChatService {
    pub fn new(
        registry: Arc<DepartmentRegistry>,
        messages: Arc<MessageStore>,
        responder: Arc<dyn ResponseGenerator>,
    ) -> Self {
        Self {
            registry,
            messages,
            responder,
        }
    }

    /// Service with the built-in keyword responder.
    pub fn with_keyword_responder(registry: Arc<DepartmentRegistry>, messages: Arc<MessageStore>) -> Self {
        Self::new(registry, messages, Arc::new(KeywordResponder))
    }

    pub fn messages(&self) -> &Arc<MessageStore> {
        &self.messages
    }

    /// Submit a user message. Returns the department's whole conversation.
    ///
    /// Over-long input is cut to the store's bound rather than rejected.
    pub fn submit(&self, department_id: &str, text: &str) -> Result<Vec<ChatMessage>> {
        self.registry.require_department(department_id)?;
        if text.trim().is_empty() {
            return Err(BizDeskError::validation("content is required"));
        }
        let content = truncate_chars(text, self.messages.max_chars());

        let reply = self.responder.generate_reply(department_id, &content);
        self.messages.append_turn(department_id, content, reply)?;

        tracing::info!("💬 [{}] chat turn recorded", department_id);
        Ok(self.messages.get_messages(Some(department_id)))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
