//! # BizDesk Memory
//!
//! Department chat history: an append-only message store, the stateless
//! reply generator, and the chat service that sequences the two.

pub mod chat;
pub mod messages;
pub mod responder;

pub use chat::ChatService;
pub use messages::{ChatMessage, MessageStore, Role};
pub use responder::{KeywordResponder, ResponseGenerator};
