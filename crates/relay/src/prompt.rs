//! Prompt assembly.

use chatrelay_core::message::{ChatMessage, Message};

/// The ordered messages sent to the completion endpoint for one turn.
///
/// Only [`assemble`] builds one, so the first entry is always the system
/// directive and the last is always the inbound user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSequence {
    messages: Vec<ChatMessage>,
}

impl PromptSequence {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Never true; a sequence holds at least the directive and the new message.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn first(&self) -> Option<&ChatMessage> {
        self.messages.first()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}

/// `[system directive] ++ window ++ [new user message]`.
///
/// Window entries keep their stored role and content unchanged.
pub fn assemble(system_directive: &str, window: &[Message], new_message: &str) -> PromptSequence {
    let mut messages = Vec::with_capacity(window.len() + 2);
    messages.push(ChatMessage::system(system_directive));
    messages.extend(window.iter().map(Message::to_chat));
    messages.push(ChatMessage::user(new_message));
    PromptSequence { messages }
}
