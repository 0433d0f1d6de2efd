// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message types for LLM interactions
//!
//! A [`Conversation`] is an ordered list of [`Message`] turns. Each turn is
//! made of typed [`ContentBlock`]s: plain text, a tool invocation requested by
//! the model, or the result of such an invocation sent back as user content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: Uuid,

    /// Role of the message sender
    pub role: Role,

    /// Content blocks, in the order the model produced them
    pub content: Vec<ContentBlock>,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message (typed input or tool results)
    User,
    /// Assistant response
    Assistant,
}

/// A block of content within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Tool use request from assistant
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool result from user
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl Message {
    fn with_blocks(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_blocks(Role::User, vec![ContentBlock::Text { text: text.into() }])
    }

    /// Create a new assistant text message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::with_blocks(
            Role::Assistant,
            vec![ContentBlock::Text { text: text.into() }],
        )
    }

    /// Create a new assistant message with content blocks
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self::with_blocks(Role::Assistant, blocks)
    }

    /// Create a user message carrying tool results
    pub fn tool_results(blocks: Vec<ContentBlock>) -> Self {
        Self::with_blocks(Role::User, blocks)
    }

    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Tool use blocks as `(id, name, input)` in block order
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }

    /// Check if message has any tool use
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Conversation history
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// All messages in the conversation
    pub messages: Vec<Message>,

    /// System prompt (if any)
    pub system_prompt: Option<String>,
}

impl Conversation {
    /// Create a new empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation with a system prompt
    pub fn with_system(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![],
            system_prompt: Some(system_prompt.into()),
        }
    }

    /// Add a message to the conversation
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Get the last assistant message
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Check if the conversation is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Drop every message after the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Clear all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
        assert!(!msg.has_tool_use());
    }

    #[test]
    fn test_message_text_concatenates_blocks() {
        let msg = Message::assistant_blocks(vec![
            ContentBlock::Text {
                text: "Let me ".to_string(),
            },
            ContentBlock::ToolUse {
                id: "t1".to_string(),
                name: "read_file".to_string(),
                input: json!({"path": "a.txt"}),
            },
            ContentBlock::Text {
                text: "check.".to_string(),
            },
        ]);
        assert_eq!(msg.text(), "Let me check.");
        assert!(msg.has_tool_use());

        let uses = msg.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].0, "t1");
        assert_eq!(uses[0].1, "read_file");
    }

    #[test]
    fn test_tool_result_serializes_without_false_error_flag() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "t1".to_string(),
            content: "ok".to_string(),
            is_error: false,
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert!(value.get("is_error").is_none());

        let block = ContentBlock::ToolResult {
            tool_use_id: "t1".to_string(),
            content: "boom".to_string(),
            is_error: true,
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["is_error"], true);
    }

    #[test]
    fn test_tool_result_deserializes_missing_error_flag() {
        let block: ContentBlock = serde_json::from_value(json!({
            "type": "tool_result",
            "tool_use_id": "t1",
            "content": "ok"
        }))
        .unwrap();
        assert_eq!(
            block,
            ContentBlock::ToolResult {
                tool_use_id: "t1".to_string(),
                content: "ok".to_string(),
                is_error: false,
            }
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_conversation_truncate() {
        let mut conv = Conversation::with_system("be brief");
        conv.push(Message::user("one"));
        conv.push(Message::assistant("two"));
        conv.push(Message::user("three"));
        assert_eq!(conv.len(), 3);

        conv.truncate(1);
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.last().unwrap().text(), "one");
        assert!(conv.last_assistant().is_none());
        assert_eq!(conv.system_prompt.as_deref(), Some("be brief"));
    }
}
