//! 对话记录（仅内存）
//!
//! 助手回复以流式片段到达：update_streaming 追加到当前未结束的助手消息，
//! finalize_streaming 结束该消息。用户可发送文本或语音（语音只记录占位）。

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// 用户消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMessageKind {
    Text,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    /// 用户消息的输入方式；助手消息为 None
    pub kind: Option<UserMessageKind>,
    /// 助手消息是否仍在流式输出
    pub streaming: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String, kind: Option<UserMessageKind>, streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            kind,
            streaming,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    last_user_kind: Option<UserMessageKind>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加助手流式片段；当前无未结束的助手消息时新建一条
    pub fn update_streaming(&mut self, chunk: &str) {
        match self.messages.last_mut() {
            Some(msg) if msg.role == ChatRole::Assistant && msg.streaming => msg.content.push_str(chunk),
            _ => self
                .messages
                .push(ChatMessage::new(ChatRole::Assistant, chunk.to_string(), None, true)),
        }
    }

    /// 结束当前流式消息（无流式消息时无操作）
    pub fn finalize_streaming(&mut self) {
        if let Some(msg) = self.messages.last_mut() {
            if msg.streaming {
                msg.streaming = false;
            }
        }
    }

    /// 一轮对话结束：结束流式消息并清空本轮的用户消息类型
    pub fn end_turn(&mut self) {
        self.finalize_streaming();
        self.last_user_kind = None;
    }

    pub fn add_user_text(&mut self, text: &str) {
        self.messages.push(ChatMessage::new(
            ChatRole::User,
            text.to_string(),
            Some(UserMessageKind::Text),
            false,
        ));
        self.last_user_kind = Some(UserMessageKind::Text);
    }

    pub fn add_user_audio(&mut self) {
        self.messages.push(ChatMessage::new(
            ChatRole::User,
            "Audio message".to_string(),
            Some(UserMessageKind::Audio),
            false,
        ));
        self.last_user_kind = Some(UserMessageKind::Audio);
    }

    /// 本轮最近一条用户消息的类型；end_turn 后重置
    pub fn last_user_message_kind(&self) -> Option<UserMessageKind> {
        self.last_user_kind
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.last_user_kind = None;
    }
}
