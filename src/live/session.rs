//! 实时会话编排（不含传输）
//!
//! 消费服务端消息：转写/文本片段写入对话记录，turnComplete / interrupted 结束流式消息，
//! toolCall 交给 ToolCallHandler 并返回待发送的 toolResponse。
//! WebSocket 连接与音频采集/播放由外部负责，只需把收到的文本帧交给 on_server_message。

use crate::chat::ChatTranscript;
use crate::config::AppConfig;
use crate::live::handler::ToolCallHandler;
use crate::live::message::{ClientContent, ClientMessage, ServerMessage, Setup};

pub struct LiveSession {
    handler: ToolCallHandler,
    transcript: ChatTranscript,
    ready: bool,
}

impl LiveSession {
    pub fn new(handler: ToolCallHandler) -> Self {
        Self {
            handler,
            transcript: ChatTranscript::new(),
            ready: false,
        }
    }

    /// 连接建立后首先发送的 setup（函数声明取自注册表）
    pub fn setup_message(&self, cfg: &AppConfig, system_instruction: &str) -> ClientMessage {
        ClientMessage::Setup(Setup::from_config(
            cfg,
            system_instruction,
            self.handler.registry().describe_all(),
        ))
    }

    /// 用户输入文本
    pub fn send_text(&mut self, text: &str) -> ClientMessage {
        self.transcript.finalize_streaming();
        self.transcript.add_user_text(text);
        ClientMessage::ClientContent(ClientContent::user_text(text))
    }

    /// 处理一条服务端消息，返回需要回发的消息
    pub async fn on_server_message(&mut self, msg: ServerMessage) -> Vec<ClientMessage> {
        let mut outbound = Vec::new();

        if msg.setup_complete.is_some() {
            tracing::info!("live session setup complete");
            self.ready = true;
        }

        if let Some(content) = msg.server_content {
            let chunk = content
                .output_transcription
                .map(|t| t.text)
                .or_else(|| content.model_turn.map(|turn| turn.joined_text()))
                .unwrap_or_default();
            if !chunk.is_empty() {
                self.transcript.update_streaming(&chunk);
            }
            if content.interrupted {
                self.transcript.finalize_streaming();
                // 用户通过语音打断，本轮尚无用户消息时补一条语音占位
                if self.transcript.last_user_message_kind().is_none() {
                    self.transcript.add_user_audio();
                }
            }
            if content.turn_complete {
                self.transcript.end_turn();
            }
        }

        if let Some(call) = msg.tool_call {
            tracing::info!(calls = call.function_calls.len(), "tool call received");
            let response = self.handler.handle(&call).await;
            outbound.push(ClientMessage::ToolResponse(response));
        }

        if let Some(cancel) = msg.tool_call_cancellation {
            // 执行在返回 toolResponse 前已完成，此处只记录
            tracing::warn!(ids = ?cancel.ids, "tool call cancellation ignored");
        }

        outbound
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatRole, UserMessageKind};
    use crate::tools::ToolRegistry;
    use std::sync::Arc;

    fn session() -> LiveSession {
        LiveSession::new(ToolCallHandler::new(Arc::new(ToolRegistry::new())))
    }

    #[tokio::test]
    async fn test_transcription_and_turn_complete() {
        let mut s = session();
        s.on_server_message(ServerMessage::parse(r#"{"setupComplete": {}}"#).unwrap()).await;
        assert!(s.is_ready());

        let out = s.send_text("Hola");
        assert!(matches!(out, ClientMessage::ClientContent(_)));

        for text in ["Claro, ", "te ayudo."] {
            let msg = ServerMessage::parse(&format!(
                r#"{{"serverContent": {{"outputTranscription": {{"text": "{text}"}}}}}}"#
            ))
            .unwrap();
            assert!(s.on_server_message(msg).await.is_empty());
        }
        s.on_server_message(ServerMessage::parse(r#"{"serverContent": {"turnComplete": true}}"#).unwrap())
            .await;

        let msgs = s.transcript().messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].role, ChatRole::Assistant);
        assert_eq!(msgs[1].content, "Claro, te ayudo.");
        assert!(!msgs[1].streaming);
        assert!(s.transcript().last_user_message_kind().is_none());
    }

    #[tokio::test]
    async fn test_interrupt_adds_audio_placeholder() {
        let mut s = session();
        s.on_server_message(
            ServerMessage::parse(r#"{"serverContent": {"modelTurn": {"parts": [{"text": "Bien"}]}}}"#).unwrap(),
        )
        .await;
        s.on_server_message(ServerMessage::parse(r#"{"serverContent": {"interrupted": true}}"#).unwrap())
            .await;
        let msgs = s.transcript().messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].kind, Some(UserMessageKind::Audio));
    }

    #[tokio::test]
    async fn test_tool_call_produces_response() {
        let mut s = session();
        let out = s
            .on_server_message(
                ServerMessage::parse(r#"{"toolCall": {"functionCalls": [{"id": "1", "name": "x"}]}}"#).unwrap(),
            )
            .await;
        assert_eq!(out.len(), 1);
        match &out[0] {
            ClientMessage::ToolResponse(resp) => {
                assert_eq!(resp.function_responses[0].id, "1");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
