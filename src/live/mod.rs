//! 实时会话：setup、工具调用处理与对话编排（传输由外部提供）

pub mod handler;
pub mod message;
pub mod session;

pub use handler::ToolCallHandler;
pub use message::{
    ClientContent, ClientMessage, FunctionCall, FunctionResponse, ServerMessage, Setup, ToolCall,
    ToolResponse,
};
pub use session::LiveSession;
