//! 工具与页面错误类型
//!
//! 所有能力（capability）执行失败都归入 ToolError，由 ToolRegistry::dispatch 在边界处
//! 转为 CallResult.error 字符串，不会向上冒泡到宿主页面或远端模型会话。

use thiserror::Error;

/// 页面访问层错误（选择器非法、表单控件缺失等）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Form control not found: {0}")]
    ControlNotFound(String),
}

/// 能力执行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum ToolError {
    /// 必需的 DOM 区块 / 表单 / 元素缺失（FillQuoteForm 视为硬失败）
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Webhook 返回非 2xx
    #[error("Webhook rejected the request: {status} {reason}")]
    Webhook { status: u16, reason: String },

    /// 传输层失败（连接、DNS、TLS 等）
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Capability panicked: {0}")]
    Panicked(String),

    /// 结果无法序列化为 JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP 客户端构建失败（TLS 后端、代理配置等）
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error(transparent)]
    Page(#[from] PageError),
}

impl ToolError {
    /// 入参反序列化失败
    pub fn invalid_arguments(e: serde_json::Error) -> Self {
        ToolError::InvalidArguments(e.to_string())
    }

    /// 输出序列化失败
    pub fn serialization(e: serde_json::Error) -> Self {
        ToolError::Serialization(e.to_string())
    }
}
