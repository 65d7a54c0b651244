//! Seguros - 保险官网对话助手的工具核心
//!
//! 模块划分：
//! - **assistant**: 装配（注册内置能力、默认系统指令、创建会话）
//! - **chat**: 内存中的对话记录
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **live**: 实时会话消息、工具调用处理与编排（传输由外部提供）
//! - **observability**: 日志初始化
//! - **page**: 页面访问抽象（HTML 片段、选择器约定、PageAccessor）
//! - **tools**: 工具注册表与五个内置能力

pub mod assistant;
pub mod chat;
pub mod config;
pub mod core;
pub mod live;
pub mod observability;
pub mod page;
pub mod tools;

pub use assistant::{build_registry, build_registry_with, create_session};
pub use tools::{CallRequest, CallResult, Tool, ToolDeclaration, ToolRegistry};
