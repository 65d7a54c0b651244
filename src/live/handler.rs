//! 工具调用处理：把一条 toolCall 中的所有函数调用并发交给 ToolRegistry，
//! 按请求顺序汇总为 toolResponse。

use std::sync::Arc;

use futures_util::future::join_all;

use crate::live::message::{FunctionResponse, ToolCall, ToolResponse};
use crate::tools::{CallRequest, ToolRegistry};

#[derive(Clone)]
pub struct ToolCallHandler {
    registry: Arc<ToolRegistry>,
}

impl ToolCallHandler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn handle(&self, call: &ToolCall) -> ToolResponse {
        let pending = call.function_calls.iter().map(|fc| {
            let registry = &self.registry;
            async move {
                let result = registry.dispatch(CallRequest::from(fc)).await;
                FunctionResponse::from_result(fc.name.clone(), result)
            }
        });
        ToolResponse {
            function_responses: join_all(pending).await,
        }
    }
}
