//! 调用请求 JSON Schema 生成（schemars）
//!
//! 描述 `{name, args, id}` 的合法结构，供调试与外部编排器校验入站调用。

use schemars::schema_for;

use crate::tools::CallRequest;

/// 返回 CallRequest 的 JSON Schema 字符串
pub fn call_request_schema_json() -> String {
    let schema = schema_for!(CallRequest);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}
