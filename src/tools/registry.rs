//! 工具注册表
//!
//! 所有能力实现 Tool trait（declaration / execute），由 ToolRegistry 按名注册；
//! describe_all 生成给远端模型的函数声明，dispatch 执行模型发起的调用并统一转为 CallResult。
//!
//! dispatch 是不可信调用与宿主之间的隔离边界：未知名称、执行错误、panic 都转成 CallResult.error，
//! 每个 CallRequest.id 恰好对应一个 CallResult。

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures_util::FutureExt;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::ToolError;

/// 单个参数的描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    fn typed(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: Some(description.to_string()),
            items: None,
            default: None,
        }
    }

    pub fn string(description: &str) -> Self {
        Self::typed("string", description)
    }

    pub fn boolean(description: &str) -> Self {
        Self::typed("boolean", description)
    }

    pub fn string_array(description: &str) -> Self {
        Self {
            items: Some(Box::new(PropertySchema {
                kind: "string".to_string(),
                description: None,
                items: None,
                default: None,
            })),
            ..Self::typed("array", description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// 参数 schema：`{type: "object", properties, required}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, PropertySchema>,
    pub required: Vec<String>,
}

impl ParameterSchema {
    /// 无参数
    pub fn empty() -> Self {
        Self {
            kind: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn require(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self::empty()
    }
}

/// 能力声明（供远端模型理解名称、用途与参数），注册后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: ParameterSchema,
}

/// 工具 trait：声明 + 异步执行（args 为 JSON 对象）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 函数声明；返回 None 表示该工具不向模型公开声明（describe_all 会跳过并告警）
    fn declaration(&self) -> Option<ToolDeclaration> {
        None
    }

    /// 执行工具
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// 模型发起的调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CallRequest {
    /// 已注册的能力名，如 getPageInsuranceData、fillQuoteForm
    pub name: String,
    /// 参数对象，依能力不同而不同
    #[serde(default)]
    pub args: Value,
    /// 关联 ID，原样回填到 CallResult.id
    pub id: String,
}

impl CallRequest {
    pub fn new(name: impl Into<String>, args: Value, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args,
            id: id.into(),
        }
    }
}

/// 可选参数的反序列化：模型传 null 时按缺省值处理
///
/// 与 `#[serde(default)]` 搭配使用：字段缺失和显式 null 得到同样的结果。
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 调用结果：成功时 error 为 null，失败时 output 为 null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub output: Value,
    pub id: String,
    pub error: Option<String>,
}

impl CallResult {
    pub fn success(id: impl Into<String>, output: Value) -> Self {
        Self {
            output,
            id: id.into(),
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: Value::Null,
            id: id.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，保留注册顺序
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；名称已存在时拒绝并告警，保留先注册者。返回是否插入。
    pub fn register(&mut self, name: impl Into<String>, tool: impl Tool + 'static) -> bool {
        self.register_arc(name, Arc::new(tool))
    }

    pub fn register_arc(&mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> bool {
        let name = name.into();
        if self.tools.contains_key(&name) {
            tracing::warn!(tool = %name, "tool already registered, keeping the first registration");
            return false;
        }
        self.tools.insert(name.clone(), tool);
        tracing::info!(tool = %name, "tool registered");
        self.order.push(name);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按注册顺序返回名称
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// 所有工具的声明（注册顺序）；没有声明的工具被跳过
    pub fn describe_all(&self) -> Vec<ToolDeclaration> {
        self.order
            .iter()
            .filter_map(|name| {
                let decl = self.tools.get(name).and_then(|tool| tool.declaration());
                if decl.is_none() {
                    tracing::warn!(tool = %name, "tool has no declaration, skipped");
                }
                decl
            })
            .collect()
    }

    /// 声明数组的 JSON 文本
    pub fn to_schema_json(&self) -> String {
        serde_json::to_string_pretty(&self.describe_all()).unwrap_or_else(|_| "[]".to_string())
    }

    /// 执行一次调用；永不失败，错误写入 CallResult.error。输出 JSON 审计日志。
    pub async fn dispatch(&self, request: CallRequest) -> CallResult {
        let CallRequest { name, args, id } = request;
        let start = Instant::now();
        let preview = args_preview(&args);
        tracing::info!(tool = %name, id = %id, args = %preview, "handling tool call");

        let result = match self.tools.get(&name).cloned() {
            None => Err(ToolError::UnknownCapability(name.clone())),
            Some(tool) => match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Err(ToolError::Panicked(panic_message(panic.as_ref()))),
            },
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ToolError::UnknownCapability(_)) => "unknown",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": name,
            "id": id,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": preview,
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(output) => CallResult::success(id, output),
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "tool execution failed");
                CallResult::failure(id, e.to_string())
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn declaration(&self) -> Option<ToolDeclaration> {
            Some(ToolDeclaration {
                name: "named".to_string(),
                description: self.0.to_string(),
                parameters: ParameterSchema::empty(),
            })
        }

        async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
            Ok(json!(self.0))
        }
    }

    /// 没有声明的工具
    struct Undeclared;

    #[async_trait]
    impl Tool for Undeclared {
        async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
            Ok(Value::Null)
        }
    }

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
            Err(ToolError::NotFound("Sección #cotizacion no encontrada".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Tool for Panicking {
        async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
            panic!("boom");
        }
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut reg = ToolRegistry::new();
        assert!(reg.register("named", Named("first")));
        assert!(!reg.register("named", Named("second")));
        assert_eq!(reg.len(), 1);
        let decls = reg.describe_all();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].description, "first");
    }

    #[test]
    fn test_describe_all_skips_undeclared() {
        let mut reg = ToolRegistry::new();
        reg.register("undeclared", Undeclared);
        reg.register("named", Named("x"));
        let decls = reg.describe_all();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "named");
        assert_eq!(reg.tool_names(), vec!["undeclared", "named"]);
    }

    #[tokio::test]
    async fn test_dispatch_success_echoes_id() {
        let mut reg = ToolRegistry::new();
        reg.register("named", Named("hola"));
        let res = reg.dispatch(CallRequest::new("named", json!({}), "call-1")).await;
        assert_eq!(res, CallResult::success("call-1", json!("hola")));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_capability() {
        let reg = ToolRegistry::new();
        let res = reg.dispatch(CallRequest::new("googleSearch", json!({}), "call-2")).await;
        assert_eq!(res.id, "call-2");
        assert_eq!(res.output, Value::Null);
        assert_eq!(res.error.as_deref(), Some("Unknown capability: googleSearch"));
    }

    #[tokio::test]
    async fn test_dispatch_failure_and_panic_are_isolated() {
        let mut reg = ToolRegistry::new();
        reg.register("failing", Failing);
        reg.register("panicking", Panicking);

        let res = reg.dispatch(CallRequest::new("failing", Value::Null, "a")).await;
        assert_eq!(res.id, "a");
        assert!(res.error.unwrap().contains("#cotizacion"));

        let res = reg.dispatch(CallRequest::new("panicking", Value::Null, "b")).await;
        assert_eq!(res.id, "b");
        assert!(res.error.unwrap().contains("boom"));
    }

    #[test]
    fn test_null_as_default() {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default, deserialize_with = "null_as_default")]
            text: String,
            #[serde(default, deserialize_with = "null_as_default")]
            flag: bool,
        }
        let args: Args = serde_json::from_value(json!({"text": null, "flag": null})).unwrap();
        assert_eq!(args.text, "");
        assert!(!args.flag);
        let args: Args = serde_json::from_value(json!({})).unwrap();
        assert_eq!(args.text, "");
        let args: Args = serde_json::from_value(json!({"text": "x", "flag": true})).unwrap();
        assert_eq!(args.text, "x");
        assert!(args.flag);
        assert!(serde_json::from_value::<Args>(json!({"text": 1})).is_err());
    }

    #[test]
    fn test_call_result_wire_shape() {
        let ok = serde_json::to_value(CallResult::success("1", json!([]))).unwrap();
        assert_eq!(ok, json!({"output": [], "id": "1", "error": null}));
        let err = serde_json::to_value(CallResult::failure("2", "x")).unwrap();
        assert_eq!(err, json!({"output": null, "id": "2", "error": "x"}));
    }

    #[test]
    fn test_parameter_schema_shape() {
        let schema = ParameterSchema::empty()
            .property("send", PropertySchema::boolean("enviar").with_default(json!(false)))
            .property("products", PropertySchema::string_array("IDs"))
            .require("products");
        let v = serde_json::to_value(schema).unwrap();
        assert_eq!(v["type"], "object");
        assert_eq!(v["properties"]["send"], json!({"type": "boolean", "description": "enviar", "default": false}));
        assert_eq!(v["properties"]["products"]["items"], json!({"type": "string"}));
        assert_eq!(v["required"], json!(["products"]));
    }
}
