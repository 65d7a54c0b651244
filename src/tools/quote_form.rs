//! fillQuoteForm：填写 #cotizacion 区块的报价表单，send=true 时提交到 Webhook
//!
//! tipo / nombre / email 总是写入；telefono 仅在非空时写入（保留页面上已有的值）。
//! 提交为至多一次：不做自动重试。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::ToolError;
use crate::page::{selectors, PageAccessor, PageError};
use crate::tools::registry::null_as_default;
use crate::tools::{ParameterSchema, PropertySchema, Tool, ToolDeclaration};

pub const NAME: &str = "fillQuoteForm";

/// 未提交时的确认文本
pub const FILLED_NOT_SENT: &str = "Formulario completado (no enviado)";
/// 提交成功的确认文本
pub const SENT: &str = "Solicitud de cotización enviada correctamente";

/// 提交到 Webhook 的报价请求体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub tipo: String,
    pub nombre: String,
    pub email: String,
    pub telefono: String,
}

/// 所有参数可缺省；显式 null 与缺省等价
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteArgs {
    #[serde(deserialize_with = "null_as_default")]
    tipo: String,
    #[serde(deserialize_with = "null_as_default")]
    nombre: String,
    #[serde(deserialize_with = "null_as_default")]
    email: String,
    #[serde(deserialize_with = "null_as_default")]
    telefono: String,
    #[serde(deserialize_with = "null_as_default")]
    send: bool,
}

/// 报价提交通道
#[async_trait]
pub trait QuoteSubmitter: Send + Sync {
    async fn submit(&self, quote: &QuoteRequest) -> Result<(), ToolError>;
}

/// 通过 HTTP POST（JSON）提交到固定 Webhook
pub struct WebhookSubmitter {
    client: Client,
    url: String,
}

impl WebhookSubmitter {
    /// timeout_secs 为 None 时不设客户端超时
    pub fn new(url: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self, ToolError> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ToolError::Client(format!("Failed to build webhook client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuoteSubmitter for WebhookSubmitter {
    async fn submit(&self, quote: &QuoteRequest) -> Result<(), ToolError> {
        tracing::info!(url = %self.url, tipo = %quote.tipo, "submitting quote request");
        let resp = self
            .client
            .post(&self.url)
            .json(quote)
            .send()
            .await
            .map_err(|e| ToolError::Network(format!("Request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::Webhook {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(())
    }
}

/// 报价表单工具
pub struct FillQuoteFormTool {
    page: Arc<dyn PageAccessor>,
    submitter: Arc<dyn QuoteSubmitter>,
}

impl FillQuoteFormTool {
    pub fn new(page: Arc<dyn PageAccessor>, submitter: Arc<dyn QuoteSubmitter>) -> Self {
        Self { page, submitter }
    }

    fn write(&self, field: &str, value: &str) -> Result<(), ToolError> {
        self.page
            .set_form_value(selectors::QUOTE, field, value)
            .map_err(|e| match e {
                PageError::ControlNotFound(control) => {
                    ToolError::NotFound(format!("Control {control} no encontrado en el formulario"))
                }
                other => other.into(),
            })
    }
}

#[async_trait]
impl Tool for FillQuoteFormTool {
    fn declaration(&self) -> Option<ToolDeclaration> {
        let text = |d: &str| PropertySchema::string(d).with_default(Value::String(String::new()));
        Some(ToolDeclaration {
            name: NAME.to_string(),
            description: "Rellena el formulario de cotización con los datos proporcionados y, si `send` es true, envía la solicitud a un webhook de n8n.".to_string(),
            parameters: ParameterSchema::empty()
                .property("tipo", text("Tipo de seguro (hogar-basico, hogar-premium, auto-basico, auto-premium, salud-basico, salud-premium)"))
                .property("nombre", text("Nombre completo del cliente"))
                .property("email", text("Correo electrónico del cliente"))
                .property("telefono", text("Teléfono del cliente"))
                .property(
                    "send",
                    PropertySchema::boolean("Si es true, envía la solicitud al webhook")
                        .with_default(Value::Bool(false)),
                ),
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: QuoteArgs = if args.is_null() {
            QuoteArgs::default()
        } else {
            serde_json::from_value(args).map_err(ToolError::invalid_arguments)?
        };

        self.page.activate_navigation(selectors::QUOTE);
        let section = self.page.find_section(selectors::QUOTE).ok_or_else(|| {
            ToolError::NotFound(format!("Sección #{} no encontrada", selectors::QUOTE))
        })?;
        if !self.page.has_form(&section) {
            return Err(ToolError::NotFound(format!(
                "Formulario dentro de #{} no encontrado",
                selectors::QUOTE
            )));
        }

        self.write("tipo", &args.tipo)?;
        self.write("nombre", &args.nombre)?;
        self.write("email", &args.email)?;
        if !args.telefono.is_empty() {
            self.write("telefono", &args.telefono)?;
        }

        if !args.send {
            return Ok(Value::String(FILLED_NOT_SENT.to_string()));
        }

        let quote = QuoteRequest {
            tipo: args.tipo,
            nombre: args.nombre,
            email: args.email,
            telefono: args.telefono,
        };
        self.submitter.submit(&quote).await?;
        Ok(Value::String(SENT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::DomPage;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSubmitter {
        sent: Mutex<Vec<QuoteRequest>>,
    }

    #[async_trait]
    impl QuoteSubmitter for RecordingSubmitter {
        async fn submit(&self, quote: &QuoteRequest) -> Result<(), ToolError> {
            self.sent.lock().unwrap().push(quote.clone());
            Ok(())
        }
    }

    const QUOTE_PAGE: &str = r##"<html><body>
        <header><nav><a href="#cotizacion">Cotiza</a></nav></header>
        <section id="cotizacion">
          <form>
            <select name="tipo"></select>
            <input name="nombre">
            <input name="email">
            <input name="telefono" value="555-1234">
          </form>
        </section>
    </body></html>"##;

    fn quote_page() -> Arc<DomPage> {
        Arc::new(DomPage::new(QUOTE_PAGE))
    }

    #[tokio::test]
    async fn test_fill_without_send() {
        let page = quote_page();
        let submitter = Arc::new(RecordingSubmitter::default());
        let tool = FillQuoteFormTool::new(page.clone(), submitter.clone());

        let out = tool
            .execute(json!({"tipo": "auto-premium", "nombre": "Ana", "email": "ana@correo.mx"}))
            .await
            .unwrap();

        assert_eq!(out, json!(FILLED_NOT_SENT));
        assert!(submitter.sent.lock().unwrap().is_empty());
        assert_eq!(page.current_location().as_deref(), Some("cotizacion"));
        assert_eq!(page.form_value("cotizacion", "tipo").as_deref(), Some("auto-premium"));
        assert_eq!(page.form_value("cotizacion", "email").as_deref(), Some("ana@correo.mx"));
        // 未提供 telefono，保留原值
        assert_eq!(page.form_value("cotizacion", "telefono").as_deref(), Some("555-1234"));
    }

    #[tokio::test]
    async fn test_send_submits_once() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let tool = FillQuoteFormTool::new(quote_page(), submitter.clone());

        let out = tool
            .execute(json!({"nombre": "Luis", "telefono": "555-9999", "send": true}))
            .await
            .unwrap();

        assert_eq!(out, json!(SENT));
        let sent = submitter.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            QuoteRequest {
                tipo: String::new(),
                nombre: "Luis".to_string(),
                email: String::new(),
                telefono: "555-9999".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_section_is_not_found() {
        let tool = FillQuoteFormTool::new(
            Arc::new(DomPage::empty()),
            Arc::new(RecordingSubmitter::default()),
        );
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert!(err.to_string().contains("#cotizacion"));
    }

    #[tokio::test]
    async fn test_missing_form_is_not_found() {
        let page = DomPage::new(r#"<section id="cotizacion"><p>Pronto</p></section>"#);
        let tool = FillQuoteFormTool::new(Arc::new(page), Arc::new(RecordingSubmitter::default()));
        let err = tool.execute(Value::Null).await.unwrap_err();
        assert!(err.to_string().contains("Formulario"));
    }

    #[tokio::test]
    async fn test_null_arguments_count_as_missing() {
        let page = quote_page();
        let submitter = Arc::new(RecordingSubmitter::default());
        let tool = FillQuoteFormTool::new(page.clone(), submitter.clone());

        let out = tool
            .execute(json!({"nombre": "Ana", "telefono": null, "email": null, "send": null}))
            .await
            .unwrap();

        assert_eq!(out, json!(FILLED_NOT_SENT));
        assert!(submitter.sent.lock().unwrap().is_empty());
        assert_eq!(page.form_value("cotizacion", "nombre").as_deref(), Some("Ana"));
        assert_eq!(page.form_value("cotizacion", "email").as_deref(), Some(""));
        assert_eq!(page.form_value("cotizacion", "telefono").as_deref(), Some("555-1234"));
    }

    #[test]
    fn test_webhook_submitter_keeps_url() {
        let submitter = WebhookSubmitter::new("http://localhost:9/hook", Some(3)).unwrap();
        assert_eq!(submitter.url(), "http://localhost:9/hook");
    }

    #[tokio::test]
    async fn test_wrong_argument_type() {
        let tool = FillQuoteFormTool::new(quote_page(), Arc::new(RecordingSubmitter::default()));
        let err = tool.execute(json!({"send": "yes"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
