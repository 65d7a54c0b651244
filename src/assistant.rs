//! 助手装配
//!
//! 在会话开始时构建一次 ToolRegistry（注册五个内置能力），以引用方式交给编排层；
//! 同时提供默认系统指令。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::ToolError;
use crate::live::{LiveSession, ToolCallHandler};
use crate::page::PageAccessor;
use crate::tools::{
    compare, contact, insurance_data, quote_form, testimonials, CompareInsurancesTool,
    FillQuoteFormTool, GetContactInfoTool, GetTestimonialsTool, PageInsuranceDataTool,
    QuoteSubmitter, ToolRegistry, WebhookSubmitter,
};

/// 默认系统指令
pub const SYSTEM_INSTRUCTION: &str = "\
Eres un asistente de seguros que primero identifica la intención del usuario
y luego ejecuta directamente las herramientas necesarias, sin preguntar si puedes usarlas:

Tu flujo de interacción:
1. Identifica con precisión la intención principal del usuario.
2. Según esa intención, invoca una o varias herramientas, en este orden lógico:
    • Si la consulta se refiere a listar o explorar productos: getPageInsuranceData
    • Si la consulta implica comparar dos o más productos: compareInsurances
    • Si solicita llenar o enviar un formulario de cotización: fillQuoteForm
        Rellena solo los campos proporcionados y pide confirmación del email para enviar el formulario.
    • Si la consulta es sobre lo que dicen otros clientes: getTestimonials
    • Si la consulta es sobre cómo contactar a la empresa: getContactInfo

3. Tras ejecutar cada herramienta, reúne sus resultados (detalles de pólizas, comparativas,
    explicación de términos, confirmación de envío, testimonios o datos de contacto) y preséntalos
    en un único mensaje claro y conciso.

Si la petición no puede resolverse con estas herramientas ni con la navegación en el sitio,
responde:
“Lo siento, solo puedo ayudar con consultas sobre las pólizas disponibles, los testimonios,
los datos de contacto y tu navegación en este sitio web.”";

/// 注册五个内置能力，报价提交使用给定的 submitter
pub fn build_registry_with(
    page: Arc<dyn PageAccessor>,
    submitter: Arc<dyn QuoteSubmitter>,
) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(insurance_data::NAME, PageInsuranceDataTool::new(page.clone()));
    tools.register(compare::NAME, CompareInsurancesTool::from_page(page.clone()));
    tools.register(quote_form::NAME, FillQuoteFormTool::new(page.clone(), submitter));
    tools.register(testimonials::NAME, GetTestimonialsTool::new(page.clone()));
    tools.register(contact::NAME, GetContactInfoTool::new(page));
    tools
}

/// 按配置构建注册表（报价提交到配置的 Webhook）
pub fn build_registry(
    cfg: &AppConfig,
    page: Arc<dyn PageAccessor>,
) -> Result<ToolRegistry, ToolError> {
    let submitter = Arc::new(WebhookSubmitter::new(
        cfg.tools.webhook_url.clone(),
        cfg.tools.webhook_timeout_secs,
    )?);
    Ok(build_registry_with(page, submitter))
}

/// 构建实时会话（注册表只创建一次，由会话持有引用）
pub fn create_session(
    cfg: &AppConfig,
    page: Arc<dyn PageAccessor>,
) -> Result<LiveSession, ToolError> {
    let registry = Arc::new(build_registry(cfg, page)?);
    Ok(LiveSession::new(ToolCallHandler::new(registry)))
}
