//! getContactInfo：读取 #contacto 区块中的邮箱与电话

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::page::{selectors, PageAccessor};
use crate::tools::{ParameterSchema, Tool, ToolDeclaration};

pub const NAME: &str = "getContactInfo";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
}

pub struct GetContactInfoTool {
    page: Arc<dyn PageAccessor>,
}

impl GetContactInfoTool {
    pub fn new(page: Arc<dyn PageAccessor>) -> Self {
        Self { page }
    }

    /// 区块不存在时为 None
    pub fn contact(&self) -> Option<ContactInfo> {
        self.page.activate_navigation(selectors::CONTACT);
        let section = self.page.find_section(selectors::CONTACT)?;
        Some(ContactInfo {
            email: section.first_text(selectors::CONTACT_EMAIL).unwrap_or_default(),
            phone: section.first_text(selectors::CONTACT_PHONE).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Tool for GetContactInfoTool {
    fn declaration(&self) -> Option<ToolDeclaration> {
        Some(ToolDeclaration {
            name: NAME.to_string(),
            description: "Devuelve el correo electrónico y el teléfono de contacto que aparecen en la sección de contacto.".to_string(),
            parameters: ParameterSchema::empty(),
        })
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        match self.contact() {
            Some(info) => serde_json::to_value(info).map_err(ToolError::serialization),
            None => Ok(Value::Object(serde_json::Map::new())),
        }
    }
}
