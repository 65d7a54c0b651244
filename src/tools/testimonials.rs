//! getTestimonials：读取 #testimonios 区块中的客户评价

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::page::{selectors, PageAccessor};
use crate::tools::{ParameterSchema, Tool, ToolDeclaration};

pub const NAME: &str = "getTestimonials";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
}

/// 去掉作者前的「— 」前缀
fn clean_author(raw: &str) -> String {
    raw.strip_prefix('—')
        .map(str::trim_start)
        .unwrap_or(raw)
        .trim()
        .to_string()
}

pub struct GetTestimonialsTool {
    page: Arc<dyn PageAccessor>,
}

impl GetTestimonialsTool {
    pub fn new(page: Arc<dyn PageAccessor>) -> Self {
        Self { page }
    }

    /// 区块不存在时为空
    pub fn testimonials(&self) -> Vec<Testimonial> {
        self.page.activate_navigation(selectors::TESTIMONIALS);
        let Some(section) = self.page.find_section(selectors::TESTIMONIALS) else {
            return Vec::new();
        };
        section
            .select(selectors::TESTIMONIAL)
            .iter()
            .map(|item| Testimonial {
                quote: item.first_text(selectors::TESTIMONIAL_QUOTE).unwrap_or_default(),
                author: item
                    .first_text(selectors::TESTIMONIAL_AUTHOR)
                    .map(|a| clean_author(&a))
                    .unwrap_or_default(),
            })
            .collect()
    }
}

#[async_trait]
impl Tool for GetTestimonialsTool {
    fn declaration(&self) -> Option<ToolDeclaration> {
        Some(ToolDeclaration {
            name: NAME.to_string(),
            description: "Devuelve una lista de testimonios de clientes con texto y autor.".to_string(),
            parameters: ParameterSchema::empty(),
        })
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        serde_json::to_value(self.testimonials()).map_err(ToolError::serialization)
    }
}
