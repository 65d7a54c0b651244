//! compareInsurances：按价格比较所选产品并推荐最便宜的一个
//!
//! 价格取自 PricePolicy 指定的保障表单元格（默认第一行第二列），只保留数字与小数点后解析；
//! 无法解析的价格记为 +∞，排在最后。needs 参数被接受但不参与排序。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::ToolError;
use crate::tools::insurance_data::{InsuranceProduct, PageInsuranceDataTool};
use crate::tools::registry::null_as_default;
use crate::tools::{ParameterSchema, PropertySchema, Tool, ToolDeclaration};

pub const NAME: &str = "compareInsurances";

/// 价格在保障表中的位置：第 row 行、第 column 列（按表头顺序）
///
/// 解析结果为 0 时视为有效价格（如免费方案），会被排在最前面；
/// 只有缺少单元格或没有任何数字时才记为 +∞。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePolicy {
    pub row: usize,
    pub column: usize,
}

impl PricePolicy {
    /// 页面模板约定：第一行保障的第二列为价格
    pub const FIRST_ROW_SECOND_COLUMN: PricePolicy = PricePolicy { row: 0, column: 1 };

    /// 产品价格；缺行、缺列或无法解析时为 +∞
    pub fn price_of(&self, product: &InsuranceProduct) -> f64 {
        product
            .coverages
            .get(self.row)
            .and_then(|row| row.value_at(self.column))
            .and_then(parse_price)
            .unwrap_or(f64::INFINITY)
    }
}

impl Default for PricePolicy {
    fn default() -> Self {
        Self::FIRST_ROW_SECOND_COLUMN
    }
}

/// 去掉非数字、非小数点字符后，读取最长的前缀十进制数（"$1,250.00" → 1250.0）
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let mut seen_dot = false;
    let end = cleaned
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' {
                if seen_dot {
                    return true;
                }
                seen_dot = true;
            }
            false
        })
        .map(|(i, _)| i)
        .unwrap_or(cleaned.len());
    let number = &cleaned[..end];
    if !number.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

#[derive(Debug, Deserialize)]
struct CompareArgs {
    products: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    #[allow(dead_code)]
    needs: String,
}

/// 带数值价格的产品
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedProduct {
    #[serde(flatten)]
    pub product: InsuranceProduct,
    /// +∞ 序列化为 null
    #[serde(rename = "numericPrice")]
    pub numeric_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub recommended: Option<PricedProduct>,
    pub others: Vec<PricedProduct>,
}

/// 按页面顺序筛选 ids 中的产品并按价格升序（稳定）排序
pub fn compare(catalog: Vec<InsuranceProduct>, ids: &[String], policy: PricePolicy) -> Comparison {
    let mut priced: Vec<PricedProduct> = catalog
        .into_iter()
        .filter(|p| ids.contains(&p.id))
        .map(|product| PricedProduct {
            numeric_price: policy.price_of(&product),
            product,
        })
        .collect();
    priced.sort_by(|a, b| a.numeric_price.total_cmp(&b.numeric_price));
    Comparison {
        recommended: priced.first().cloned(),
        others: priced,
    }
}

/// 比较工具：内部复用 PageInsuranceDataTool 获取当前产品目录
pub struct CompareInsurancesTool {
    catalog: PageInsuranceDataTool,
    policy: PricePolicy,
}

impl CompareInsurancesTool {
    pub fn new(catalog: PageInsuranceDataTool) -> Self {
        Self {
            catalog,
            policy: PricePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PricePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_page(page: Arc<dyn crate::page::PageAccessor>) -> Self {
        Self::new(PageInsuranceDataTool::new(page))
    }
}

#[async_trait]
impl Tool for CompareInsurancesTool {
    fn declaration(&self) -> Option<ToolDeclaration> {
        Some(ToolDeclaration {
            name: NAME.to_string(),
            description: "Compara varios seguros según las necesidades del cliente y recomienda el mejor.".to_string(),
            parameters: ParameterSchema::empty()
                .property("products", PropertySchema::string_array("IDs de productos a comparar"))
                .property("needs", PropertySchema::string("Descripción de las necesidades del cliente"))
                .require("products")
                .require("needs"),
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: CompareArgs =
            serde_json::from_value(args).map_err(ToolError::invalid_arguments)?;
        let comparison = compare(self.catalog.products(), &args.products, self.policy);
        tracing::debug!(
            requested = args.products.len(),
            matched = comparison.others.len(),
            "insurance comparison"
        );
        serde_json::to_value(comparison).map_err(ToolError::serialization)
    }
}
