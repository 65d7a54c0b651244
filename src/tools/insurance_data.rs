//! getPageInsuranceData：读取 #productos 区块中的全部保险产品
//!
//! 每次调用都从当前页面重新构建（无缓存）：id、名称、描述、特性列表，以及把保障表转换为
//! 按行的「表头 → 单元格」映射（行序、表头顺序均保留，表头原文作为键）。

use std::sync::Arc;

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::core::ToolError;
use crate::page::{CoverageTable, HtmlFragment, PageAccessor};
use crate::page::selectors;
use crate::tools::{ParameterSchema, Tool, ToolDeclaration};

pub const NAME: &str = "getPageInsuranceData";

/// 保障表的一行：有序的 (表头, 单元格) 对，序列化为 JSON 对象
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageRow {
    cells: Vec<(String, String)>,
}

impl CoverageRow {
    /// 按表头对齐单元格；超出表头数量的单元格丢弃，重复表头保留首次位置、取后出现的值
    pub fn from_cells(headers: &[String], cells: &[String]) -> Self {
        let mut row = CoverageRow::default();
        for (header, cell) in headers.iter().zip(cells) {
            row.insert(header.clone(), cell.clone());
        }
        row
    }

    pub fn insert(&mut self, header: String, value: String) {
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some(slot) => slot.1 = value,
            None => self.cells.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// 第 index 列（按键顺序）的值
    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for CoverageRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// 页面上的一个保险产品（派生数据，不持久化）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsuranceProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
    pub coverages: Vec<CoverageRow>,
}

fn coverage_rows(table: Option<CoverageTable>) -> Vec<CoverageRow> {
    table
        .map(|t| {
            t.rows
                .iter()
                .map(|cells| CoverageRow::from_cells(&t.headers, cells))
                .collect()
        })
        .unwrap_or_default()
}

fn product_from_card(page: &dyn PageAccessor, card: &HtmlFragment) -> InsuranceProduct {
    InsuranceProduct {
        id: card.id(),
        name: card.first_text(selectors::CARD_NAME).unwrap_or_default(),
        description: card.first_text(selectors::CARD_DESCRIPTION).unwrap_or_default(),
        features: card.all_texts(selectors::CARD_FEATURES),
        coverages: coverage_rows(page.extract_table(card)),
    }
}

/// 产品数据提取工具
pub struct PageInsuranceDataTool {
    page: Arc<dyn PageAccessor>,
}

impl PageInsuranceDataTool {
    pub fn new(page: Arc<dyn PageAccessor>) -> Self {
        Self { page }
    }

    /// 导航到产品区块并提取全部产品；区块不存在时为空
    pub fn products(&self) -> Vec<InsuranceProduct> {
        self.page.activate_navigation(selectors::PRODUCTS);
        let Some(section) = self.page.find_section(selectors::PRODUCTS) else {
            tracing::debug!("products section not found");
            return Vec::new();
        };
        self.page
            .extract_cards(&section)
            .iter()
            .map(|card| product_from_card(self.page.as_ref(), card))
            .collect()
    }
}

#[async_trait]
impl Tool for PageInsuranceDataTool {
    fn declaration(&self) -> Option<ToolDeclaration> {
        Some(ToolDeclaration {
            name: NAME.to_string(),
            description: "Devuelve un array JSON con todos los seguros mostrados en la sección de productos.".to_string(),
            parameters: ParameterSchema::empty(),
        })
    }

    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        serde_json::to_value(self.products()).map_err(ToolError::serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::DomPage;
    use serde_json::json;

    fn card(id: &str, name: &str, rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(c, p)| format!("<tr><td>{c}</td><td>{p}</td></tr>"))
            .collect();
        format!(
            r#"<div class="card" id="{id}">
                <h3> {name} </h3>
                <p>Protección <em>completa</em></p>
                <ul class="features-list"><li>Asistencia 24/7</li><li> Sin deducible </li></ul>
                <table class="coverage-table">
                  <thead><tr><th>Cobertura</th><th>Precio</th></tr></thead>
                  <tbody>{rows}</tbody>
                </table>
            </div>"#
        )
    }

    fn page_with(cards: &[String]) -> Arc<DomPage> {
        Arc::new(DomPage::new(format!(
            r##"<html><body>
                <header><nav><a href="#productos">Productos</a></nav></header>
                <section id="productos">{}</section>
            </body></html>"##,
            cards.concat()
        )))
    }

    #[test]
    fn test_coverage_row_duplicate_header() {
        let headers = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        let cells = vec!["1".to_string(), "2".to_string(), "3".to_string(), "4".to_string()];
        let row = CoverageRow::from_cells(&headers, &cells);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("A"), Some("3"));
        assert_eq!(row.value_at(1), Some("2"));
    }

    #[tokio::test]
    async fn test_extracts_products_in_order() {
        let page = page_with(&[
            card("hogar-basico", "Hogar Básico", &[("Incendio", "$120.00"), ("Robo", "$30.00")]),
            card("auto-basico", "Auto Básico", &[("Daños", "$85.50")]),
        ]);
        let tool = PageInsuranceDataTool::new(page.clone());
        let out = tool.execute(Value::Null).await.unwrap();

        assert_eq!(page.current_location().as_deref(), Some("productos"));
        assert_eq!(out[0]["id"], "hogar-basico");
        assert_eq!(out[0]["name"], "Hogar Básico");
        assert_eq!(out[0]["description"], "Protección completa");
        assert_eq!(out[0]["features"], json!(["Asistencia 24/7", "Sin deducible"]));
        assert_eq!(
            out[0]["coverages"],
            json!([
                {"Cobertura": "Incendio", "Precio": "$120.00"},
                {"Cobertura": "Robo", "Precio": "$30.00"}
            ])
        );
        assert_eq!(out[1]["id"], "auto-basico");
    }

    #[tokio::test]
    async fn test_missing_section_returns_empty_array() {
        let tool = PageInsuranceDataTool::new(Arc::new(DomPage::empty()));
        let out = tool.execute(json!({})).await.unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_card_without_table_has_no_coverages() {
        let page = page_with(&[r#"<div class="card"><h3>Vida</h3></div>"#.to_string()]);
        let products = PageInsuranceDataTool::new(page).products();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "");
        assert_eq!(products[0].name, "Vida");
        assert!(products[0].coverages.is_empty());
        assert!(products[0].features.is_empty());
    }
}
