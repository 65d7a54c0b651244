//! 页面访问抽象
//!
//! 能力逻辑只通过 PageAccessor 读写页面：activate_navigation / find_section / extract_cards /
//! extract_table / set_form_value。DomPage 基于页面 HTML（scraper 解析），
//! 也作为单元测试中的假页面。
//!
//! 页面状态由外部（用户或页面脚本）随时修改，find_section 每次返回当前快照，调用方不得缓存。

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use scraper::Html;

use crate::core::PageError;
use crate::page::fragment::{compile, texts_in, HtmlFragment};
use crate::page::selectors;

/// 产品卡片中的保障表：表头 + 按行的单元格文本（均已 trim）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 页面访问 trait：导航、区块查找、卡片/表格提取、表单写入
pub trait PageAccessor: Send + Sync {
    /// 激活指向 `#anchor` 的导航链接；链接不存在时返回 false（调用方继续执行）
    fn activate_navigation(&self, anchor: &str) -> bool;

    /// 返回 `#anchor` 区块的当前快照
    fn find_section(&self, anchor: &str) -> Option<HtmlFragment>;

    /// 向 `#anchor` 区块内表单的 `field` 控件写入值
    fn set_form_value(&self, anchor: &str, field: &str, value: &str) -> Result<(), PageError>;

    /// 区块内所有产品卡片（文档顺序）
    fn extract_cards(&self, section: &HtmlFragment) -> Vec<HtmlFragment> {
        section.select(selectors::PRODUCT_CARD)
    }

    /// 卡片中的保障表；无表格时为 None
    fn extract_table(&self, card: &HtmlFragment) -> Option<CoverageTable> {
        let table_sel = compile(selectors::COVERAGE_TABLE).ok()?;
        let row_sel = compile(selectors::TABLE_ROWS).ok()?;
        card.with_root(|root| {
            let table = root?.select(&table_sel).next()?;
            let headers = texts_in(table, selectors::TABLE_HEADERS);
            let rows = table
                .select(&row_sel)
                .map(|tr| texts_in(tr, selectors::TABLE_CELL))
                .collect();
            Some(CoverageTable { headers, rows })
        })
    }

    /// 区块内是否有表单
    fn has_form(&self, section: &HtmlFragment) -> bool {
        section.contains(selectors::QUOTE_FORM)
    }
}

struct PageState {
    html: String,
    location: Option<String>,
    /// 表单控件的当前值，键为 (区块锚点, 字段)；与 DOM 一样不回写到 HTML 属性
    values: BTreeMap<(String, String), String>,
}

/// 基于页面 HTML 的实现
pub struct DomPage {
    state: RwLock<PageState>,
}

impl DomPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            state: RwLock::new(PageState {
                html: html.into(),
                location: None,
                values: BTreeMap::new(),
            }),
        }
    }

    /// 空页面：所有区块都不存在
    pub fn empty() -> Self {
        Self::new("<html><body></body></html>")
    }

    /// 当前页面 HTML
    pub fn html(&self) -> String {
        self.read(|s| s.html.clone())
    }

    /// 整体替换页面（模拟页面脚本重新渲染），已写入的表单值随之丢弃
    pub fn replace_html(&self, html: impl Into<String>) {
        let html = html.into();
        self.write(|s| {
            s.html = html;
            s.values.clear();
        });
    }

    /// 最近一次成功激活的导航锚点
    pub fn current_location(&self) -> Option<String> {
        self.read(|s| s.location.clone())
    }

    /// 读取表单控件当前值：已写入的值优先，其次是 HTML 中的 value 属性
    pub fn form_value(&self, anchor: &str, field: &str) -> Option<String> {
        let key = (anchor.to_string(), field.to_string());
        if let Some(value) = self.read(|s| s.values.get(&key).cloned()) {
            return Some(value);
        }
        let control = format!("{} {}", selectors::QUOTE_FORM, selectors::form_control(field));
        self.find_section(anchor)?.attr_of(&control, "value")
    }

    fn read<T>(&self, f: impl FnOnce(&PageState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut PageState) -> T) -> T {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for DomPage {
    fn default() -> Self {
        Self::empty()
    }
}

impl PageAccessor for DomPage {
    fn activate_navigation(&self, anchor: &str) -> bool {
        let link = match compile(&selectors::nav_link(anchor)) {
            Ok(sel) => sel,
            Err(e) => {
                tracing::warn!(error = %e, "navigation selector rejected");
                return false;
            }
        };
        self.write(|s| {
            let doc = Html::parse_document(&s.html);
            let found = doc.select(&link).next().is_some();
            if !found {
                tracing::warn!(anchor = %anchor, "navigation link not found");
                return false;
            }
            s.location = Some(anchor.to_string());
            tracing::debug!(anchor = %anchor, "navigation activated");
            true
        })
    }

    fn find_section(&self, anchor: &str) -> Option<HtmlFragment> {
        let sel = compile(&selectors::section(anchor)).ok()?;
        self.read(|s| {
            let doc = Html::parse_document(&s.html);
            let section = doc.select(&sel).next().map(HtmlFragment::from_element);
            section
        })
    }

    fn set_form_value(&self, anchor: &str, field: &str, value: &str) -> Result<(), PageError> {
        let section_sel = compile(&selectors::section(anchor))?;
        let form_sel = compile(selectors::QUOTE_FORM)?;
        let control_css = selectors::form_control(field);
        let control_sel = compile(&control_css)?;

        self.write(|s| {
            let located = {
                let doc = Html::parse_document(&s.html);
                let section = doc.select(&section_sel).next();
                match section {
                    None => Err(PageError::SectionNotFound(anchor.to_string())),
                    Some(section) => {
                        let control = section
                            .select(&form_sel)
                            .next()
                            .and_then(|form| form.select(&control_sel).next());
                        match control {
                            Some(_) => Ok(()),
                            None => Err(PageError::ControlNotFound(control_css.clone())),
                        }
                    }
                }
            };
            located?;
            s.values
                .insert((anchor.to_string(), field.to_string()), value.to_string());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_PAGE: &str = r##"<!DOCTYPE html>
<html><body>
  <header><nav><a href="#cotizacion">Cotiza</a></nav></header>
  <section id="cotizacion">
    <form>
      <select name="tipo"><option value="auto-basico">Auto</option></select>
      <input name="nombre">
      <input name="telefono" value="555-0000">
    </form>
  </section>
</body></html>"##;

    #[test]
    fn test_activate_navigation_records_location() {
        let page = DomPage::new(QUOTE_PAGE);
        assert!(page.activate_navigation("cotizacion"));
        assert_eq!(page.current_location().as_deref(), Some("cotizacion"));
        assert!(!page.activate_navigation("productos"));
        assert_eq!(page.current_location().as_deref(), Some("cotizacion"));
    }

    #[test]
    fn test_set_form_value_overrides_markup() {
        let page = DomPage::new(QUOTE_PAGE);
        page.set_form_value("cotizacion", "nombre", "Ana López").unwrap();
        page.set_form_value("cotizacion", "tipo", "auto-basico").unwrap();
        assert_eq!(page.form_value("cotizacion", "nombre").as_deref(), Some("Ana López"));
        assert_eq!(page.form_value("cotizacion", "tipo").as_deref(), Some("auto-basico"));
        assert_eq!(page.form_value("cotizacion", "telefono").as_deref(), Some("555-0000"));
        assert_eq!(page.form_value("cotizacion", "email"), None);
    }

    #[test]
    fn test_set_form_value_missing_control() {
        let page = DomPage::new(QUOTE_PAGE);
        let err = page.set_form_value("cotizacion", "email", "a@b.c").unwrap_err();
        assert!(matches!(err, PageError::ControlNotFound(_)));
        let err = page.set_form_value("contacto", "email", "a@b.c").unwrap_err();
        assert_eq!(err, PageError::SectionNotFound("contacto".to_string()));
    }

    #[test]
    fn test_find_section_reflects_replaced_html() {
        let page = DomPage::new(QUOTE_PAGE);
        page.set_form_value("cotizacion", "nombre", "Ana").unwrap();
        let section = page.find_section("cotizacion").unwrap();
        assert_eq!(section.id(), "cotizacion");
        assert!(page.has_form(&section));

        page.replace_html("<html><body></body></html>");
        assert!(page.find_section("cotizacion").is_none());
        assert_eq!(page.form_value("cotizacion", "nombre"), None);
    }

    #[test]
    fn test_section_id_is_a_plain_attribute() {
        let page = DomPage::new(r#"<div><section class="x" id="contacto"><p>hola</p></section></div>"#);
        let section = page.find_section("contacto").unwrap();
        assert_eq!(section.first_text("p").as_deref(), Some("hola"));
    }

    #[test]
    fn test_extract_table() {
        let card = HtmlFragment::new(
            r#"<div class="card"><table class="coverage-table">
                <thead><tr><th> Plan </th><th>Precio</th></tr></thead>
                <tbody><tr><td>Básico</td><td> $120.00 </td></tr></tbody>
            </table></div>"#,
        );
        let table = DomPage::empty().extract_table(&card).unwrap();
        assert_eq!(table.headers, vec!["Plan", "Precio"]);
        assert_eq!(table.rows, vec![vec!["Básico".to_string(), "$120.00".to_string()]]);
        assert!(DomPage::empty()
            .extract_table(&HtmlFragment::new("<div></div>"))
            .is_none());
    }
}
