//! 与页面模板约定的锚点与选择器
//!
//! 修改页面模板时需同步更新此处。

/// 产品区块
pub const PRODUCTS: &str = "productos";
/// 报价表单区块
pub const QUOTE: &str = "cotizacion";
/// 客户评价区块
pub const TESTIMONIALS: &str = "testimonios";
/// 联系方式区块
pub const CONTACT: &str = "contacto";

/// 导航链接：`header nav a[href="#<anchor>"]`
pub fn nav_link(anchor: &str) -> String {
    format!(r##"header nav a[href="#{anchor}"]"##)
}

/// 区块：`#<anchor>`
pub fn section(anchor: &str) -> String {
    format!("#{anchor}")
}

pub const PRODUCT_CARD: &str = ".card";
pub const CARD_NAME: &str = "h3";
pub const CARD_DESCRIPTION: &str = "p";
pub const CARD_FEATURES: &str = ".features-list li";
pub const COVERAGE_TABLE: &str = ".coverage-table";
pub const TABLE_HEADERS: &str = "thead th";
pub const TABLE_ROWS: &str = "tbody tr";
pub const TABLE_CELL: &str = "td";

pub const QUOTE_FORM: &str = "form";

/// 报价表单控件：tipo 为下拉框，其余为输入框
pub fn form_control(field: &str) -> String {
    match field {
        "tipo" => r#"select[name="tipo"]"#.to_string(),
        other => format!(r#"input[name="{other}"]"#),
    }
}

pub const TESTIMONIAL: &str = ".testimonial";
pub const TESTIMONIAL_QUOTE: &str = "blockquote";
pub const TESTIMONIAL_AUTHOR: &str = "cite";

pub const CONTACT_EMAIL: &str = r#"a[href^="mailto:"]"#;
pub const CONTACT_PHONE: &str = "strong";
