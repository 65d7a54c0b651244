//! HTML 片段：区块、卡片等的只读快照
//!
//! 以外层 HTML 文本保存（可克隆、可跨线程传递），每次查询时用 scraper 解析，
//! 再按 CSS 选择器匹配。匹配范围为片段根元素的后代（与 element.querySelectorAll 一致）。

use scraper::{ElementRef, Html, Selector};

use crate::core::PageError;

/// 编译 CSS 选择器
pub fn compile(css: &str) -> Result<Selector, PageError> {
    Selector::parse(css).map_err(|_| PageError::InvalidSelector(css.to_string()))
}

/// 元素及其后代的全部文本，trim 后返回
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// el 后代中所有匹配元素的文本；选择器非法时告警并返回空
pub fn texts_in(el: ElementRef<'_>, css: &str) -> Vec<String> {
    match compile(css) {
        Ok(sel) => el.select(&sel).map(element_text).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "selector rejected");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment {
    html: String,
}

impl HtmlFragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// 取元素的外层 HTML
    pub fn from_element(el: ElementRef<'_>) -> Self {
        Self::new(el.html())
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// 解析片段并把根元素交给 f；片段为空时为 None
    pub fn with_root<T>(&self, f: impl FnOnce(Option<ElementRef<'_>>) -> T) -> T {
        let doc = Html::parse_fragment(&self.html);
        let root = doc.root_element().children().find_map(ElementRef::wrap);
        f(root)
    }

    /// 所有匹配的后代（文档顺序）
    pub fn select(&self, css: &str) -> Vec<HtmlFragment> {
        let sel = match compile(css) {
            Ok(sel) => sel,
            Err(e) => {
                tracing::warn!(error = %e, "selector rejected");
                return Vec::new();
            }
        };
        self.with_root(|root| {
            root.map(|r| r.select(&sel).map(HtmlFragment::from_element).collect())
                .unwrap_or_default()
        })
    }

    /// 第一个匹配元素的 trim 后文本
    pub fn first_text(&self, css: &str) -> Option<String> {
        let sel = compile(css).ok()?;
        self.with_root(|root| root?.select(&sel).next().map(element_text))
    }

    /// 所有匹配元素的 trim 后文本
    pub fn all_texts(&self, css: &str) -> Vec<String> {
        self.with_root(|root| root.map(|r| texts_in(r, css)).unwrap_or_default())
    }

    /// 是否存在匹配的后代
    pub fn contains(&self, css: &str) -> bool {
        compile(css)
            .map(|sel| self.with_root(|root| root.is_some_and(|r| r.select(&sel).next().is_some())))
            .unwrap_or(false)
    }

    /// 第一个匹配元素的属性值
    pub fn attr_of(&self, css: &str, name: &str) -> Option<String> {
        let sel = compile(css).ok()?;
        self.with_root(|root| {
            root?
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr(name).map(str::to_string))
        })
    }

    /// 根元素的属性值
    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_root(|root| root?.value().attr(name).map(str::to_string))
    }

    /// 根元素 id；无 id 时为空串
    pub fn id(&self) -> String {
        self.attr("id").unwrap_or_default()
    }

    /// 根元素的全部文本（trim）
    pub fn text(&self) -> String {
        self.with_root(|root| root.map(element_text).unwrap_or_default())
    }
}
