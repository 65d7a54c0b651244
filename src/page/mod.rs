//! 页面访问层：HTML 片段、选择器约定与 PageAccessor
//!
//! 能力逻辑不直接依赖真实文档，而是面向 PageAccessor；DomPage 基于页面 HTML 实现。

pub mod accessor;
pub mod fragment;
pub mod selectors;

pub use crate::core::PageError;
pub use accessor::{CoverageTable, DomPage, PageAccessor};
pub use fragment::HtmlFragment;
