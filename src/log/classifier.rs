//! 消息分类接口
//!
//! 日志解析器只负责切分条目；识别消息属于哪个已知模板由外部分类器完成。
//! 分类目录本身不在本 crate 中，默认使用从不匹配的 [`NoCatalog`]。

use std::collections::BTreeMap;

use super::message::{Facility, ParamValue, Severity};

/// 模板中的一段文本
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    text: String,
    optional: bool,
}

/// 带占位符的消息模板
///
/// 模板由有序的文本段组成，其中一部分被标记为可选；
/// 渲染时可以选择省略可选段。
///
/// ```
/// use firebird_diag_parser::MessageTemplate;
///
/// let template = MessageTemplate::new()
///     .text("Database: {database}")
///     .optional("\nError while trying to read from file");
///
/// assert_eq!(template.render(false), "Database: {database}");
/// assert!(template.render(true).ends_with("read from file"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加必选段
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            optional: false,
        });
        self
    }

    /// 追加可选段
    pub fn optional(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            optional: true,
        });
        self
    }

    /// 渲染模板；`with_optional` 为 `false` 时跳过可选段
    pub fn render(&self, with_optional: bool) -> String {
        self.segments
            .iter()
            .filter(|s| with_optional || !s.optional)
            .map(|s| s.text.as_str())
            .collect()
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        MessageTemplate::new().text(text)
    }
}

/// 分类器对一段消息文本的识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub severity: Severity,
    pub code: u32,
    pub facility: Facility,
    pub template: MessageTemplate,
    /// 渲染模板时是否省略可选段
    pub without_optional: bool,
    pub params: BTreeMap<String, ParamValue>,
}

impl Classification {
    /// 最终写入 [`LogMessage::message`](super::LogMessage::message) 的文本
    pub fn message(&self) -> String {
        self.template.render(!self.without_optional)
    }
}

/// 日志消息分类器
pub trait MessageClassifier {
    /// 识别一条条目的消息文本（多行，已去除首尾空白）
    fn classify(&self, text: &str) -> Option<Classification>;
}

/// 从不匹配任何消息的分类器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl MessageClassifier for NoCatalog {
    fn classify(&self, _text: &str) -> Option<Classification> {
        None
    }
}

impl<F> MessageClassifier for F
where
    F: Fn(&str) -> Option<Classification>,
{
    fn classify(&self, text: &str) -> Option<Classification> {
        self(text)
    }
}
