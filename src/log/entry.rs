//! LogEntry - 一条日志条目的原始行缓冲
//!
//! 条目由一个首行（来源 + 时间戳）和零个或多个消息行组成。

/// 属于同一条目的原始行
///
/// 首行之后的空行会被保留，拼接消息时再统一去除首尾空白。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    lines: Vec<String>,
}

impl LogEntry {
    /// 以首行创建条目
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            lines: vec![header.into()],
        }
    }

    /// 由已收集的行创建条目，行列表为空时返回 `None`
    pub fn from_lines<I, S>(lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            None
        } else {
            Some(Self { lines })
        }
    }

    /// 追加续行
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// 首行
    pub fn header(&self) -> &str {
        &self.lines[0]
    }

    /// 首行之后的全部行
    pub fn body_lines(&self) -> &[String] {
        &self.lines[1..]
    }

    /// 全部行
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 消息文本：首行之后的行用换行拼接并去除首尾空白
    pub fn raw_message(&self) -> String {
        self.body_lines().join("\n").trim().to_string()
    }
}
