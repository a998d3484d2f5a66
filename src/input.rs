//! 推送式解析器的输入类型
//!
//! 两个解析器都按“一次一行、以哨兵结束”的方式消费输入。

/// 推送给解析器的一项输入：一行文本，或输入结束哨兵。
///
/// `End` 与任何文本行（包括空行）都不同。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// 一行文本，可以带有行尾的 `\r` / `\n`
    Line(&'a str),
    /// 输入结束
    End,
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(line: &'a str) -> Self {
        Input::Line(line)
    }
}

impl<'a> From<&'a String> for Input<'a> {
    fn from(line: &'a String) -> Self {
        Input::Line(line.as_str())
    }
}

impl<'a> From<Option<&'a str>> for Input<'a> {
    fn from(line: Option<&'a str>) -> Self {
        line.map_or(Input::End, Input::Line)
    }
}
