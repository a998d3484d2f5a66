//! 服务器日志消息的数据模型

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 消息严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    /// 未被分类器识别
    #[default]
    Unknown,
    Info,
    Warning,
    Error,
}

/// 写出消息的服务器子系统
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Facility {
    /// 未被分类器识别
    #[default]
    Unknown,
    System,
    Config,
    Intl,
    FileIo,
    User,
    Validation,
    Sweep,
    Plugin,
    Network,
    Ddl,
}

/// 从消息中提取出的参数值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParamValue {
    Int(i64),
    Text(String),
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Text(v) => f.write_str(v),
        }
    }
}

/// 一条解析完成的服务器日志消息
///
/// 比较顺序以时间戳为主，其次是来源、代码和消息文本。
///
/// 未被分类器识别的消息仍然会产出：级别与子系统为 `Unknown`，代码为 0，
/// `message` 是原始文本，`params` 为空。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogMessage {
    /// 写入时间
    pub timestamp: NaiveDateTime,

    /// 服务器标识，可以包含空格（如 "MyServer (Client)"）
    pub origin: String,

    /// 消息代码，未识别时为 0
    pub code: u32,

    /// 消息文本；识别成功时是带 `{name}` 占位符的模板
    pub message: String,

    pub severity: Severity,

    pub facility: Facility,

    /// 参数名到参数值的映射
    pub params: BTreeMap<String, ParamValue>,
}

impl LogMessage {
    /// 是否被分类器识别
    pub fn is_classified(&self) -> bool {
        self.code != 0 || self.severity != Severity::Unknown || self.facility != Facility::Unknown
    }

    /// 用参数替换模板中的 `{name}` 占位符
    ///
    /// 没有对应参数的占位符保持原样。
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            match tail.find('}') {
                Some(close) => {
                    let name = &tail[1..close];
                    match self.params.get(name) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => out.push_str(&tail[..=close]),
                    }
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
