//! 错误类型定义
//!
//! 定义了解析 gstat 统计报告和服务器日志时可能出现的所有错误类型。
//! 行号均为当前文档内从 1 开始计数的物理行号。

use thiserror::Error;

/// 解析错误类型
///
/// 统计报告解析器和日志解析器共用同一套错误分类，
/// 数值、日期等字面量转换失败也归入其中（`InvalidValue`）。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// 遇到仅存在于 Firebird 3 之前版本 gstat 输出中的字段
    #[error("output from gstat older than Firebird 3 is not supported (line {line})")]
    UnsupportedFormatVersion {
        /// 出错行号
        line: usize,
    },

    /// 段落之间出现无法识别的行
    #[error("unrecognized data (line {line})")]
    UnrecognizedData {
        /// 出错行号
        line: usize,
    },

    /// 行或逗号分隔片段无法匹配任何已知字段
    #[error("unknown information (line {line})")]
    UnknownInformation {
        /// 出错行号
        line: usize,
    },

    /// 数据库文件序列段中的行格式错误
    #[error("bad file specification (line {line})")]
    BadFileSpecification {
        /// 出错行号
        line: usize,
    },

    /// 加密统计行结构错误
    #[error("malformed encryption information (line {line})")]
    MalformedEncryption {
        /// 出错行号
        line: usize,
    },

    /// 加密统计行未指明页类型
    #[error("unknown encryption information (line {line})")]
    UnknownEncryption {
        /// 出错行号
        line: usize,
    },

    /// 表或索引块的首行不是 `name (id)` 格式
    #[error("malformed table or index header (line {line})")]
    MalformedBlockHeader {
        /// 出错行号
        line: usize,
    },

    /// 填充分布区间标签未知
    #[error("unknown fill distribution range '{range}' (line {line})")]
    UnknownFillRange {
        /// 出错行号
        line: usize,
        /// 实际的区间标签
        range: String,
    },

    /// 数据库属性不在已知词表中
    #[error("unknown database attribute '{value}' (line {line})")]
    UnknownAttribute {
        /// 出错行号
        line: usize,
        /// 实际的属性文本
        value: String,
    },

    /// 字面量转换失败
    #[error("failed to parse {kind} value '{value}' (line {line})")]
    InvalidValue {
        /// 出错行号
        line: usize,
        /// 期望的值类型
        kind: &'static str,
        /// 实际的字段值
        value: String,
    },

    /// 日志条目首行无法拆分为来源和时间戳
    #[error("malformed log entry: '{raw}'")]
    MalformedLogHeader {
        /// 原始首行
        raw: String,
    },

    /// 文件读取错误
    #[error("I/O error: {0}")]
    Io(String),
}

impl ParseError {
    /// 返回错误关联的行号（日志与 I/O 错误没有行号）
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnsupportedFormatVersion { line }
            | ParseError::UnrecognizedData { line }
            | ParseError::UnknownInformation { line }
            | ParseError::BadFileSpecification { line }
            | ParseError::MalformedEncryption { line }
            | ParseError::UnknownEncryption { line }
            | ParseError::MalformedBlockHeader { line }
            | ParseError::UnknownFillRange { line, .. }
            | ParseError::UnknownAttribute { line, .. }
            | ParseError::InvalidValue { line, .. } => Some(*line),
            ParseError::MalformedLogHeader { .. } | ParseError::Io(_) => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ParseError::Io(err.to_string())
    }
}
