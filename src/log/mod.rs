//! Log 模块 - 解析 Firebird 服务器日志（firebird.log）
//!
//! 此模块提供了:
//! - LogMessage 及其分类字段
//! - 消息分类器接口
//! - LogEntry 条目缓冲和逐行推送的 LogParser

pub mod classifier;
pub mod entry;
pub mod message;
mod parser;

pub use classifier::{Classification, MessageClassifier, MessageTemplate, NoCatalog};
pub use entry::LogEntry;
pub use message::{Facility, LogMessage, ParamValue, Severity};
pub use parser::{LogMessages, LogParser};
