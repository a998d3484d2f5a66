//! Report 模块 - 解析 Firebird gstat 统计报告
//!
//! 此模块提供了:
//! - StatReport 及表/索引统计的数据模型
//! - 各段落的字段定义表
//! - 逐行推送的 StatReportParser

pub mod fields;
pub mod model;
mod parser;

pub use model::{
    DbAttribute, Encryption, FillDistribution, IndexId, IndexStats, StatReport, TableId,
    TableStats,
};
pub use parser::{StatReportParser, parse_report};
