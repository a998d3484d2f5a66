//! # Firebird Diag Parser
//!
//! Firebird 诊断文本解析器：把 gstat 统计报告和服务器日志（firebird.log）
//! 转换为强类型的内存模型，支持批量解析和逐行推送两种用法。
//!
//! ## 功能特性
//!
//! - **gstat 报告**: 头部页、可变头部数据、文件序列、加密统计以及表/索引分析
//! - **服务器日志**: 按首行时间戳切分条目，可接入外部消息分类器
//! - **推送式解析**: 一次推送一行，以 [`Input::End`] 结束，批量与流式共用同一套逻辑
//! - **统一的错误类型**: 所有格式错误都归入 [`ParseError`]，并尽量携带行号
//!
//! ## 快速开始
//!
//! ### 解析 gstat 报告
//!
//! ```rust
//! use firebird_diag_parser::parse_report_from_str;
//!
//! let text = r#"
//! Database header page information:
//!         Flags                   0
//!         Generation              2176
//!         System Change Number    24
//!         Page size               8192
//!
//! Analyzing database pages ...
//! COUNTRY (128)
//!     Primary pointer page: 182, Index root page: 183
//!     Data pages: 1, average fill: 8%
//! "#;
//!
//! let report = parse_report_from_str(text)?;
//! assert_eq!(report.page_size, 8192);
//! assert!(report.has_table_stats());
//! assert_eq!(report.table("COUNTRY").and_then(|t| t.avg_fill), Some(8));
//! # Ok::<(), firebird_diag_parser::ParseError>(())
//! ```
//!
//! ### 解析服务器日志
//!
//! ```rust
//! use firebird_diag_parser::parse_log_from_str;
//!
//! let text = "SRVDB1  Tue Apr 04 21:25:40 2017\n        INET/inet_error: read errno = 10054\n";
//! let (messages, errors) = parse_log_from_str(text);
//!
//! assert!(errors.is_empty());
//! assert_eq!(messages[0].origin, "SRVDB1");
//! assert_eq!(messages[0].message, "INET/inet_error: read errno = 10054");
//! ```
//!
//! ### 逐行推送
//!
//! ```rust
//! use firebird_diag_parser::{Input, LogParser};
//!
//! let mut parser = LogParser::new();
//! for line in ["SRVDB1  Tue Apr 04 21:25:40 2017", "  first", "SRVDB1  Tue Apr 04 21:25:41 2017"] {
//!     if let Some(message) = parser.push(line)? {
//!         println!("完成: {}", message.message);
//!     }
//! }
//! let last = parser.push(Input::End)?;
//! assert!(last.is_some());
//! # Ok::<(), firebird_diag_parser::ParseError>(())
//! ```
//!
//! ## 日志格式
//!
//! 条目首行以服务器标识开头、以 5 个 token 的时间戳结尾：
//!
//! ```text
//! MyServer (Server)	Fri Apr  6 16:55:23 2018
//! 	activating shadow file /home/db/test_employee.fdb
//! ```

pub mod api;
pub mod error;
pub mod input;
pub mod log;
#[cfg(feature = "realtime")]
pub mod realtime;
pub mod report;
pub mod tools;

pub use api::{
    LogReader, iter_log_messages_from_file, parse_log_from_file, parse_log_from_str,
    parse_report_from_file, parse_report_from_str, parse_reports_from_files,
};
pub use error::ParseError;
pub use input::Input;
pub use log::{
    Classification, Facility, LogEntry, LogMessage, LogMessages, LogParser, MessageClassifier,
    MessageTemplate, NoCatalog, ParamValue, Severity,
};
pub use report::{
    DbAttribute, Encryption, FillDistribution, IndexId, IndexStats, StatReport, StatReportParser,
    TableId, TableStats, parse_report,
};
