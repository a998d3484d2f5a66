//! gstat 报告的字段表与常量
//!
//! 每个段落拥有一张有序的字段定义表，标签按前缀匹配，第一个匹配者胜出，
//! 因此表中不能出现会遮蔽后面更长标签的前缀标签。gstat 输出格式变化时
//! 只需更新这里的定义，而不需要修改状态机。

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;

use super::model::DbAttribute;
use crate::error::ParseError;
use crate::tools::parse_creation_date;

// 段落与特殊行标记

/// gstat 开始执行时间行
pub const EXECUTION_TIME_MARKER: &str = "Gstat execution time";

/// gstat 完成时间行，在任何状态下都会被处理
pub const COMPLETION_TIME_MARKER: &str = "Gstat completion time";

/// 头部页段落起始
pub const HEADER_SECTION: &str = "Database header page information:";

/// 可变头部数据段落起始
pub const VARIABLE_SECTION: &str = "Variable header data:";

/// 数据库文件序列段落起始
pub const FILE_SEQUENCE_SECTION: &str = "Database file sequence:";

/// 表与索引分析段落起始
pub const PAGE_ANALYSIS_SECTION: &str = "Analyzing database pages ...";

/// 数据库文件名声明行前缀
pub const DATABASE_PREFIX: &str = "Database \"";

/// 可变头部数据的结束行
pub const VARIABLE_END: &str = "*END*";

/// 文件序列行前缀
pub const FILE_PREFIX: &str = "File ";

/// 单文件数据库的文件序列行
pub const ONLY_FILE: &str = "is the only file";

/// 多文件序列的两种措辞
pub const FILE_IS_THE: &str = " is the ";
pub const FILE_CONTINUES_AS: &str = " continues as";

/// 索引块首行前缀
pub const INDEX_BLOCK_PREFIX: &str = "Index ";

/// 填充分布小节标题
pub const FILL_SECTION: &str = "Fill distribution:";

/// 加密统计行的识别 token
pub const ENCRYPTED_TOKEN: &str = "encrypted";
pub const NON_CRYPTED_TOKEN: &str = "non-crypted";

/// 加密统计行中的页类型
pub const ENCRYPTED_DATA_PAGES: &str = "Data pages:";
pub const ENCRYPTED_INDEX_PAGES: &str = "Index pages:";
pub const ENCRYPTED_BLOB_PAGES: &str = "Blob pages:";

/// 系统表名前缀
pub const SYSTEM_TABLE_PREFIX: &str = "RDB$";

// 版本识别

/// 支持的报告格式版本
pub const GSTAT_30: u32 = 3;

/// 仅存在于版本 3 头部中的标签
pub const VERSION_3_LABEL: &str = "System Change Number";

/// 仅存在于版本 3 之前头部中的标签
pub const PRE_VERSION_3_LABEL: &str = "Checksum";

/// 填充分布的 5 个区间标签，顺序即桶下标
pub const FILL_RANGES: [&str; 5] = ["0 - 19%", "20 - 39%", "40 - 59%", "60 - 79%", "80 - 99%"];

/// 字段值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// 无符号整数
    Int,
    /// 原样保留的字符串
    Str,
    /// `<Mon> <Day>, <Year> <H:MM:SS>` 时间戳
    Timestamp,
    /// 逗号分隔的数据库属性列表（仅头部段落）
    Attributes,
    /// 浮点数
    Float,
    /// 带 `%` 后缀的整数百分比
    Percent,
}

impl ValueKind {
    fn name(&self) -> &'static str {
        match self {
            ValueKind::Int => "integer",
            ValueKind::Str => "string",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Attributes => "attribute list",
            ValueKind::Float => "float",
            ValueKind::Percent => "percent",
        }
    }
}

/// 转换后的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(u64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Attributes(Vec<DbAttribute>),
}

impl FieldValue {
    pub(crate) fn into_int(self) -> Option<u64> {
        match self {
            FieldValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_float(self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_timestamp(self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn into_attributes(self) -> Option<Vec<DbAttribute>> {
        match self {
            FieldValue::Attributes(v) => Some(v),
            _ => None,
        }
    }
}

/// 字段定义
///
/// 定义一个 gstat 输出标签、它的值类型以及可选的显式字段名
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// gstat 输出中的标签，如 "Page size"、"Data pages:"
    pub label: &'static str,

    /// 值类型
    pub kind: ValueKind,

    /// 显式字段名；为 `None` 时由标签推导
    pub name: Option<&'static str>,
}

impl FieldDef {
    const fn new(label: &'static str, kind: ValueKind) -> Self {
        Self {
            label,
            kind,
            name: None,
        }
    }

    const fn named(label: &'static str, kind: ValueKind, name: &'static str) -> Self {
        Self {
            label,
            kind,
            name: Some(name),
        }
    }

    /// 解析后的字段名：显式名称，或由标签小写、去掉末尾冒号、空格替换为下划线得到
    pub fn field_name(&self) -> String {
        match self.name {
            Some(name) => name.to_string(),
            None => self
                .label
                .trim_end_matches(':')
                .to_lowercase()
                .replace(' ', "_"),
        }
    }

    /// 将标签之后的文本按值类型转换
    pub fn convert(&self, raw: &str, line: usize) -> Result<FieldValue, ParseError> {
        let raw = raw.trim();
        let invalid = || ParseError::InvalidValue {
            line,
            kind: self.kind.name(),
            value: raw.to_string(),
        };

        match self.kind {
            ValueKind::Int => raw.parse().map(FieldValue::Int).map_err(|_| invalid()),
            ValueKind::Str => Ok(FieldValue::Text(raw.to_string())),
            ValueKind::Timestamp => parse_creation_date(raw)
                .map(FieldValue::Timestamp)
                .ok_or_else(invalid),
            ValueKind::Float => raw.parse().map(FieldValue::Float).map_err(|_| invalid()),
            ValueKind::Percent => raw
                .trim_end_matches('%')
                .trim()
                .parse()
                .map(FieldValue::Int)
                .map_err(|_| invalid()),
            ValueKind::Attributes => {
                if raw.is_empty() {
                    return Ok(FieldValue::Attributes(Vec::new()));
                }
                raw.split(',')
                    .map(str::trim)
                    .map(|token| {
                        DbAttribute::from_label(token).ok_or_else(|| ParseError::UnknownAttribute {
                            line,
                            value: token.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(FieldValue::Attributes)
            }
        }
    }
}

/// 在字段表中查找第一个标签为 `text` 前缀的定义
pub fn find_field<'a>(fields: &'a [FieldDef], text: &str) -> Option<&'a FieldDef> {
    fields.iter().find(|def| text.starts_with(def.label))
}

use ValueKind::{Attributes, Float, Int, Percent, Str, Timestamp};

/// 头部页字段
pub static HEADER_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    vec![
        FieldDef::new("Flags", Int),
        FieldDef::new(PRE_VERSION_3_LABEL, Int),
        FieldDef::new("Generation", Int),
        FieldDef::named(VERSION_3_LABEL, Int, "system_change_number"),
        FieldDef::new("Page size", Int),
        FieldDef::new("ODS version", Str),
        FieldDef::named("Oldest transaction", Int, "oit"),
        FieldDef::named("Oldest active", Int, "oat"),
        FieldDef::named("Oldest snapshot", Int, "ost"),
        FieldDef::new("Next transaction", Int),
        FieldDef::new("Bumped transaction", Int),
        FieldDef::new("Sequence number", Int),
        FieldDef::new("Next attachment ID", Int),
        FieldDef::new("Implementation ID", Int),
        FieldDef::new("Implementation", Str),
        FieldDef::new("Shadow count", Int),
        FieldDef::new("Page buffers", Int),
        FieldDef::new("Next header page", Int),
        FieldDef::new("Database dialect", Int),
        FieldDef::new("Creation date", Timestamp),
        FieldDef::new("Attributes", Attributes),
    ]
});

/// 可变头部数据字段
pub static VARIABLE_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    vec![
        FieldDef::new("Sweep interval:", Int),
        FieldDef::new("Continuation file:", Str),
        FieldDef::new("Last logical page:", Int),
        FieldDef::named("Database backup GUID:", Str, "backup_guid"),
        FieldDef::named("Root file name:", Str, "root_filename"),
        FieldDef::new("Replay logging file:", Str),
        FieldDef::named("Backup difference file:", Str, "backup_diff_file"),
    ]
});

/// 表块字段
pub static TABLE_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    vec![
        FieldDef::new("Primary pointer page:", Int),
        FieldDef::new("Index root page:", Int),
        FieldDef::new("Total formats:", Int),
        FieldDef::new("used formats:", Int),
        FieldDef::named("Average record length:", Float, "avg_record_length"),
        FieldDef::new("total records:", Int),
        FieldDef::named("Average version length:", Float, "avg_version_length"),
        FieldDef::new("total versions:", Int),
        FieldDef::new("max versions:", Int),
        FieldDef::named("Average fragment length:", Float, "avg_fragment_length"),
        FieldDef::new("total fragments:", Int),
        FieldDef::new("max fragments:", Int),
        FieldDef::named("Average unpacked length:", Float, "avg_unpacked_length"),
        FieldDef::new("compression ratio:", Float),
        FieldDef::named("Pointer pages:", Int, "pointer_pages"),
        FieldDef::new("data page slots:", Int),
        FieldDef::new("Data pages:", Int),
        FieldDef::named("average fill:", Percent, "avg_fill"),
        FieldDef::new("Primary pages:", Int),
        FieldDef::new("secondary pages:", Int),
        FieldDef::new("swept pages:", Int),
        FieldDef::new("Empty pages:", Int),
        FieldDef::new("full pages:", Int),
        FieldDef::new("Blobs:", Int),
        FieldDef::named("total length:", Int, "blobs_total_length"),
        FieldDef::new("blob pages:", Int),
        FieldDef::new("Level 0:", Int),
        FieldDef::new("Level 1:", Int),
        FieldDef::new("Level 2:", Int),
    ]
});

/// 索引块字段
pub static INDEX_FIELDS: Lazy<Vec<FieldDef>> = Lazy::new(|| {
    vec![
        FieldDef::new("Root page:", Int),
        FieldDef::new("depth:", Int),
        FieldDef::new("leaf buckets:", Int),
        FieldDef::new("nodes:", Int),
        FieldDef::named("Average node length:", Float, "avg_node_length"),
        FieldDef::new("total dup:", Int),
        FieldDef::new("max dup:", Int),
        FieldDef::named("Average key length:", Float, "avg_key_length"),
        FieldDef::new("compression ratio:", Float),
        FieldDef::named("Average prefix length:", Float, "avg_prefix_length"),
        FieldDef::named("average data length:", Float, "avg_data_length"),
        FieldDef::new("Clustering factor:", Float),
        FieldDef::new("ratio:", Float),
    ]
});
