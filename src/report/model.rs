//! gstat 统计报告的数据模型
//!
//! 表和索引分别存放在报告拥有的两个扁平数组中，索引通过 [`TableId`]
//! 指向所属的表，因此两者之间没有所有权嵌套，也没有引用环。

use chrono::NaiveDateTime;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::fields::SYSTEM_TABLE_PREFIX;

/// 表在 [`StatReport::tables`] 中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableId(pub usize);

/// 索引在 [`StatReport::indices`] 中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexId(pub usize);

/// 头部页中记录的数据库属性（封闭词表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DbAttribute {
    Write,
    NoReserve,
    NoSharedCache,
    ActiveShadow,
    ShutdownMulti,
    ShutdownSingle,
    ShutdownFull,
    ReadOnly,
    BackupLock,
    BackupMerge,
    BackupWrong,
}

impl DbAttribute {
    /// 全部属性，顺序与 gstat 源码一致
    pub const ALL: [DbAttribute; 11] = [
        DbAttribute::Write,
        DbAttribute::NoReserve,
        DbAttribute::NoSharedCache,
        DbAttribute::ActiveShadow,
        DbAttribute::ShutdownMulti,
        DbAttribute::ShutdownSingle,
        DbAttribute::ShutdownFull,
        DbAttribute::ReadOnly,
        DbAttribute::BackupLock,
        DbAttribute::BackupMerge,
        DbAttribute::BackupWrong,
    ];

    /// gstat 输出中使用的文本
    pub fn as_str(&self) -> &'static str {
        match self {
            DbAttribute::Write => "force write",
            DbAttribute::NoReserve => "no reserve",
            DbAttribute::NoSharedCache => "shared cache disabled",
            DbAttribute::ActiveShadow => "active shadow",
            DbAttribute::ShutdownMulti => "multi-user maintenance",
            DbAttribute::ShutdownSingle => "single-user maintenance",
            DbAttribute::ShutdownFull => "full shutdown",
            DbAttribute::ReadOnly => "read only",
            DbAttribute::BackupLock => "backup lock",
            DbAttribute::BackupMerge => "backup merge",
            DbAttribute::BackupWrong => "wrong backup state",
        }
    }

    /// 按 gstat 文本查找属性
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.as_str() == label)
    }
}

/// 页填充率分布（完成解析后的只读值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FillDistribution {
    /// 填充 0 - 19% 的页数
    pub d20: u64,
    /// 填充 20 - 39% 的页数
    pub d40: u64,
    /// 填充 40 - 59% 的页数
    pub d60: u64,
    /// 填充 60 - 79% 的页数
    pub d80: u64,
    /// 填充 80 - 99% 的页数
    pub d100: u64,
}

/// 解析过程中使用的 5 槽累加器，结束时转换为 [`FillDistribution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FillAccumulator {
    slots: [u64; 5],
}

impl FillAccumulator {
    pub(crate) fn set(&mut self, bucket: usize, pages: u64) {
        self.slots[bucket] = pages;
    }

    pub(crate) fn finish(self) -> FillDistribution {
        let [d20, d40, d60, d80, d100] = self.slots;
        FillDistribution {
            d20,
            d40,
            d60,
            d80,
            d100,
        }
    }
}

/// 填充分布在解析中与解析后的两种形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Distribution {
    Pending(FillAccumulator),
    Done(FillDistribution),
}

impl Distribution {
    fn finished(&self) -> Option<&FillDistribution> {
        match self {
            Distribution::Done(dist) => Some(dist),
            Distribution::Pending(_) => None,
        }
    }
}

// 序列化时只输出完成后的分布，累加器不对外暴露
#[cfg(feature = "serde")]
mod fill_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{Distribution, FillDistribution};

    pub(super) fn serialize<S: Serializer>(
        fill: &Option<Distribution>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        fill.as_ref().and_then(Distribution::finished).serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Distribution>, D::Error> {
        Ok(Option::<FillDistribution>::deserialize(deserializer)?.map(Distribution::Done))
    }
}

/// 某类页的加密统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Encryption {
    /// 总页数
    pub pages: u64,
    /// 已加密页数
    pub encrypted: u64,
    /// 未加密页数
    pub unencrypted: u64,
}

/// 单个表的统计信息
///
/// 所有数值字段都是可选的：是否出现取决于生成报告时 gstat 使用的选项，
/// 未出现的字段保持 `None`（未知），而不是 0。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TableStats {
    pub name: String,
    pub table_id: u64,
    pub primary_pointer_page: Option<u64>,
    pub index_root_page: Option<u64>,
    pub total_formats: Option<u64>,
    pub used_formats: Option<u64>,
    pub avg_record_length: Option<f64>,
    pub total_records: Option<u64>,
    pub avg_version_length: Option<f64>,
    pub total_versions: Option<u64>,
    pub max_versions: Option<u64>,
    pub avg_fragment_length: Option<f64>,
    pub total_fragments: Option<u64>,
    pub max_fragments: Option<u64>,
    pub avg_unpacked_length: Option<f64>,
    pub compression_ratio: Option<f64>,
    pub pointer_pages: Option<u64>,
    pub data_page_slots: Option<u64>,
    pub data_pages: Option<u64>,
    /// 数据页平均填充率（百分比）
    pub avg_fill: Option<u64>,
    pub primary_pages: Option<u64>,
    pub secondary_pages: Option<u64>,
    pub swept_pages: Option<u64>,
    pub empty_pages: Option<u64>,
    pub full_pages: Option<u64>,
    pub blobs: Option<u64>,
    /// BLOB 总长度（字节）
    pub blobs_total_length: Option<u64>,
    pub blob_pages: Option<u64>,
    pub level_0: Option<u64>,
    pub level_1: Option<u64>,
    pub level_2: Option<u64>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "distribution", with = "fill_serde", default)
    )]
    pub(crate) fill: Option<Distribution>,
    /// 属于该表的索引，按出现顺序
    pub(crate) indices: Vec<IndexId>,
}

impl TableStats {
    pub(crate) fn new(name: String, table_id: u64) -> Self {
        Self {
            name,
            table_id,
            ..Self::default()
        }
    }

    /// 数据页填充分布；报告尚未结束或输出中没有分布时为 `None`
    pub fn distribution(&self) -> Option<&FillDistribution> {
        self.fill.as_ref().and_then(Distribution::finished)
    }

    /// 属于该表的索引 id
    pub fn indices(&self) -> &[IndexId] {
        &self.indices
    }

    /// 是否为系统表
    pub fn is_system(&self) -> bool {
        self.name.starts_with(SYSTEM_TABLE_PREFIX)
    }
}

/// 单个索引的统计信息
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexStats {
    pub name: String,
    pub index_id: u64,
    /// 所属表
    pub table: TableId,
    pub root_page: Option<u64>,
    pub depth: Option<u64>,
    pub leaf_buckets: Option<u64>,
    pub nodes: Option<u64>,
    pub avg_node_length: Option<f64>,
    pub total_dup: Option<u64>,
    pub max_dup: Option<u64>,
    pub avg_key_length: Option<f64>,
    pub compression_ratio: Option<f64>,
    pub avg_prefix_length: Option<f64>,
    pub avg_data_length: Option<f64>,
    pub clustering_factor: Option<f64>,
    pub ratio: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(rename = "distribution", with = "fill_serde", default)
    )]
    pub(crate) fill: Option<Distribution>,
}

impl IndexStats {
    pub(crate) fn new(name: String, index_id: u64, table: TableId) -> Self {
        Self {
            name,
            index_id,
            table,
            root_page: None,
            depth: None,
            leaf_buckets: None,
            nodes: None,
            avg_node_length: None,
            total_dup: None,
            max_dup: None,
            avg_key_length: None,
            compression_ratio: None,
            avg_prefix_length: None,
            avg_data_length: None,
            clustering_factor: None,
            ratio: None,
            fill: None,
        }
    }

    /// 索引页填充分布；报告尚未结束或输出中没有分布时为 `None`
    pub fn distribution(&self) -> Option<&FillDistribution> {
        self.fill.as_ref().and_then(Distribution::finished)
    }
}

/// 一份 gstat 统计报告
///
/// 由 [`StatReportParser`](super::StatReportParser) 逐行填充，
/// 收到输入结束哨兵后冻结，之后只能读取。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatReport {
    /// 报告格式版本，目前只支持 3
    pub gstat_version: Option<u32>,
    /// gstat 开始执行时间
    pub executed: Option<NaiveDateTime>,
    /// gstat 完成时间
    pub completed: Option<NaiveDateTime>,
    /// 数据库文件名
    pub filename: Option<String>,

    // 头部页
    pub flags: u64,
    pub generation: u64,
    pub system_change_number: Option<u64>,
    pub page_size: u64,
    pub ods_version: Option<String>,
    /// Oldest Interesting Transaction
    pub oit: u64,
    /// Oldest Active Transaction
    pub oat: u64,
    /// Oldest Snapshot Transaction
    pub ost: u64,
    pub next_transaction: u64,
    pub bumped_transaction: Option<u64>,
    pub sequence_number: u64,
    pub next_attachment_id: u64,
    pub implementation_id: Option<u64>,
    pub implementation: Option<String>,
    pub shadow_count: u64,
    pub page_buffers: u64,
    pub next_header_page: u64,
    pub database_dialect: u64,
    pub creation_date: Option<NaiveDateTime>,
    pub attributes: Vec<DbAttribute>,

    // 可变头部数据
    pub sweep_interval: Option<u64>,
    pub continuation_file: Option<String>,
    pub last_logical_page: Option<u64>,
    pub backup_guid: Option<String>,
    pub root_filename: Option<String>,
    pub replay_logging_file: Option<String>,
    pub backup_diff_file: Option<String>,

    // 加密统计
    pub encrypted_data_pages: Option<Encryption>,
    pub encrypted_index_pages: Option<Encryption>,
    pub encrypted_blob_pages: Option<Encryption>,

    /// 多文件数据库的续文件名，按出现顺序
    pub continuation_files: Vec<String>,

    pub(crate) tables: Vec<TableStats>,
    pub(crate) indices: Vec<IndexStats>,
    pub(crate) frozen: bool,
}

impl StatReport {
    /// 全部表统计，按在报告中出现的顺序
    pub fn tables(&self) -> &[TableStats] {
        &self.tables
    }

    /// 全部索引统计，按在报告中出现的顺序
    pub fn indices(&self) -> &[IndexStats] {
        &self.indices
    }

    /// 是否已经收到输入结束哨兵
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// 按名称查找表
    pub fn table(&self, name: &str) -> Option<&TableStats> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// 按名称查找索引
    pub fn index(&self, name: &str) -> Option<&IndexStats> {
        self.indices.iter().find(|i| i.name == name)
    }

    /// 按 id 取表
    pub fn table_by_id(&self, id: TableId) -> Option<&TableStats> {
        self.tables.get(id.0)
    }

    /// 按 id 取索引
    pub fn index_by_id(&self, id: IndexId) -> Option<&IndexStats> {
        self.indices.get(id.0)
    }

    /// 索引所属的表
    pub fn table_of(&self, index: &IndexStats) -> Option<&TableStats> {
        self.table_by_id(index.table)
    }

    /// 表的全部索引
    pub fn indices_of<'a>(&'a self, table: &'a TableStats) -> impl Iterator<Item = &'a IndexStats> + 'a {
        table.indices.iter().filter_map(|id| self.index_by_id(*id))
    }

    /// 是否包含表的数据页统计
    ///
    /// 这与表列表是否为空不同：只分析索引时，表列表中只有表名和 id。
    pub fn has_table_stats(&self) -> bool {
        self.tables
            .first()
            .is_some_and(|t| t.primary_pointer_page.is_some())
    }

    /// 是否包含行级（记录版本）统计
    pub fn has_row_stats(&self) -> bool {
        self.has_table_stats()
            && self
                .tables
                .first()
                .is_some_and(|t| t.avg_version_length.is_some())
    }

    /// 是否包含索引统计
    pub fn has_index_stats(&self) -> bool {
        self.indices.first().is_some_and(|i| i.depth.is_some())
    }

    /// 是否包含加密统计
    pub fn has_encryption_stats(&self) -> bool {
        self.encrypted_data_pages.is_some()
    }

    /// 是否包含系统表
    pub fn has_system_tables(&self) -> bool {
        self.tables.iter().any(TableStats::is_system)
    }

    /// 冻结报告：累加器转换为只读分布
    pub(crate) fn freeze(&mut self) {
        for fill in self
            .tables
            .iter_mut()
            .filter_map(|t| t.fill.as_mut())
            .chain(self.indices.iter_mut().filter_map(|i| i.fill.as_mut()))
        {
            if let Distribution::Pending(acc) = *fill {
                *fill = Distribution::Done(acc.finish());
            }
        }
        self.frozen = true;
    }
}
