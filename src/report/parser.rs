//! StatReportParser - 逐行推送的 gstat 报告解析器
//!
//! 解析器是一个多段落状态机：在段落之间扫描段落标记，进入头部、可变数据、
//! 文件序列或表/索引分析段落后，按段落的字段表分派每一行。
//! 收到 [`Input::End`] 后报告被冻结；之后再推送文本行会先隐式重置。

use memchr::memmem;
use tracing::{debug, trace};

use super::fields::*;
use super::model::{
    Distribution, Encryption, FillAccumulator, IndexId, IndexStats, StatReport, TableId,
    TableStats,
};
use crate::error::ParseError;
use crate::input::Input;
use crate::tools::parse_weekday_timestamp;

/// 状态机所处的段落
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// 段落之间，寻找下一个段落标记
    Scanning,
    Header,
    VariableData,
    FileSequence,
    PageAnalysis,
}

/// 表/索引分析段落中当前打开的块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Table(TableId),
    Index(IndexId),
}

/// gstat 报告解析器
///
/// # 示例
///
/// ```
/// use firebird_diag_parser::{Input, StatReportParser};
///
/// let mut parser = StatReportParser::new();
/// parser.push("Database header page information:")?;
/// parser.push("System Change Number    24")?;
/// parser.push("")?;
/// parser.push(Input::End)?;
///
/// let report = parser.report();
/// assert_eq!(report.system_change_number, Some(24));
/// assert_eq!(report.gstat_version, Some(3));
/// assert!(!report.has_table_stats());
/// # Ok::<(), firebird_diag_parser::ParseError>(())
/// ```
#[derive(Debug)]
pub struct StatReportParser {
    report: StatReport,
    state: State,
    line_no: usize,
    new_block: bool,
    table: Option<TableId>,
    block: Option<Block>,
}

impl Default for StatReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatReportParser {
    pub fn new() -> Self {
        Self {
            report: StatReport::default(),
            state: State::Scanning,
            line_no: 0,
            new_block: true,
            table: None,
            block: None,
        }
    }

    /// 丢弃已解析的内容，回到初始状态
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// 当前（可能尚未完成的）报告
    ///
    /// 解析出错后报告处于部分填充、未冻结的状态，不应被信任。
    pub fn report(&self) -> &StatReport {
        &self.report
    }

    /// 取出报告
    pub fn into_report(self) -> StatReport {
        self.report
    }

    /// 已处理的行数
    pub fn line_number(&self) -> usize {
        self.line_no
    }

    /// 推送一行文本或输入结束哨兵
    ///
    /// 报告冻结后再推送文本行，会先隐式重置解析器；
    /// 连续推送两次 `End` 时第二次不做任何事。
    pub fn push<'a>(&mut self, input: impl Into<Input<'a>>) -> Result<(), ParseError> {
        match input.into() {
            Input::End => {
                if !self.report.frozen {
                    self.finish();
                }
                Ok(())
            }
            Input::Line(line) => {
                if self.report.frozen {
                    self.reset();
                }
                self.push_line(line)
            }
        }
    }

    /// 推送全部行，然后推送 `End`
    pub fn parse<I, S>(&mut self, lines: I) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.push(line.as_ref())?;
        }
        self.push(Input::End)
    }

    fn finish(&mut self) {
        self.report.freeze();
        debug!(
            lines = self.line_no,
            tables = self.report.tables.len(),
            indices = self.report.indices.len(),
            "gstat report finished"
        );
    }

    fn enter(&mut self, state: State) {
        debug!(line = self.line_no, from = ?self.state, to = ?state, "section change");
        self.state = state;
    }

    fn push_line(&mut self, raw: &str) -> Result<(), ParseError> {
        let line = raw.trim();
        self.line_no += 1;

        if let Some(rest) = line.strip_prefix(COMPLETION_TIME_MARKER) {
            self.report.completed = Some(self.gstat_time(rest)?);
            return Ok(());
        }

        match self.state {
            State::Scanning => self.scan(line),
            State::Header if line.is_empty() => {
                self.enter(State::Scanning);
                Ok(())
            }
            State::Header => self.parse_header(line),
            State::VariableData if line.is_empty() => {
                self.enter(State::Scanning);
                Ok(())
            }
            State::VariableData => self.parse_variable(line),
            State::FileSequence if line.is_empty() => {
                self.enter(State::Scanning);
                Ok(())
            }
            State::FileSequence => self.parse_file_sequence(line),
            State::PageAnalysis => self.parse_page_analysis(line),
        }
    }

    fn gstat_time(&self, text: &str) -> Result<chrono::NaiveDateTime, ParseError> {
        parse_weekday_timestamp(text).ok_or_else(|| ParseError::InvalidValue {
            line: self.line_no,
            kind: "timestamp",
            value: text.trim().to_string(),
        })
    }

    fn scan(&mut self, line: &str) -> Result<(), ParseError> {
        if let Some(rest) = line.strip_prefix(EXECUTION_TIME_MARKER) {
            self.report.executed = Some(self.gstat_time(rest)?);
        } else if line.starts_with(HEADER_SECTION) {
            self.enter(State::Header);
        } else if line.starts_with(VARIABLE_SECTION) {
            self.enter(State::VariableData);
        } else if line.starts_with(FILE_SEQUENCE_SECTION) {
            self.enter(State::FileSequence);
        } else if contains(line, ENCRYPTED_TOKEN) && contains(line, NON_CRYPTED_TOKEN) {
            self.parse_encryption(line)?;
        } else if line.starts_with(PAGE_ANALYSIS_SECTION) {
            self.enter(State::PageAnalysis);
        } else if line.is_empty() {
            // 段落之间的空行
        } else if let Some(rest) = line.strip_prefix(DATABASE_PREFIX) {
            self.report.filename = Some(rest.trim_end_matches('"').to_string());
        } else {
            return Err(ParseError::UnrecognizedData { line: self.line_no });
        }
        Ok(())
    }

    fn parse_header(&mut self, line: &str) -> Result<(), ParseError> {
        let line_no = self.line_no;
        let def = find_field(&HEADER_FIELDS, line)
            .ok_or(ParseError::UnknownInformation { line: line_no })?;

        if self.report.gstat_version.is_none() {
            if def.label == VERSION_3_LABEL {
                debug!(line = line_no, version = GSTAT_30, "gstat format detected");
                self.report.gstat_version = Some(GSTAT_30);
            } else if def.label == PRE_VERSION_3_LABEL {
                return Err(ParseError::UnsupportedFormatVersion { line: line_no });
            }
        }

        let value = def.convert(&line[def.label.len()..], line_no)?;
        let name = def.field_name();
        trace!(line = line_no, field = %name, "header field");
        assign_report(&mut self.report, &name, value)
            .ok_or(ParseError::UnknownInformation { line: line_no })
    }

    fn parse_variable(&mut self, line: &str) -> Result<(), ParseError> {
        if line == VARIABLE_END {
            return Ok(());
        }

        let line_no = self.line_no;
        let def = find_field(&VARIABLE_FIELDS, line)
            .ok_or(ParseError::UnknownInformation { line: line_no })?;
        let value = def.convert(&line[def.label.len()..], line_no)?;
        let name = def.field_name();
        trace!(line = line_no, field = %name, "variable header field");
        assign_report(&mut self.report, &name, value)
            .ok_or(ParseError::UnknownInformation { line: line_no })
    }

    fn parse_file_sequence(&mut self, line: &str) -> Result<(), ParseError> {
        let bad = ParseError::BadFileSpecification { line: self.line_no };
        let Some(rest) = line.strip_prefix(FILE_PREFIX) else {
            return Err(bad);
        };

        if contains(rest, ONLY_FILE) {
            return Ok(());
        }

        let end = memmem::find(rest.as_bytes(), FILE_IS_THE.as_bytes())
            .or_else(|| memmem::find(rest.as_bytes(), FILE_CONTINUES_AS.as_bytes()))
            .ok_or(bad)?;
        self.report.continuation_files.push(rest[..end].to_string());
        Ok(())
    }

    fn parse_encryption(&mut self, line: &str) -> Result<(), ParseError> {
        let line_no = self.line_no;
        let malformed = || ParseError::MalformedEncryption { line: line_no };

        let counts = line
            .split(',')
            .map(|part| {
                part.rsplit_once(' ')
                    .and_then(|(_, count)| count.trim().parse::<u64>().ok())
                    .ok_or_else(malformed)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let [pages, encrypted, unencrypted] = counts[..] else {
            return Err(malformed());
        };
        let data = Encryption {
            pages,
            encrypted,
            unencrypted,
        };

        if contains(line, ENCRYPTED_DATA_PAGES) {
            self.report.encrypted_data_pages = Some(data);
        } else if contains(line, ENCRYPTED_INDEX_PAGES) {
            self.report.encrypted_index_pages = Some(data);
        } else if contains(line, ENCRYPTED_BLOB_PAGES) {
            self.report.encrypted_blob_pages = Some(data);
        } else {
            return Err(ParseError::UnknownEncryption { line: line_no });
        }
        Ok(())
    }

    fn parse_page_analysis(&mut self, line: &str) -> Result<(), ParseError> {
        if line.is_empty() {
            self.new_block = true;
            return Ok(());
        }

        if self.new_block {
            self.new_block = false;
            return self.open_block(line);
        }

        let line_no = self.line_no;
        match self.block {
            Some(Block::Table(id)) => parse_block_body(&mut self.report.tables[id.0], line, line_no),
            Some(Block::Index(id)) => {
                parse_block_body(&mut self.report.indices[id.0], line, line_no)
            }
            None => Err(ParseError::UnrecognizedData { line: line_no }),
        }
    }

    fn open_block(&mut self, line: &str) -> Result<(), ParseError> {
        let line_no = self.line_no;

        if let Some(rest) = line.strip_prefix(INDEX_BLOCK_PREFIX) {
            let table = self.table.ok_or(ParseError::UnrecognizedData { line: line_no })?;
            let (name, index_id) = parse_block_header(rest, line_no)?;
            let id = IndexId(self.report.indices.len());
            trace!(line = line_no, index = %name, "index block");
            self.report.indices.push(IndexStats::new(name, index_id, table));
            self.report.tables[table.0].indices.push(id);
            self.block = Some(Block::Index(id));
        } else {
            let (name, table_id) = parse_block_header(line, line_no)?;
            let id = TableId(self.report.tables.len());
            trace!(line = line_no, table = %name, "table block");
            self.report.tables.push(TableStats::new(name, table_id));
            self.table = Some(id);
            self.block = Some(Block::Table(id));
        }
        Ok(())
    }
}

/// 一次性解析一份完整的报告
pub fn parse_report<I, S>(lines: I) -> Result<StatReport, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = StatReportParser::new();
    parser.parse(lines)?;
    Ok(parser.into_report())
}

#[inline]
fn contains(haystack: &str, needle: &str) -> bool {
    memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}

/// 解析块首行 `name (id)`，名称可以带引号
fn parse_block_header(text: &str, line: usize) -> Result<(String, u64), ParseError> {
    let (name, id) = text
        .rsplit_once(" (")
        .ok_or(ParseError::MalformedBlockHeader { line })?;
    let id = id.trim().trim_matches(|c| c == '(' || c == ')');
    let id = id.parse().map_err(|_| ParseError::InvalidValue {
        line,
        kind: "integer",
        value: id.to_string(),
    })?;
    Ok((name.trim_matches(|c| c == ' ' || c == '"').to_string(), id))
}

/// 表块与索引块共用的正文解析入口
trait BlockStats {
    fn fields() -> &'static [FieldDef];
    fn assign(&mut self, name: &str, value: FieldValue) -> Option<()>;
    fn fill_mut(&mut self) -> &mut Option<Distribution>;
}

fn parse_block_body<S: BlockStats>(stats: &mut S, line: &str, line_no: usize) -> Result<(), ParseError> {
    if line.contains(',') {
        for segment in line.split(',').map(str::trim) {
            let def = find_field(S::fields(), segment)
                .ok_or(ParseError::UnknownInformation { line: line_no })?;
            let value = def.convert(&segment[def.label.len()..], line_no)?;
            stats
                .assign(&def.field_name(), value)
                .ok_or(ParseError::UnknownInformation { line: line_no })?;
        }
        Ok(())
    } else if line.starts_with(FILL_SECTION) {
        Ok(())
    } else if let Some((range, pages)) = line.split_once('=') {
        let range = range.trim();
        let bucket = FILL_RANGES
            .iter()
            .position(|r| *r == range)
            .ok_or_else(|| ParseError::UnknownFillRange {
                line: line_no,
                range: range.to_string(),
            })?;
        let pages = pages.trim();
        let pages = pages.parse().map_err(|_| ParseError::InvalidValue {
            line: line_no,
            kind: "integer",
            value: pages.to_string(),
        })?;
        let fill = stats
            .fill_mut()
            .get_or_insert(Distribution::Pending(FillAccumulator::default()));
        if let Distribution::Pending(acc) = fill {
            acc.set(bucket, pages);
        }
        Ok(())
    } else {
        Err(ParseError::UnknownInformation { line: line_no })
    }
}

impl BlockStats for TableStats {
    fn fields() -> &'static [FieldDef] {
        &TABLE_FIELDS
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> Option<()> {
        match name {
            "primary_pointer_page" => self.primary_pointer_page = Some(value.into_int()?),
            "index_root_page" => self.index_root_page = Some(value.into_int()?),
            "total_formats" => self.total_formats = Some(value.into_int()?),
            "used_formats" => self.used_formats = Some(value.into_int()?),
            "avg_record_length" => self.avg_record_length = Some(value.into_float()?),
            "total_records" => self.total_records = Some(value.into_int()?),
            "avg_version_length" => self.avg_version_length = Some(value.into_float()?),
            "total_versions" => self.total_versions = Some(value.into_int()?),
            "max_versions" => self.max_versions = Some(value.into_int()?),
            "avg_fragment_length" => self.avg_fragment_length = Some(value.into_float()?),
            "total_fragments" => self.total_fragments = Some(value.into_int()?),
            "max_fragments" => self.max_fragments = Some(value.into_int()?),
            "avg_unpacked_length" => self.avg_unpacked_length = Some(value.into_float()?),
            "compression_ratio" => self.compression_ratio = Some(value.into_float()?),
            "pointer_pages" => self.pointer_pages = Some(value.into_int()?),
            "data_page_slots" => self.data_page_slots = Some(value.into_int()?),
            "data_pages" => self.data_pages = Some(value.into_int()?),
            "avg_fill" => self.avg_fill = Some(value.into_int()?),
            "primary_pages" => self.primary_pages = Some(value.into_int()?),
            "secondary_pages" => self.secondary_pages = Some(value.into_int()?),
            "swept_pages" => self.swept_pages = Some(value.into_int()?),
            "empty_pages" => self.empty_pages = Some(value.into_int()?),
            "full_pages" => self.full_pages = Some(value.into_int()?),
            "blobs" => self.blobs = Some(value.into_int()?),
            "blobs_total_length" => self.blobs_total_length = Some(value.into_int()?),
            "blob_pages" => self.blob_pages = Some(value.into_int()?),
            "level_0" => self.level_0 = Some(value.into_int()?),
            "level_1" => self.level_1 = Some(value.into_int()?),
            "level_2" => self.level_2 = Some(value.into_int()?),
            _ => return None,
        }
        Some(())
    }

    fn fill_mut(&mut self) -> &mut Option<Distribution> {
        &mut self.fill
    }
}

impl BlockStats for IndexStats {
    fn fields() -> &'static [FieldDef] {
        &INDEX_FIELDS
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> Option<()> {
        match name {
            "root_page" => self.root_page = Some(value.into_int()?),
            "depth" => self.depth = Some(value.into_int()?),
            "leaf_buckets" => self.leaf_buckets = Some(value.into_int()?),
            "nodes" => self.nodes = Some(value.into_int()?),
            "avg_node_length" => self.avg_node_length = Some(value.into_float()?),
            "total_dup" => self.total_dup = Some(value.into_int()?),
            "max_dup" => self.max_dup = Some(value.into_int()?),
            "avg_key_length" => self.avg_key_length = Some(value.into_float()?),
            "compression_ratio" => self.compression_ratio = Some(value.into_float()?),
            "avg_prefix_length" => self.avg_prefix_length = Some(value.into_float()?),
            "avg_data_length" => self.avg_data_length = Some(value.into_float()?),
            "clustering_factor" => self.clustering_factor = Some(value.into_float()?),
            "ratio" => self.ratio = Some(value.into_float()?),
            _ => return None,
        }
        Some(())
    }

    fn fill_mut(&mut self) -> &mut Option<Distribution> {
        &mut self.fill
    }
}

/// 将头部与可变头部字段写入报告
fn assign_report(report: &mut StatReport, name: &str, value: FieldValue) -> Option<()> {
    match name {
        "flags" => report.flags = value.into_int()?,
        // 只用于版本识别，版本 3 的报告中不会出现
        "checksum" => {}
        "generation" => report.generation = value.into_int()?,
        "system_change_number" => report.system_change_number = Some(value.into_int()?),
        "page_size" => report.page_size = value.into_int()?,
        "ods_version" => report.ods_version = Some(value.into_text()?),
        "oit" => report.oit = value.into_int()?,
        "oat" => report.oat = value.into_int()?,
        "ost" => report.ost = value.into_int()?,
        "next_transaction" => report.next_transaction = value.into_int()?,
        "bumped_transaction" => report.bumped_transaction = Some(value.into_int()?),
        "sequence_number" => report.sequence_number = value.into_int()?,
        "next_attachment_id" => report.next_attachment_id = value.into_int()?,
        "implementation_id" => report.implementation_id = Some(value.into_int()?),
        "implementation" => report.implementation = Some(value.into_text()?),
        "shadow_count" => report.shadow_count = value.into_int()?,
        "page_buffers" => report.page_buffers = value.into_int()?,
        "next_header_page" => report.next_header_page = value.into_int()?,
        "database_dialect" => report.database_dialect = value.into_int()?,
        "creation_date" => report.creation_date = Some(value.into_timestamp()?),
        "attributes" => report.attributes = value.into_attributes()?,
        "sweep_interval" => report.sweep_interval = Some(value.into_int()?),
        "continuation_file" => report.continuation_file = Some(value.into_text()?),
        "last_logical_page" => report.last_logical_page = Some(value.into_int()?),
        "backup_guid" => report.backup_guid = Some(value.into_text()?),
        "root_filename" => report.root_filename = Some(value.into_text()?),
        "replay_logging_file" => report.replay_logging_file = Some(value.into_text()?),
        "backup_diff_file" => report.backup_diff_file = Some(value.into_text()?),
        _ => return None,
    }
    Some(())
}
