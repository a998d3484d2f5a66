//! 便捷 API 函数
//!
//! 提供了一组方便使用的高层 API，用于快速解析 gstat 报告和服务器日志文件。

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::input::Input;
use crate::log::{LogMessage, LogParser, MessageClassifier, NoCatalog};
use crate::report::{StatReport, parse_report};

fn open_error(path: &Path, err: std::io::Error) -> ParseError {
    ParseError::Io(format!("{}: {}", path.display(), err))
}

/// 从字符串解析一份 gstat 报告
///
/// # 示例
///
/// ```
/// use firebird_diag_parser::parse_report_from_str;
///
/// let text = "Database header page information:\n        System Change Number    24\n";
/// let report = parse_report_from_str(text)?;
/// assert_eq!(report.system_change_number, Some(24));
/// # Ok::<(), firebird_diag_parser::ParseError>(())
/// ```
pub fn parse_report_from_str(text: &str) -> Result<StatReport, ParseError> {
    parse_report(text.lines())
}

/// 从文件读取并解析一份 gstat 报告
///
/// 文件内容按 UTF-8 解码，非法字节被替换。
pub fn parse_report_from_file<P>(path: P) -> Result<StatReport, ParseError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| open_error(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    debug!(path = %path.display(), bytes = bytes.len(), "parsing gstat report");
    parse_report_from_str(&text)
}

/// 并行解析多份 gstat 报告
///
/// 每个文件使用独立的解析器，结果顺序与输入路径顺序一致。
///
/// # 示例
///
/// ```no_run
/// use firebird_diag_parser::parse_reports_from_files;
///
/// let results = parse_reports_from_files(&["employee.gstat", "orders.gstat"]);
/// for result in results {
///     match result {
///         Ok(report) => println!("{} 张表", report.tables().len()),
///         Err(err) => eprintln!("错误: {err}"),
///     }
/// }
/// ```
pub fn parse_reports_from_files<P>(paths: &[P]) -> Vec<Result<StatReport, ParseError>>
where
    P: AsRef<Path> + Sync,
{
    paths.par_iter().map(parse_report_from_file).collect()
}

/// 从任意 `BufRead` 逐条读取日志消息的迭代器
///
/// 行按 UTF-8 解码（非法字节被替换）。单个条目解析失败只产出一个错误，
/// 迭代继续；读取失败时产出错误并结束。
pub struct LogReader<R, C = NoCatalog> {
    reader: R,
    parser: LogParser<C>,
    buf: Vec<u8>,
    finished: bool,
}

impl<R: BufRead> LogReader<R, NoCatalog> {
    pub fn new(reader: R) -> Self {
        Self::with_classifier(reader, NoCatalog)
    }
}

impl<R: BufRead, C: MessageClassifier> LogReader<R, C> {
    /// 使用指定分类器
    pub fn with_classifier(reader: R, classifier: C) -> Self {
        Self {
            reader,
            parser: LogParser::with_classifier(classifier),
            buf: Vec::with_capacity(256),
            finished: false,
        }
    }
}

impl<R: BufRead, C: MessageClassifier> Iterator for LogReader<R, C> {
    type Item = Result<LogMessage, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buf.clear();
            let pushed = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    self.parser.push(Input::End)
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf);
                    self.parser.push(line.as_ref())
                }
                Err(err) => {
                    warn!(error = %err, "log read failed");
                    self.finished = true;
                    return Some(Err(err.into()));
                }
            };

            match pushed {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) => {}
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// 从文件读取并返回日志消息迭代器（流式处理）
///
/// # 示例
///
/// ```no_run
/// use firebird_diag_parser::iter_log_messages_from_file;
///
/// for result in iter_log_messages_from_file("firebird.log")? {
///     match result {
///         Ok(message) => println!("{} {}: {}", message.timestamp, message.origin, message.message),
///         Err(err) => eprintln!("错误: {err}"),
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn iter_log_messages_from_file<P>(path: P) -> Result<LogReader<BufReader<File>>, ParseError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| open_error(path, e))?;
    Ok(LogReader::new(BufReader::new(file)))
}

fn collect_log<I>(messages: I) -> (Vec<LogMessage>, Vec<ParseError>)
where
    I: Iterator<Item = Result<LogMessage, ParseError>>,
{
    let mut parsed = Vec::new();
    let mut errors = Vec::new();
    for result in messages {
        match result {
            Ok(message) => parsed.push(message),
            Err(err) => errors.push(err),
        }
    }
    (parsed, errors)
}

/// 从字符串解析全部日志消息，返回成功的消息和遇到的错误
pub fn parse_log_from_str(text: &str) -> (Vec<LogMessage>, Vec<ParseError>) {
    collect_log(LogReader::new(text.as_bytes()))
}

/// 从文件解析全部日志消息
///
/// * `Ok((Vec<LogMessage>, Vec<ParseError>))` - 成功解析的消息和逐条目的错误
/// * `Err(ParseError)` - 文件打开错误
pub fn parse_log_from_file<P>(path: P) -> Result<(Vec<LogMessage>, Vec<ParseError>), ParseError>
where
    P: AsRef<Path>,
{
    Ok(collect_log(iter_log_messages_from_file(path)?))
}
