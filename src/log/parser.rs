//! LogParser - 逐行推送的服务器日志解析器

use std::collections::BTreeMap;
use std::iter::FusedIterator;

use tracing::{debug, trace};

use super::classifier::{MessageClassifier, NoCatalog};
use super::entry::LogEntry;
use super::message::{Facility, LogMessage, Severity};
use crate::error::ParseError;
use crate::input::Input;
use crate::tools::{is_entry_start_line, split_entry_header};

/// 服务器日志解析器
///
/// 每推送一行，解析器判断它是否为新条目的首行：是则先完成并返回缓冲中的上一条目；
/// 否则作为续行追加。推送 [`Input::End`] 会强制完成缓冲中的条目。
///
/// # 示例
///
/// ```
/// use firebird_diag_parser::{Input, LogParser, Severity};
///
/// let mut parser = LogParser::new();
/// assert!(parser.push("SRVDB1  Tue Apr 04 21:25:40 2017")?.is_none());
/// assert!(parser.push("        some unclassified body text")?.is_none());
///
/// let message = parser.push(Input::End)?.unwrap();
/// assert_eq!(message.origin, "SRVDB1");
/// assert_eq!(message.code, 0);
/// assert_eq!(message.severity, Severity::Unknown);
/// assert_eq!(message.message, "some unclassified body text");
/// # Ok::<(), firebird_diag_parser::ParseError>(())
/// ```
#[derive(Debug, Default)]
pub struct LogParser<C = NoCatalog> {
    classifier: C,
    buffer: Option<LogEntry>,
}

impl LogParser<NoCatalog> {
    pub fn new() -> Self {
        Self::with_classifier(NoCatalog)
    }
}

impl<C: MessageClassifier> LogParser<C> {
    /// 使用指定分类器创建解析器
    pub fn with_classifier(classifier: C) -> Self {
        Self {
            classifier,
            buffer: None,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// 当前缓冲中尚未完成的条目
    pub fn pending(&self) -> Option<&LogEntry> {
        self.buffer.as_ref()
    }

    /// 推送一行文本或输入结束哨兵
    ///
    /// 恰好在一个条目完成时返回 `Some`。缓冲为空时推送 `End` 返回 `Ok(None)`。
    ///
    /// 上一条目解析失败时返回错误，但触发完成的新首行已经进入缓冲，
    /// 调用方可以继续推送后续行。
    pub fn push<'a>(&mut self, input: impl Into<Input<'a>>) -> Result<Option<LogMessage>, ParseError> {
        let line = match input.into() {
            Input::End => return self.flush(),
            Input::Line(line) => line.trim(),
        };

        if line.is_empty() {
            if let Some(entry) = self.buffer.as_mut() {
                entry.add_line(line);
            }
            return Ok(None);
        }

        if is_entry_start_line(line) {
            match self.buffer.replace(LogEntry::new(line)) {
                Some(previous) => self.parse_entry(&previous).map(Some),
                None => Ok(None),
            }
        } else {
            match self.buffer.as_mut() {
                Some(entry) => entry.add_line(line),
                None => self.buffer = Some(LogEntry::new(line)),
            }
            Ok(None)
        }
    }

    fn flush(&mut self) -> Result<Option<LogMessage>, ParseError> {
        match self.buffer.take() {
            Some(entry) => self.parse_entry(&entry).map(Some),
            None => Ok(None),
        }
    }

    /// 解析属于同一条目的全部行
    pub fn parse_entry(&self, entry: &LogEntry) -> Result<LogMessage, ParseError> {
        let (origin, timestamp) =
            split_entry_header(entry.header()).ok_or_else(|| ParseError::MalformedLogHeader {
                raw: entry.header().to_string(),
            })?;
        let raw = entry.raw_message();

        let message = match self.classifier.classify(&raw) {
            Some(found) => {
                trace!(code = found.code, "log message classified");
                LogMessage {
                    timestamp,
                    origin,
                    code: found.code,
                    message: found.message(),
                    severity: found.severity,
                    facility: found.facility,
                    params: found.params,
                }
            }
            None => LogMessage {
                timestamp,
                origin,
                code: 0,
                message: raw,
                severity: Severity::Unknown,
                facility: Facility::Unknown,
                params: BTreeMap::new(),
            },
        };

        debug!(
            origin = %message.origin,
            timestamp = %message.timestamp,
            lines = entry.lines().len(),
            "log entry finished"
        );
        Ok(message)
    }

    /// 推送全部行并在结束时推送 `End`，以惰性迭代器形式逐条产出消息
    ///
    /// 迭代器在第一个错误之后结束。
    pub fn parse<I, S>(&mut self, lines: I) -> LogMessages<'_, C, I::IntoIter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        LogMessages {
            parser: self,
            lines: lines.into_iter(),
            ended: false,
            failed: false,
        }
    }
}

/// [`LogParser::parse`] 返回的迭代器
pub struct LogMessages<'p, C, I> {
    parser: &'p mut LogParser<C>,
    lines: I,
    ended: bool,
    failed: bool,
}

impl<C, I, S> Iterator for LogMessages<'_, C, I>
where
    C: MessageClassifier,
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Result<LogMessage, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.ended {
            return None;
        }

        for line in self.lines.by_ref() {
            match self.parser.push(line.as_ref()) {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }

        self.ended = true;
        match self.parser.push(Input::End) {
            Ok(message) => message.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl<C, I, S> FusedIterator for LogMessages<'_, C, I>
where
    C: MessageClassifier,
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
}
