//! 实时服务器日志解析模块
//!
//! 监控一个持续增长的 firebird.log，增量读取新追加的内容，
//! 逐行推送给 [`LogParser`]，每完成一条消息就调用回调。
//!
//! # 示例
//!
//! ```no_run
//! use firebird_diag_parser::realtime::{RealtimeConfig, RealtimeLogParser};
//! use std::time::Duration;
//!
//! let mut parser = RealtimeLogParser::new("/opt/firebird/firebird.log", RealtimeConfig::default())?;
//!
//! parser.watch_for(Duration::from_secs(60), |message| {
//!     println!("{} {}: {}", message.timestamp, message.origin, message.message);
//! })?;
//! # Ok::<(), firebird_diag_parser::ParseError>(())
//! ```

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::{Duration, Instant};

use memchr::memrchr;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::input::Input;
use crate::log::{LogMessage, LogParser, MessageClassifier, NoCatalog};

/// 实时解析配置
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// 没有文件事件时的轮询间隔
    pub poll_interval: Duration,
    /// 从文件开头解析已有内容；默认只解析新追加的内容
    pub from_beginning: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            from_beginning: false,
        }
    }
}

/// 实时服务器日志解析器
pub struct RealtimeLogParser<C = NoCatalog> {
    file_path: PathBuf,
    config: RealtimeConfig,
    position: u64,
    parser: LogParser<C>,
    /// 尚未读到换行符的行尾
    partial: Vec<u8>,
}

impl RealtimeLogParser<NoCatalog> {
    /// 创建新的实时解析器
    ///
    /// 文件必须已经存在。
    pub fn new<P: AsRef<Path>>(path: P, config: RealtimeConfig) -> Result<Self, ParseError> {
        Self::with_classifier(path, config, NoCatalog)
    }
}

impl<C: MessageClassifier> RealtimeLogParser<C> {
    /// 使用指定分类器创建实时解析器
    pub fn with_classifier<P: AsRef<Path>>(
        path: P,
        config: RealtimeConfig,
        classifier: C,
    ) -> Result<Self, ParseError> {
        let file_path = path.as_ref().to_path_buf();
        let mut file = File::open(&file_path)
            .map_err(|e| ParseError::Io(format!("{}: {}", file_path.display(), e)))?;

        let position = if config.from_beginning {
            0
        } else {
            file.seek(SeekFrom::End(0))?
        };

        Ok(Self {
            file_path,
            config,
            position,
            parser: LogParser::with_classifier(classifier),
            partial: Vec::new(),
        })
    }

    /// 当前文件读取位置
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 读取一次新追加的内容，返回完成的消息数量
    ///
    /// 不完整的最后一行留到下一次读取。文件被截断（日志轮转）时从头开始读取。
    /// 单个条目解析失败只记录警告，不会中断读取。
    pub fn poll<F>(&mut self, mut callback: F) -> Result<usize, ParseError>
    where
        F: FnMut(LogMessage),
    {
        let mut file = File::open(&self.file_path)?;
        let len = file.metadata()?.len();
        if len < self.position {
            debug!(path = %self.file_path.display(), "log truncated, reading from start");
            self.position = 0;
            self.partial.clear();
        }

        file.seek(SeekFrom::Start(self.position))?;
        let mut chunk = Vec::new();
        let read = file.read_to_end(&mut chunk)?;
        self.position += read as u64;
        if read == 0 {
            return Ok(0);
        }

        self.partial.extend_from_slice(&chunk);
        let Some(last_newline) = memrchr(b'\n', &self.partial) else {
            return Ok(0);
        };
        let rest = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, rest);

        let mut count = 0;
        for line in String::from_utf8_lossy(&complete).lines() {
            count += self.push_logged(line, &mut callback);
        }
        Ok(count)
    }

    /// 强制完成缓冲中的条目，返回完成的消息数量
    ///
    /// 未以换行结尾的行尾也会被推送；它是新的首行时，上一条消息和它本身都会完成。
    pub fn flush<F>(&mut self, mut callback: F) -> usize
    where
        F: FnMut(LogMessage),
    {
        let mut count = 0;
        if !self.partial.is_empty() {
            let tail = String::from_utf8_lossy(&std::mem::take(&mut self.partial)).into_owned();
            count += self.push_logged(tail.as_str(), &mut callback);
        }
        count + self.push_logged(Input::End, &mut callback)
    }

    /// 监控一段时间后停止，停止时完成缓冲中的条目
    ///
    /// # 参数
    ///
    /// * `duration` - 监控时长
    /// * `callback` - 处理每条新消息的回调函数
    pub fn watch_for<F>(&mut self, duration: Duration, mut callback: F) -> Result<(), ParseError>
    where
        F: FnMut(LogMessage),
    {
        let (tx, rx) = channel();
        let start_time = Instant::now();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| ParseError::Io(format!("failed to create watcher: {e}")))?;

        watcher
            .watch(&self.file_path, RecursiveMode::NonRecursive)
            .map_err(|e| ParseError::Io(format!("failed to watch file: {e}")))?;

        debug!(path = %self.file_path.display(), ?duration, "watching log file");

        // 先处理已有内容
        self.poll_logged(&mut callback);

        while start_time.elapsed() < duration {
            let wait = self
                .config
                .poll_interval
                .min(duration.saturating_sub(start_time.elapsed()));
            match rx.recv_timeout(wait) {
                Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                    self.poll_logged(&mut callback);
                }
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => self.poll_logged(&mut callback),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.flush(&mut callback);
        debug!(path = %self.file_path.display(), position = self.position, "watch finished");
        Ok(())
    }

    fn push_logged<'a, F>(&mut self, input: impl Into<Input<'a>>, callback: &mut F) -> usize
    where
        F: FnMut(LogMessage),
    {
        match self.parser.push(input) {
            Ok(Some(message)) => {
                callback(message);
                1
            }
            Ok(None) => 0,
            Err(err) => {
                warn!(error = %err, "skipping malformed log entry");
                0
            }
        }
    }

    fn poll_logged<F>(&mut self, callback: &mut F)
    where
        F: FnMut(LogMessage),
    {
        if let Err(err) = self.poll(&mut *callback) {
            warn!(error = %err, "failed to read log file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn from_start() -> RealtimeConfig {
        RealtimeConfig {
            from_beginning: true,
            ..RealtimeConfig::default()
        }
    }

    #[test]
    fn test_nonexistent_file() {
        let parser = RealtimeLogParser::new("/nonexistent/firebird.log", RealtimeConfig::default());
        assert!(matches!(parser, Err(ParseError::Io(_))));
    }

    #[test]
    fn test_starts_at_end_by_default() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "SRVDB1  Tue Apr 04 21:25:40 2017").unwrap();
        writeln!(temp_file, "  old entry").unwrap();
        temp_file.flush().unwrap();

        let mut parser = RealtimeLogParser::new(temp_file.path(), RealtimeConfig::default()).unwrap();
        assert!(parser.position() > 0);

        let mut seen = Vec::new();
        assert_eq!(parser.poll(|m| seen.push(m)).unwrap(), 0);
        assert_eq!(parser.flush(|m| seen.push(m)), 0);
        assert!(seen.is_empty());
    }

    #[test]
    fn test_incremental_poll() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "SRVDB1  Tue Apr 04 21:25:40 2017").unwrap();
        writeln!(temp_file, "  first").unwrap();
        temp_file.flush().unwrap();

        let mut parser = RealtimeLogParser::new(temp_file.path(), from_start()).unwrap();
        let mut seen = Vec::new();

        // 第一条要等下一个首行出现才算完成
        assert_eq!(parser.poll(|m| seen.push(m)).unwrap(), 0);

        writeln!(temp_file, "SRVDB1  Tue Apr 04 21:25:41 2017").unwrap();
        write!(temp_file, "  second, not yet termin").unwrap();
        temp_file.flush().unwrap();
        assert_eq!(parser.poll(|m| seen.push(m)).unwrap(), 1);
        assert_eq!(seen[0].message, "first");

        writeln!(temp_file, "ated").unwrap();
        temp_file.flush().unwrap();
        assert_eq!(parser.poll(|m| seen.push(m)).unwrap(), 0);
        assert_eq!(parser.flush(|m| seen.push(m)), 1);
        assert_eq!(seen[1].message, "second, not yet terminated");
    }

    #[test]
    fn test_watch_for_flushes_pending_entry() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "SRVDB1  Tue Apr 04 21:25:40 2017").unwrap();
        writeln!(temp_file, "  only entry").unwrap();
        temp_file.flush().unwrap();

        let mut parser = RealtimeLogParser::new(temp_file.path(), from_start()).unwrap();
        let mut seen = Vec::new();
        let result = parser.watch_for(Duration::from_millis(300), |m| seen.push(m));

        assert!(result.is_ok());
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].origin, "SRVDB1");
    }

    #[test]
    fn test_flush_counts_entry_closed_by_unterminated_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "SRVDB1  Tue Apr 04 21:25:40 2017").unwrap();
        writeln!(temp_file, "  first").unwrap();
        write!(temp_file, "SRVDB1  Tue Apr 04 21:25:41 2017").unwrap();
        temp_file.flush().unwrap();

        let mut parser = RealtimeLogParser::new(temp_file.path(), from_start()).unwrap();
        let mut seen = Vec::new();
        assert_eq!(parser.poll(|m| seen.push(m)).unwrap(), 0);
        assert_eq!(parser.flush(|m| seen.push(m)), 2);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].message, "first");
        assert_eq!(seen[1].message, "");
    }

    #[test]
    fn test_flush_skips_malformed_entry() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "stray line before any entry").unwrap();
        write!(temp_file, "SRVDB1  Tue Apr 04 21:25:40 2017").unwrap();
        temp_file.flush().unwrap();

        let mut parser = RealtimeLogParser::new(temp_file.path(), from_start()).unwrap();
        let mut seen = Vec::new();
        assert_eq!(parser.poll(|m| seen.push(m)).unwrap(), 0);

        // 首行之前的杂行被跳过，首行本身仍然完成
        assert_eq!(parser.flush(|m| seen.push(m)), 1);
        assert_eq!(seen[0].origin, "SRVDB1");
    }
}
