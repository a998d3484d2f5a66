use chrono::{NaiveDateTime, Weekday};

// 时间戳格式常量

/// 日志条目首行末尾时间戳的 token 数（"Tue Apr 04 21:25:40 2017"）
pub const TIMESTAMP_TOKENS: usize = 5;

/// 日志条目首行至少包含的 token 数（来源至少 1 个 + 时间戳 5 个）
pub const MIN_HEADER_TOKENS: usize = TIMESTAMP_TOKENS + 1;

/// 去掉星期之后的时间戳格式
const WEEKDAY_TIMESTAMP_TAIL: &str = "%b %d %H:%M:%S %Y";

/// 数据库创建日期格式（"Nov 27, 2015 11:19:39"）
const CREATION_DATE_FORMAT: &str = "%b %d, %Y %H:%M:%S";

/// 解析由 5 个 token 组成的时间戳 `<Weekday> <Month> <Day> <H:MM:SS> <Year>`。
///
/// 星期 token 只校验是否为合法的星期名称，不与日期交叉验证。
#[inline]
pub fn parse_timestamp_tokens(tokens: &[&str]) -> Option<NaiveDateTime> {
    if tokens.len() != TIMESTAMP_TOKENS {
        return None;
    }

    tokens[0].parse::<Weekday>().ok()?;

    let tail = tokens[1..].join(" ");
    NaiveDateTime::parse_from_str(&tail, WEEKDAY_TIMESTAMP_TAIL).ok()
}

/// 解析一段完整的 `<Weekday> <Month> <Day> <H:MM:SS> <Year>` 文本，空白数量不敏感。
pub fn parse_weekday_timestamp(text: &str) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    parse_timestamp_tokens(&tokens)
}

/// 解析 gstat 头部的创建日期 `<Mon> <Day>, <Year> <H:MM:SS>`。
pub fn parse_creation_date(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), CREATION_DATE_FORMAT).ok()
}

/// 将日志条目首行拆分为来源和时间戳。
///
/// 来源是最后 5 个 token 之前的全部内容（以单个空格重新拼接），可以包含空格。
pub fn split_entry_header(line: &str) -> Option<(String, NaiveDateTime)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_HEADER_TOKENS {
        return None;
    }

    let split_at = tokens.len() - TIMESTAMP_TOKENS;
    let timestamp = parse_timestamp_tokens(&tokens[split_at..])?;
    Some((tokens[..split_at].join(" "), timestamp))
}

///
/// 判断一行日志是否为条目起始行。
///
/// 判断标准
/// 1. 按空白拆分后至少有 6 个 token。
/// 2. 最后 5 个 token 能按 `<Weekday> <Month> <Day> <H:MM:SS> <Year>` 解析为时间戳。
///
/// 不满足时该行属于当前条目的续行。
pub fn is_entry_start_line(line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.len() >= MIN_HEADER_TOKENS
        && parse_timestamp_tokens(&tokens[tokens.len() - TIMESTAMP_TOKENS..]).is_some()
}
