use crate::utils::models::{ LogRecord, Rejected, TZ_OFFSET_PLACEHOLDER, UNKNOWN_MARKER };
use crate::utils::network::{ is_valid_ipv4, starts_with_loopback };

use chrono::{ NaiveDate, NaiveDateTime };
use regex::Regex;
use std::{ ops::Range, sync::OnceLock };

// 例如：10/Oct/2020:13:55:36 -0700，时区偏移可以没有
fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]{1,2}/\D{1,4}/[0-9]{4}:[0-9]{1,2}:[0-9]{1,2}:[0-9]{1,2}(?: [-+]?[0-9]{0,4})?").expect(
            "Invalid timestamp regex"
        )
    })
}

fn ip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}").expect("Invalid ip regex"))
}

// 第一个双引号里面的内容："GET /index.html HTTP/1.1"，也可能是空的""
fn request_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("Invalid request regex"))
}

// 前后各一个空格的三位数字（只认ASCII数字）
fn status_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" [0-9]{3} ").expect("Invalid status regex"))
}

/// 解析一行访问日志。
///
/// 按顺序提取：时间戳（并按日期过滤）→ IP → HTTP请求行 → HTTP状态码，
/// 每提取一个字段就把它从剩余文本中去掉，最后剩下的文本保存到`extra`，
/// 原始行保存到`raw`。地理位置字段留空，由缓存查询后补上。
pub fn parse_line(line: &str, target_date: NaiveDate) -> Result<LogRecord, Rejected> {
    let mut record = LogRecord {
        raw: Some(line.to_string()),
        ..Default::default()
    };

    let rest = extract_timestamp(line, target_date, &mut record)?;

    // 跳过内部的dummy连接
    if starts_with_loopback(&rest) {
        return Err(Rejected::LoopbackAddress);
    }

    let rest = extract_ip(&rest, &mut record)?;
    let rest = extract_request(&rest, &mut record);
    let rest = extract_status(&rest, &mut record);

    record.extra = Some(rest);
    Ok(record)
}

fn extract_timestamp(
    line: &str,
    target_date: NaiveDate,
    record: &mut LogRecord
) -> Result<String, Rejected> {
    let matched = timestamp_regex().find(line).ok_or(Rejected::NoTimestamp)?;

    // 只取日期和时间部分，记录的是日志里原样的本地时间
    let datetime_part = matched.as_str().split(' ').next().unwrap_or_default();
    let datetime = NaiveDateTime::parse_from_str(datetime_part, "%d/%b/%Y:%H:%M:%S").map_err(
        |_| Rejected::NoTimestamp
    )?;

    record.date = Some(datetime.format("%Y-%m-%d").to_string());
    record.time = Some(datetime.format("%H:%M:%S").to_string());
    record.tz_offset = Some(TZ_OFFSET_PLACEHOLDER.to_string());

    if datetime.date() != target_date {
        return Err(Rejected::DateMismatch);
    }

    Ok(remove_range(line, matched.range()).trim().to_string())
}

fn extract_ip(rest: &str, record: &mut LogRecord) -> Result<String, Rejected> {
    let matched = ip_regex().find(rest).ok_or(Rejected::NoIp)?;
    if !is_valid_ipv4(matched.as_str()) {
        return Err(Rejected::NoIp);
    }
    record.ip = Some(matched.as_str().to_string());

    Ok(remove_range(rest, matched.range()).trim().to_string())
}

// 请求行不完整时不丢弃这一行，用unknown标记
fn extract_request(rest: &str, record: &mut LogRecord) -> String {
    let Some(captures) = request_regex().captures(rest) else {
        return rest.to_string();
    };
    let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
        return rest.to_string();
    };

    let tokens: Vec<&str> = inner.as_str().split_whitespace().collect();
    if tokens.len() < 2 {
        record.method = Some(UNKNOWN_MARKER.to_string());
        record.endpoint = Some(tokens.first().copied().unwrap_or(UNKNOWN_MARKER).to_string());
        record.protocol = Some(UNKNOWN_MARKER.to_string());
    } else {
        record.method = Some(tokens[0].to_string());
        record.endpoint = Some(tokens[1].to_string());
        record.protocol = tokens.get(2).map(|protocol| protocol.to_string());
    }

    remove_range(rest, whole.range())
}

fn extract_status(rest: &str, record: &mut LogRecord) -> String {
    match status_regex().find(rest) {
        Some(matched) => {
            record.status = Some(matched.as_str().trim().to_string());
            remove_range(rest, matched.range())
        }
        None => rest.to_string(),
    }
}

fn remove_range(text: &str, range: Range<usize>) -> String {
    let mut remaining = String::with_capacity(text.len() - range.len());
    remaining.push_str(&text[..range.start]);
    remaining.push_str(&text[range.end..]);
    remaining
}
