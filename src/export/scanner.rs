//! 日志记录扫描器
//!
//! 后端日志中交错着无关行与两类结构化记录（请求 / 响应）：记录由某行中的固定标记引出，
//! 其后的 JSON 对象可跨越任意多物理行。扫描器用显式有限状态机逐字符跟踪：
//! 反斜杠使下一个字符失去特殊含义；未转义的双引号切换字符串状态；只在字符串外计数花括号。
//! 深度在打开后首次回到 0 的那一行结束累积（该行闭合括号之后的内容忽略），随后整体解析。
//! 游标推进有两种策略：窗口选择总是越过已消费的行；清洗在解析失败时只越过标记行，
//! 让未闭合记录之后的记录仍能被识别。

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;

/// 请求记录标记
pub const REQUEST_MARKER: &str = "Received request: POST to /v1/chat/completions with body";
/// 响应记录标记
pub const RESPONSE_MARKER: &str = "Generated prediction:";
/// 行首时间戳格式 `[YYYY-MM-DD HH:MM:SS]`
pub const LOG_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 记录方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// 行中含请求标记或响应标记时返回对应方向
    pub fn detect(line: &str) -> Option<Self> {
        if line.contains(REQUEST_MARKER) {
            Some(Self::Request)
        } else if line.contains(RESPONSE_MARKER) {
            Some(Self::Response)
        } else {
            None
        }
    }

    /// 标记之后紧跟内联 JSON（`marker {...`）时返回对应方向
    pub fn detect_with_body(line: &str) -> Option<Self> {
        let direction = Self::detect(line)?;
        let marker = match direction {
            Self::Request => REQUEST_MARKER,
            Self::Response => RESPONSE_MARKER,
        };
        let pos = line.find(marker)? + marker.len();
        line[pos..]
            .trim_start()
            .starts_with('{')
            .then_some(direction)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Request => "REQUEST TO MODEL",
            Self::Response => "RESPONSE FROM MODEL",
        }
    }
}

/// 词法状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// 结构区（字符串外）：花括号计数
    Structure,
    /// 字符串内：花括号不计数
    InString,
    /// 反斜杠之后：下一个字符无特殊含义，随后回到原状态
    Escaped { in_string: bool },
}

/// 花括号 / 字符串跟踪器
#[derive(Debug, Clone)]
pub struct BraceTracker {
    state: ScanState,
    depth: i64,
    opened: bool,
}

impl Default for BraceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BraceTracker {
    pub fn new() -> Self {
        Self {
            state: ScanState::Structure,
            depth: 0,
            opened: false,
        }
    }

    pub fn depth(&self) -> i64 {
        self.depth
    }

    pub fn in_string(&self) -> bool {
        matches!(
            self.state,
            ScanState::InString | ScanState::Escaped { in_string: true }
        )
    }

    /// 输入一个字符；若该字符使深度在打开后回到 0 则返回 true
    pub fn feed(&mut self, ch: char) -> bool {
        self.state = match (self.state, ch) {
            (ScanState::Escaped { in_string: true }, _) => ScanState::InString,
            (ScanState::Escaped { in_string: false }, _) => ScanState::Structure,
            (ScanState::InString, '\\') => ScanState::Escaped { in_string: true },
            (ScanState::InString, '"') => ScanState::Structure,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Structure, '\\') => ScanState::Escaped { in_string: false },
            (ScanState::Structure, '"') => ScanState::InString,
            (ScanState::Structure, '{') => {
                self.depth += 1;
                self.opened = true;
                ScanState::Structure
            }
            (ScanState::Structure, '}') => {
                self.depth -= 1;
                if self.opened && self.depth == 0 {
                    return true;
                }
                ScanState::Structure
            }
            (ScanState::Structure, _) => ScanState::Structure,
        };
        false
    }
}

/// 从行序列开头提取一个 JSON 对象，返回 (对象或 None, 消费的行数)
pub fn extract_from<'a, I>(lines: I) -> (Option<Value>, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tracker = BraceTracker::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut closed = false;

    for line in lines {
        let mut end = line.len();
        for (pos, ch) in line.char_indices() {
            if tracker.feed(ch) {
                end = pos + ch.len_utf8();
                closed = true;
                break;
            }
        }
        buf.push(&line[..end]);
        if closed {
            break;
        }
    }

    let consumed = buf.len();
    let value = serde_json::from_str::<Value>(&buf.join("\n")).ok();
    (value, consumed)
}

/// 从 start 行开始提取一个 JSON 对象，返回 (对象或 None, 下一个未消费行的下标)
pub fn extract<S: AsRef<str>>(lines: &[S], start: usize) -> (Option<Value>, usize) {
    if start >= lines.len() {
        return (None, start);
    }
    let (value, consumed) = extract_from(lines[start..].iter().map(AsRef::as_ref));
    (value, start + consumed)
}

/// 从标记行（自该行第一个 `{` 起）提取记录；无 `{` 时只消费这一行
pub fn extract_record<S: AsRef<str>>(lines: &[S], marker_index: usize) -> (Option<Value>, usize) {
    let Some(line) = lines.get(marker_index).map(AsRef::as_ref) else {
        return (None, 0);
    };
    let Some(brace) = line.find('{') else {
        return (None, 1);
    };
    let rest = lines[marker_index + 1..].iter().map(AsRef::as_ref);
    let (value, consumed) = extract_from(std::iter::once(&line[brace..]).chain(rest));
    (value, consumed.max(1))
}

/// 一条日志记录（临时结构，只用于渲染为文本产物）
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: Option<NaiveDateTime>,
    /// 行首方括号中的原始文本（用于横幅展示）
    pub stamp_text: Option<String>,
    pub direction: Direction,
    pub payload: Option<Value>,
}

/// 扫描得到的记录及其在行序列中的位置
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedRecord {
    pub record: LogRecord,
    pub start: usize,
    pub consumed: usize,
}

/// 扫描策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolicy {
    /// 任何含标记的行都引出记录，游标总是越过已消费的行
    Window,
    /// 只认标记后紧跟 `{` 的行；解析失败时只越过标记行
    Clean,
}

/// 顺序扫描全部行，提取每个标记引出的记录（窗口选择策略）
pub fn scan_records<S: AsRef<str>>(lines: &[S]) -> Vec<ScannedRecord> {
    scan_records_with(lines, ScanPolicy::Window)
}

/// 按给定策略扫描
pub fn scan_records_with<S: AsRef<str>>(lines: &[S], policy: ScanPolicy) -> Vec<ScannedRecord> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_ref();
        let detected = match policy {
            ScanPolicy::Window => Direction::detect(line),
            ScanPolicy::Clean => Direction::detect_with_body(line),
        };
        let Some(direction) = detected else {
            i += 1;
            continue;
        };
        let (payload, consumed) = extract_record(lines, i);
        let advance = match (policy, &payload) {
            (ScanPolicy::Clean, None) => 1,
            _ => consumed,
        };
        out.push(ScannedRecord {
            record: LogRecord {
                timestamp: parse_log_timestamp(line),
                stamp_text: leading_bracket(line).map(str::to_string),
                direction,
                payload,
            },
            start: i,
            consumed,
        });
        i += advance;
    }
    out
}

static TS_RE: OnceLock<Regex> = OnceLock::new();
static BRACKET_RE: OnceLock<Regex> = OnceLock::new();

/// 解析行首 `[YYYY-MM-DD HH:MM:SS]`；不匹配或日期非法时返回 None
pub fn parse_log_timestamp(line: &str) -> Option<NaiveDateTime> {
    let re = TS_RE.get_or_init(|| {
        Regex::new(r"^\[([0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2})\]").unwrap()
    });
    let caps = re.captures(line)?;
    NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), LOG_TS_FORMAT).ok()
}

/// 行首方括号内的文本（任意格式）
pub fn leading_bracket(line: &str) -> Option<&str> {
    let re = BRACKET_RE.get_or_init(|| Regex::new(r"^\[([^\]]+)\]").unwrap());
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
