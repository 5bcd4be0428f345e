//! 工具结果的规范化 JSON 表示
//!
//! 成功：`{"ok":true,...fields}`；失败：`{"ok":false,"error":{"type":<kind>,"message":<text>}}`。
//! 紧凑分隔符、`ok` 始终在首位，作为 tool 消息的 content 原样发给模型。

use std::fmt;

use serde::Serialize;

/// 可恢复的工具错误类别：以 tool 消息形式返回给模型，不中断运行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidArguments,
    UnknownTool,
    TooManyToolCalls,
    /// 执行层（截图/输入/写文件）失败
    ToolFailed,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArguments => "invalid_arguments",
            Self::UnknownTool => "unknown_tool",
            Self::TooManyToolCalls => "too_many_tool_calls",
            Self::ToolFailed => "tool_failed",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 工具失败：类别 + 描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message)
    }

    /// 规范化的失败 JSON
    pub fn to_payload(&self) -> String {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            #[serde(rename = "type")]
            kind: ToolErrorKind,
            message: &'a str,
        }
        #[derive(Serialize)]
        struct Payload<'a> {
            ok: bool,
            error: ErrorBody<'a>,
        }
        to_compact_json(&Payload {
            ok: false,
            error: ErrorBody {
                kind: self.kind,
                message: &self.message,
            },
        })
    }
}

/// 截图成功时附带的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureFields {
    pub file: String,
    pub screen_w: u32,
    pub screen_h: u32,
}

/// 规范化的成功 JSON；fields 为 None 时仅 `{"ok":true}`
pub fn ok_payload(fields: Option<&CaptureFields>) -> String {
    #[derive(Serialize)]
    struct Payload<'a> {
        ok: bool,
        #[serde(flatten)]
        fields: Option<&'a CaptureFields>,
    }
    to_compact_json(&Payload { ok: true, fields })
}

fn to_compact_json<T: Serialize>(value: &T) -> String {
    // 纯结构体序列化不会失败；保底返回通用错误体
    serde_json::to_string(value).unwrap_or_else(|_| {
        r#"{"ok":false,"error":{"type":"tool_failed","message":"serialization failed"}}"#.to_string()
    })
}
