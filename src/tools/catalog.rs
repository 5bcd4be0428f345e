//! 工具目录：工具名枚举与发给模型的静态 schema
//!
//! 名称到处理逻辑的映射由 ToolName 穷举；未知名称在分发时返回 unknown_tool。

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

/// 全部可用工具
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    TakeScreenshot,
    MoveMouse,
    ClickMouse,
    TypeText,
    ScrollDown,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::TakeScreenshot,
        ToolName::MoveMouse,
        ToolName::ClickMouse,
        ToolName::TypeText,
        ToolName::ScrollDown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TakeScreenshot => "take_screenshot",
            Self::MoveMouse => "move_mouse",
            Self::ClickMouse => "click_mouse",
            Self::TypeText => "type_text",
            Self::ScrollDown => "scroll_down",
        }
    }

    /// 工具描述（供 LLM 理解功能）
    pub fn description(&self) -> &'static str {
        match self {
            Self::TakeScreenshot => "Capture screen and return current view with cursor visible.",
            Self::MoveMouse => {
                "Move mouse using normalized coordinates 0..1000 relative to the screenshot."
            }
            Self::ClickMouse => "Left click at current cursor position.",
            Self::TypeText => "Type text into the focused control.",
            Self::ScrollDown => "Scroll down by one notch.",
        }
    }

    /// 参数 JSON Schema
    pub fn parameters_schema(&self) -> Value {
        match self {
            Self::MoveMouse => json!({
                "type": "object",
                "properties": {"x": {"type": "number"}, "y": {"type": "number"}},
                "required": ["x", "y"]
            }),
            Self::TypeText => json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
            _ => json!({"type": "object", "properties": {}, "required": []}),
        }
    }

    pub fn to_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.as_str(),
                "description": self.description(),
                "parameters": self.parameters_schema()
            }
        })
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// 发给模型的 tools 字段（OpenAI function 格式）
pub fn tools_schema() -> Vec<Value> {
    ToolName::ALL.iter().map(ToolName::to_schema).collect()
}
