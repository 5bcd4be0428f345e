//! 对话历史：消息类型与上下文存储
//!
//! 消息结构与 OpenAI 兼容接口一致（role / content / tool_calls / tool_call_id / name），
//! 模型返回的 assistant 消息按原样保存（未知字段保存在 extra 中，下一轮原样回传）。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::memory::pruning::prune_image_messages;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// 图片引用（通常为 data:image/png;base64,... 形式的 URL）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// 多段内容中的一段：文本或图片引用
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::ImageUrl { .. })
    }
}

/// 消息内容：纯文本或有序的多段内容
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// 工具调用中的函数部分；arguments 保留原始值（通常为 JSON 编码的字符串），此层不解析
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// 模型请求的一次工具调用
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: Some(Value::String(arguments.into())),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 模型返回但本层不理解的字段（如 reasoning_content），原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    fn with_content(role: Role, content: MessageContent) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
            name: None,
            extra: Map::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_content(Role::System, MessageContent::Text(content.into()))
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_content(Role::User, MessageContent::Text(content.into()))
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::with_content(Role::User, MessageContent::Parts(parts))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_content(Role::Assistant, MessageContent::Text(content.into()))
    }

    /// 带工具调用的 assistant 消息（content 为空）
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
            extra: Map::new(),
        }
    }

    /// 工具结果消息：content 为规范化的 JSON 字符串
    pub fn tool(call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
            extra: Map::new(),
        }
    }

    /// 纯文本内容；多段内容或空内容返回 None
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(MessageContent::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// 工具调用列表（无则为空 slice）
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }

    /// 是否为携带图片的 user 消息（裁剪策略只作用于此类消息）
    pub fn carries_image(&self) -> bool {
        if self.role != Role::User {
            return false;
        }
        match &self.content {
            Some(MessageContent::Parts(parts)) => parts.iter().any(ContentPart::is_image),
            _ => false,
        }
    }
}

/// 上下文存储：本次运行的全部对话，按顺序保存；截图消息超过阈值时由裁剪策略压缩
#[derive(Clone, Debug, Default)]
pub struct ConversationMemory {
    messages: Vec<Message>,
}

impl ConversationMemory {
    /// 以 system + 任务消息开始一次新会话
    pub fn seeded(system_prompt: &str, task_prompt: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(task_prompt)],
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// 对整个历史执行截图裁剪，返回被替换的消息数
    pub fn prune_images(&mut self, keep_last: usize) -> usize {
        let before = self.image_message_count();
        let messages = std::mem::take(&mut self.messages);
        self.messages = prune_image_messages(messages, keep_last);
        before - self.image_message_count()
    }

    pub fn image_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.carries_image()).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}
