//! 模型服务抽象
//!
//! 所有后端（OpenAI 兼容 HTTP / 脚本化 Mock）实现 LlmClient：发送完整请求，返回 choices[0].message。

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::memory::Message;

/// 采样参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingParams {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// 一次 chat/completions 请求体：`{model, messages, tools, tool_choice, temperature, max_tokens}`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a [Value],
    pub tool_choice: &'static str,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl<'a> ChatRequest<'a> {
    pub fn new(sampling: &'a SamplingParams, messages: &'a [Message], tools: &'a [Value]) -> Self {
        Self {
            model: &sampling.model,
            messages,
            tools,
            tool_choice: "auto",
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        }
    }
}

/// 模型服务错误：对本次运行均为致命，不重试
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// 模型服务客户端
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发送请求并返回 assistant 消息（choices[0].message）
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Message, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let sampling = SamplingParams {
            model: "model-identifier".into(),
            temperature: 0.2,
            max_tokens: 2048,
        };
        let messages = vec![Message::system("sys"), Message::user("task")];
        let tools = crate::tools::tools_schema();
        let v = serde_json::to_value(ChatRequest::new(&sampling, &messages, &tools)).unwrap();
        assert_eq!(v["model"], "model-identifier");
        assert_eq!(v["tool_choice"], "auto");
        assert_eq!(v["max_tokens"], 2048);
        assert_eq!(v["messages"][1]["content"], "task");
        assert_eq!(v["tools"].as_array().unwrap().len(), 5);
    }
}
