//! OpenAI 兼容 HTTP 客户端
//!
//! 直接 POST 到完整的 chat/completions 端点（如 LM Studio 的 http://localhost:1234/v1/chat/completions），
//! 整体请求受超时约束；超时、传输失败、非 2xx 状态、缺少 choices 均为致命错误。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::llm::{ChatRequest, LlmClient, LlmError};
use crate::memory::Message;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// HTTP 客户端：持有 reqwest Client、端点与可选 API Key
pub struct HttpLlmClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl HttpLlmClient {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            timeout_secs,
        })
    }

    fn map_err(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Message, LlmError> {
        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        tracing::debug!(endpoint = %self.endpoint, messages = request.messages.len(), "model request");
        let resp = req.send().await.map_err(|e| self.map_err(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_err(e))?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

/// 解析响应体，取 choices[0].message
pub fn parse_response(body: &str) -> Result<Message, LlmError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))
}
