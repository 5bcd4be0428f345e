//! 脚本化 Mock 客户端（用于测试与演练，无需模型服务）
//!
//! 按顺序回放预置的 assistant 消息，并记录每次收到的请求体（JSON）供断言；脚本耗尽后返回纯文本结束回复。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ChatRequest, LlmClient, LlmError};
use crate::memory::{Message, ToolCall};

/// 脚本中的一步
#[derive(Debug)]
pub enum ScriptStep {
    Reply(Message),
    Fail(LlmError),
}

/// Mock 客户端：回放脚本
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, msg: Message) -> Self {
        self.push(ScriptStep::Reply(msg))
    }

    /// 追加一条只含工具调用的回复
    pub fn tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.reply(Message::assistant_tool_calls(calls))
    }

    pub fn fail(self, err: LlmError) -> Self {
        self.push(ScriptStep::Fail(err))
    }

    fn push(self, step: ScriptStep) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
        self
    }

    /// 已收到的请求体
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// 一个反复截图直到给出答案的演练脚本（dry run 用）
    pub fn demo() -> Self {
        Self::new()
            .tool_calls(vec![ToolCall::new("demo_1", "take_screenshot", "{}")])
            .tool_calls(vec![ToolCall::new("demo_2", "move_mouse", r#"{"x":500,"y":500}"#)])
            .tool_calls(vec![ToolCall::new("demo_3", "take_screenshot", "{}")])
            .reply(Message::assistant("Cursor moved to the center of the screen."))
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Message, LlmError> {
        let body = serde_json::to_value(request)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(body);
        }

        let step = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match step {
            Some(ScriptStep::Reply(msg)) => Ok(msg),
            Some(ScriptStep::Fail(err)) => Err(err),
            None => Ok(Message::assistant("(script exhausted)")),
        }
    }
}
