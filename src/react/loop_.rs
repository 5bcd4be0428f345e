//! Agent 主循环（回合制状态机）
//!
//! AwaitingModel -> 无工具调用 -> Done；
//! AwaitingModel -> 有工具调用 -> Dispatching -> AwaitingModel；
//! 达到最大回合数 -> StepBudgetExhausted。
//! 每回合只执行第一个工具调用，多余的调用逐个以 too_many_tool_calls 结果回绝（先于执行结果写入）。
//! 模型服务失败直接向上传播，不重试。

use std::time::Duration;

use serde_json::Value;

use crate::core::session::Session;
use crate::core::AgentError;
use crate::llm::{ChatRequest, LlmClient, SamplingParams};
use crate::memory::{Message, ToolCall};
use crate::tools::{ToolDispatcher, ToolErrorKind, ToolFailure};

/// 多余工具调用的回绝说明
pub const TOO_MANY_CALLS_MESSAGE: &str = "only one tool call per response allowed";

/// 终止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 模型未请求任何工具：其最后的文本即结果
    Done,
    /// 回合数用尽：返回最近一次非空文本（可能为空）
    StepBudgetExhausted,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    pub stop: StopReason,
    pub turns: usize,
}

/// 状态机当前状态
#[derive(Debug)]
enum TurnState {
    AwaitingModel,
    Dispatching(ToolCall),
    Finished(StopReason),
}

/// 循环配置（解决参数过多：封装为结构体）
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub sampling: SamplingParams,
    pub max_steps: usize,
    /// 回合间隔（节奏控制，不是重试退避）
    pub step_delay: Duration,
    /// 保留完整图片的最近截图条数
    pub keep_last_screenshots: usize,
}

/// Agent 运行上下文：模型客户端、工具分发器、工具目录与配置
pub struct AgentRun<'a> {
    pub llm: &'a dyn LlmClient,
    pub dispatcher: &'a mut ToolDispatcher,
    pub tools: &'a [Value],
    pub settings: LoopSettings,
}

impl<'a> AgentRun<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        dispatcher: &'a mut ToolDispatcher,
        tools: &'a [Value],
        settings: LoopSettings,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            tools,
            settings,
        }
    }

    /// 在已播种（system + 任务）的会话上运行，直到完成或回合数用尽
    pub async fn run(&mut self, session: &mut Session) -> Result<AgentOutcome, AgentError> {
        let mut state = TurnState::AwaitingModel;
        let mut last_content = String::new();
        let mut turns = 0usize;

        loop {
            state = match state {
                TurnState::Finished(stop) => {
                    tracing::info!(turns, ?stop, "agent loop finished");
                    return Ok(AgentOutcome {
                        answer: last_content,
                        stop,
                        turns,
                    });
                }
                TurnState::AwaitingModel if turns >= self.settings.max_steps => {
                    TurnState::Finished(StopReason::StepBudgetExhausted)
                }
                TurnState::AwaitingModel => {
                    turns += 1;
                    tracing::info!(turn = turns, max = self.settings.max_steps, "requesting model");
                    self.await_model(session, &mut last_content).await?
                }
                TurnState::Dispatching(call) => {
                    self.dispatch(session, &call).await;
                    if !self.settings.step_delay.is_zero() {
                        tokio::time::sleep(self.settings.step_delay).await;
                    }
                    TurnState::AwaitingModel
                }
            };
        }
    }

    /// 一次模型请求：追加 assistant 消息，回绝多余调用，决定下一状态
    async fn await_model(
        &self,
        session: &mut Session,
        last_content: &mut String,
    ) -> Result<TurnState, AgentError> {
        let request = ChatRequest::new(&self.settings.sampling, session.memory.messages(), self.tools);
        let reply = self.llm.complete(&request).await?;

        if let Some(text) = reply.text().filter(|t| !t.is_empty()) {
            *last_content = text.to_string();
        }
        let mut calls = reply.tool_calls().to_vec();
        session.memory.push(reply);

        if calls.is_empty() {
            return Ok(TurnState::Finished(StopReason::Done));
        }

        if calls.len() > 1 {
            tracing::warn!(requested = calls.len(), "model requested more than one tool call");
            let rejection = ToolFailure::new(ToolErrorKind::TooManyToolCalls, TOO_MANY_CALLS_MESSAGE);
            for extra in &calls[1..] {
                session
                    .memory
                    .push(Message::tool(&extra.id, extra.name(), rejection.to_payload()));
            }
            calls.truncate(1);
        }

        Ok(calls
            .pop()
            .map(TurnState::Dispatching)
            .unwrap_or(TurnState::Finished(StopReason::Done)))
    }

    /// 执行保留的调用，追加结果；有观察消息时追加并裁剪截图
    async fn dispatch(&mut self, session: &mut Session, call: &ToolCall) {
        tracing::info!(tool = call.name(), call_id = %call.id, "dispatching tool call");
        let out = self
            .dispatcher
            .dispatch(
                call.name(),
                call.function.arguments.as_ref(),
                &call.id,
                &mut session.dump,
            )
            .await;
        session.memory.push(out.result);

        if let Some(observation) = out.observation {
            session.memory.push(observation);
            let pruned = session.memory.prune_images(self.settings.keep_last_screenshots);
            if pruned > 0 {
                tracing::debug!(pruned, "compacted older screenshots");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, ScriptedLlmClient};
    use crate::memory::Role;
    use crate::tools::{tools_schema, CaptureSettings, HeadlessDesktop};
    use tempfile::TempDir;

    fn settings(max_steps: usize) -> LoopSettings {
        LoopSettings {
            sampling: SamplingParams {
                model: "test-model".into(),
                temperature: 0.2,
                max_tokens: 256,
            },
            max_steps,
            step_delay: Duration::ZERO,
            keep_last_screenshots: 2,
        }
    }

    fn dispatcher(dir: &TempDir) -> ToolDispatcher {
        ToolDispatcher::new(
            Box::new(HeadlessDesktop::new(640, 480)),
            CaptureSettings {
                dump_dir: dir.path().to_path_buf(),
                dump_prefix: "screen_".into(),
                target_w: 16,
                target_h: 12,
            },
        )
        .with_action_settle(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_done_without_tool_calls() {
        let dir = TempDir::new().unwrap();
        let llm = ScriptedLlmClient::new().reply(Message::assistant("all done"));
        let mut d = dispatcher(&dir);
        let tools = tools_schema();
        let mut session = Session::new("sys", "task", 1);

        let outcome = AgentRun::new(&llm, &mut d, &tools, settings(5))
            .run(&mut session)
            .await
            .unwrap();
        assert_eq!(outcome.answer, "all done");
        assert_eq!(outcome.stop, StopReason::Done);
        assert_eq!(outcome.turns, 1);
        assert_eq!(session.memory.len(), 3);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["tool_choice"], "auto");
        assert_eq!(requests[0]["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_excess_calls_rejected_before_executed_result() {
        let dir = TempDir::new().unwrap();
        let llm = ScriptedLlmClient::new()
            .tool_calls(vec![
                ToolCall::new("a", "click_mouse", "{}"),
                ToolCall::new("b", "scroll_down", "{}"),
                ToolCall::new("c", "type_text", r#"{"text":"x"}"#),
            ])
            .reply(Message::assistant("finished"));
        let mut d = dispatcher(&dir);
        let tools = tools_schema();
        let mut session = Session::new("sys", "task", 1);

        AgentRun::new(&llm, &mut d, &tools, settings(5))
            .run(&mut session)
            .await
            .unwrap();

        let msgs = session.memory.messages();
        // system, task, assistant(3 calls), reject b, reject c, result a, assistant
        assert_eq!(msgs.len(), 7);
        assert_eq!(msgs[3].tool_call_id.as_deref(), Some("b"));
        assert_eq!(msgs[3].name.as_deref(), Some("scroll_down"));
        assert!(msgs[3].text().unwrap().contains("too_many_tool_calls"));
        assert_eq!(msgs[4].tool_call_id.as_deref(), Some("c"));
        assert!(msgs[4].text().unwrap().contains("too_many_tool_calls"));
        assert_eq!(msgs[5].tool_call_id.as_deref(), Some("a"));
        assert_eq!(msgs[5].text(), Some(r#"{"ok":true}"#));
        assert_eq!(msgs[6].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_step_budget_returns_latest_text() {
        let dir = TempDir::new().unwrap();
        let mut first = Message::assistant("looking");
        first.tool_calls = Some(vec![ToolCall::new("1", "scroll_down", "")]);
        let llm = ScriptedLlmClient::new()
            .reply(first)
            .tool_calls(vec![ToolCall::new("2", "scroll_down", "")])
            .tool_calls(vec![ToolCall::new("3", "scroll_down", "")]);
        let mut d = dispatcher(&dir);
        let tools = tools_schema();
        let mut session = Session::new("sys", "task", 1);

        let outcome = AgentRun::new(&llm, &mut d, &tools, settings(2))
            .run(&mut session)
            .await
            .unwrap();
        assert_eq!(outcome.stop, StopReason::StepBudgetExhausted);
        assert_eq!(outcome.answer, "looking");
        assert_eq!(outcome.turns, 2);
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let llm = ScriptedLlmClient::new()
            .tool_calls(vec![ToolCall::new("1", "click_mouse", "{}")])
            .fail(LlmError::Timeout(240));
        let mut d = dispatcher(&dir);
        let tools = tools_schema();
        let mut session = Session::new("sys", "task", 1);

        let err = AgentRun::new(&llm, &mut d, &tools, settings(5))
            .run(&mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Llm(LlmError::Timeout(240))));
        assert_eq!(session.memory.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_text_does_not_replace_candidate() {
        let dir = TempDir::new().unwrap();
        let mut first = Message::assistant("first thought");
        first.tool_calls = Some(vec![ToolCall::new("1", "click_mouse", "{}")]);
        let llm = ScriptedLlmClient::new().reply(first).reply(Message::assistant(""));
        let mut d = dispatcher(&dir);
        let tools = tools_schema();
        let mut session = Session::new("sys", "task", 1);

        let outcome = AgentRun::new(&llm, &mut d, &tools, settings(5))
            .run(&mut session)
            .await
            .unwrap();
        assert_eq!(outcome.stop, StopReason::Done);
        assert_eq!(outcome.answer, "first thought");
    }
}
