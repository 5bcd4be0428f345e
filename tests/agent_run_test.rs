//! Agent 运行集成测试：脚本化模型 + 无头桌面

use std::time::Duration;

use deskpilot::config::AppConfig;
use deskpilot::core::Session;
use deskpilot::llm::ScriptedLlmClient;
use deskpilot::memory::{Message, ToolCall, IMAGE_PLACEHOLDER};
use deskpilot::react::{AgentRun, LoopSettings, StopReason};
use deskpilot::run_agent;
use deskpilot::tools::{tools_schema, CaptureSettings, HeadlessDesktop, ToolDispatcher};
use tempfile::TempDir;

fn small_capture(dir: &TempDir) -> CaptureSettings {
    CaptureSettings {
        dump_dir: dir.path().to_path_buf(),
        dump_prefix: "screen_".into(),
        target_w: 32,
        target_h: 18,
    }
}

fn screenshot(id: &str) -> ToolCall {
    ToolCall::new(id, "take_screenshot", "{}")
}

#[tokio::test]
async fn test_four_captures_keep_last_two() {
    let dir = TempDir::new().unwrap();
    let llm = ScriptedLlmClient::new()
        .tool_calls(vec![screenshot("s1")])
        .tool_calls(vec![screenshot("s2")])
        .tool_calls(vec![screenshot("s3")])
        .tool_calls(vec![screenshot("s4")])
        .reply(Message::assistant("seen four screens"));

    let mut dispatcher = ToolDispatcher::new(
        Box::new(HeadlessDesktop::new(320, 180)),
        small_capture(&dir),
    )
    .with_action_settle(Duration::ZERO);
    let tools = tools_schema();
    let settings = LoopSettings {
        sampling: AppConfig::default().llm.sampling(),
        max_steps: 10,
        step_delay: Duration::ZERO,
        keep_last_screenshots: 2,
    };
    let mut session = Session::new("sys", "look four times", 1);

    let outcome = AgentRun::new(&llm, &mut dispatcher, &tools, settings)
        .run(&mut session)
        .await
        .unwrap();
    assert_eq!(outcome.stop, StopReason::Done);
    assert_eq!(outcome.answer, "seen four screens");
    assert_eq!(outcome.turns, 5);
    assert_eq!(session.dump.next_index(), 5);
    for i in 1..=4 {
        assert!(dir.path().join(format!("screen_{i:04}.png")).exists());
    }

    // 最后一次请求：system, task, 4 x (assistant, tool, user image)
    let requests = llm.requests();
    assert_eq!(requests.len(), 5);
    let messages = requests[4]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 14);

    let first_file = dir.path().join("screen_0001.png");
    assert_eq!(
        messages[4]["content"].as_str().unwrap(),
        format!("{IMAGE_PLACEHOLDER} (omitted; file={})", first_file.display())
    );
    assert!(messages[7]["content"]
        .as_str()
        .unwrap()
        .ends_with("screen_0002.png)"));
    for idx in [10, 13] {
        let url = messages[idx]["content"][1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
    assert_eq!(session.memory.image_message_count(), 2);
}

#[tokio::test]
async fn test_run_agent_with_config() {
    let dir = TempDir::new().unwrap();
    let mut cfg = AppConfig::default();
    cfg.capture.dump_dir = dir.path().join("dumps");
    cfg.capture.dump_start = 3;
    cfg.capture.target_width = 32;
    cfg.capture.target_height = 18;
    cfg.agent.step_delay_secs = 0.0;
    cfg.agent.action_settle_ms = 0;

    let llm = ScriptedLlmClient::demo();
    let outcome = run_agent(
        "sys",
        "center the cursor",
        &llm,
        Box::new(HeadlessDesktop::new(640, 360)),
        &cfg,
    )
    .await
    .unwrap();

    assert_eq!(outcome.stop, StopReason::Done);
    assert!(!outcome.answer.is_empty());
    assert!(cfg.capture.dump_dir.join("screen_0003.png").exists());
    assert!(cfg.capture.dump_dir.join("screen_0004.png").exists());

    let requests = llm.requests();
    assert_eq!(requests[0]["model"], "model-identifier");
    assert_eq!(requests[0]["max_tokens"], 2048);
    assert_eq!(requests[0]["tools"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_step_budget_with_scripted_client() {
    let dir = TempDir::new().unwrap();
    let mut cfg = AppConfig::default();
    cfg.capture.dump_dir = dir.path().to_path_buf();
    cfg.agent.max_steps = 2;
    cfg.agent.step_delay_secs = 0.0;
    cfg.agent.action_settle_ms = 0;

    let llm = ScriptedLlmClient::new()
        .tool_calls(vec![ToolCall::new("1", "scroll_down", "")])
        .tool_calls(vec![ToolCall::new("2", "scroll_down", "")])
        .reply(Message::assistant("never reached"));
    let outcome = run_agent("sys", "scroll", &llm, Box::new(HeadlessDesktop::new(64, 64)), &cfg)
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::StepBudgetExhausted);
    assert_eq!(outcome.answer, "");
    assert_eq!(llm.requests().len(), 2);
}
