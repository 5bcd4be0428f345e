//! Headless Agent 运行时
//!
//! 由配置组装工具分发器、会话与主循环，对一个任务跑到结束并返回结果。
//! 模型客户端与桌面后端由调用方注入（真实服务 / 脚本化 Mock，OS 桌面 / 无头桌面）。

use crate::config::AppConfig;
use crate::core::{local_now, AgentError, RunLifecycle, Session};
use crate::llm::LlmClient;
use crate::react::{AgentOutcome, AgentRun, LoopSettings};
use crate::tools::{tools_schema, Desktop, ToolDispatcher};

/// 按配置构建循环参数
pub fn loop_settings(cfg: &AppConfig) -> LoopSettings {
    LoopSettings {
        sampling: cfg.llm.sampling(),
        max_steps: cfg.agent.max_steps,
        step_delay: cfg.agent.step_delay(),
        keep_last_screenshots: cfg.agent.keep_last_screenshots,
    }
}

/// 运行前准备：创建截图目录
pub async fn prepare(cfg: &AppConfig) -> Result<(), AgentError> {
    let dump_dir = &cfg.capture.dump_dir;
    tokio::fs::create_dir_all(dump_dir)
        .await
        .map_err(|e| AgentError::Setup(format!("{}: {e}", dump_dir.display())))
}

/// 准备成功后才记录日志目录与开始时间；准备失败时生命周期保持未开始，不会触发导出
pub async fn start_run(cfg: &AppConfig, lifecycle: &mut RunLifecycle) -> Result<(), AgentError> {
    prepare(cfg).await?;
    if cfg.export.enabled {
        lifecycle.begin(cfg.export.resolved_log_dir(), local_now());
    }
    Ok(())
}

/// 对单个任务运行 Agent：确保截图目录存在，播种会话后进入主循环
pub async fn run_agent(
    system_prompt: &str,
    task_prompt: &str,
    llm: &dyn LlmClient,
    desktop: Box<dyn Desktop>,
    cfg: &AppConfig,
) -> Result<AgentOutcome, AgentError> {
    prepare(cfg).await?;
    let capture = cfg.capture.settings();

    let mut dispatcher =
        ToolDispatcher::new(desktop, capture).with_action_settle(cfg.agent.action_settle());
    let tools = tools_schema();
    let mut session = Session::new(system_prompt, task_prompt, cfg.capture.dump_start);

    tracing::info!(
        max_steps = cfg.agent.max_steps,
        keep_last = cfg.agent.keep_last_screenshots,
        "starting agent run"
    );
    AgentRun::new(llm, &mut dispatcher, &tools, loop_settings(cfg))
        .run(&mut session)
        .await
}
