//! DeskPilot - 桌面操控智能体
//!
//! 入口：解析命令行、初始化日志与配置，运行一个场景或任务；结束（含中断）时导出模型服务日志。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use deskpilot::agent::start_run;
use deskpilot::config::load_config;
use deskpilot::core::{local_now, RunEnd, RunLifecycle, ShutdownManager};
use deskpilot::export::SessionExporter;
use deskpilot::llm::{HttpLlmClient, LlmClient, ScriptedLlmClient};
use deskpilot::scenarios::{self, SYSTEM_PROMPT};
use deskpilot::tools::HeadlessDesktop;
use deskpilot::{observability, run_agent};

#[derive(Debug, Parser)]
#[command(name = "deskpilot", version, about = "Desktop-control agent driven by a local chat model")]
struct Cli {
    /// 场景编号（从 1 开始）
    scenario: Option<usize>,

    /// 直接指定任务文本（优先于场景编号）
    #[arg(long)]
    task: Option<String>,

    /// 额外的配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 列出内置场景后退出
    #[arg(long)]
    list_scenarios: bool,

    /// 使用脚本化模型回复，不连接模型服务
    #[arg(long)]
    dry_run: bool,
}

fn resolve_task(cli: &Cli) -> anyhow::Result<String> {
    if let Some(task) = cli.task.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(task.to_string());
    }
    let Some(n) = cli.scenario else {
        bail!("Usage: deskpilot <scenario_num> | --task <text>");
    };
    match scenarios::by_number(n) {
        Some(sc) => Ok(sc.task_prompt.to_string()),
        None => bail!("Invalid scenario: {n} (1..={})", scenarios::SCENARIOS.len()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    observability::init();

    if cli.list_scenarios {
        for (i, sc) in scenarios::SCENARIOS.iter().enumerate() {
            println!("{}. {}", i + 1, sc.name);
        }
        return Ok(());
    }

    let task = resolve_task(&cli)?;
    let cfg = load_config(cli.config.clone()).context("Failed to load config")?;

    let llm: Box<dyn LlmClient> = if cli.dry_run {
        Box::new(ScriptedLlmClient::demo())
    } else {
        Box::new(
            HttpLlmClient::new(&cfg.llm.endpoint, cfg.llm.api_key.clone(), cfg.llm.timeout_secs)
                .context("Failed to build model client")?,
        )
    };
    let desktop = Box::new(HeadlessDesktop::new(
        cfg.capture.screen_width,
        cfg.capture.screen_height,
    ));

    let shutdown = Arc::new(ShutdownManager::new());
    shutdown.install_signal_handlers();

    let command_label = std::env::args().collect::<Vec<_>>().join(" ");
    let exporter = SessionExporter::new(&cfg.export.output_dir, command_label)
        .with_settle(cfg.export.settle());
    let mut lifecycle = RunLifecycle::new();
    start_run(&cfg, &mut lifecycle)
        .await
        .context("Run setup failed")?;

    let result = shutdown
        .run_until_shutdown(run_agent(SYSTEM_PROMPT, &task, llm.as_ref(), desktop, &cfg))
        .await;

    match result {
        Some(Ok(outcome)) => {
            lifecycle.mark_end(local_now());
            if !outcome.answer.is_empty() {
                println!("{}", outcome.answer);
            }
            lifecycle.finish(&exporter, RunEnd::Completed).await;
            Ok(())
        }
        Some(Err(e)) => {
            lifecycle.mark_end(local_now());
            tracing::error!(error = %e, "agent run failed");
            lifecycle.finish(&exporter, RunEnd::Failed).await;
            Err(e).context("Agent run failed")
        }
        None => {
            lifecycle.finish(&exporter, RunEnd::Interrupted).await;
            std::process::exit(1);
        }
    }
}
