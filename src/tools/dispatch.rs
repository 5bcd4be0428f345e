//! 工具分发
//!
//! dispatch(name, arguments, call_id, dump) 校验参数后调用 Desktop，组装 tool 结果消息；
//! 截图成功时额外返回一条携带图片的 user 观察消息，并把 PNG 写入 dump 目录（序号递增）。
//! 所有错误都折叠为 tool 消息内容，不会越过此边界；每次调用输出结构化审计日志（JSON）。

use std::path::PathBuf;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use serde_json::Value;

use crate::core::session::DumpState;
use crate::memory::{ContentPart, Message};
use crate::memory::IMAGE_PLACEHOLDER;
use crate::tools::args::{parse_args, parse_point, parse_text};
use crate::tools::catalog::ToolName;
use crate::tools::desktop::Desktop;
use crate::tools::outcome::{ok_payload, CaptureFields, ToolErrorKind, ToolFailure};

/// 截图落盘与缩放设置
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub dump_dir: PathBuf,
    pub dump_prefix: String,
    pub target_w: u32,
    pub target_h: u32,
}

/// 一次分发的产物：tool 结果消息 + 可选观察消息
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub result: Message,
    pub observation: Option<Message>,
}

/// 工具分发器：持有 Desktop 与截图设置
pub struct ToolDispatcher {
    desktop: Box<dyn Desktop>,
    capture: CaptureSettings,
    /// 输入类动作后的等待（让界面完成响应）
    action_settle: Duration,
}

impl ToolDispatcher {
    pub fn new(desktop: Box<dyn Desktop>, capture: CaptureSettings) -> Self {
        Self {
            desktop,
            capture,
            action_settle: Duration::from_millis(60),
        }
    }

    pub fn with_action_settle(mut self, settle: Duration) -> Self {
        self.action_settle = settle;
        self
    }

    /// 执行一次工具调用；永不返回 Err，失败以 `{"ok":false,...}` 形式写入结果消息
    pub async fn dispatch(
        &mut self,
        name: &str,
        arguments: Option<&Value>,
        call_id: &str,
        dump: &mut DumpState,
    ) -> Dispatch {
        let start = Instant::now();
        let outcome = match name.parse::<ToolName>() {
            Ok(tool) => self.run(tool, arguments, dump).await,
            Err(unknown) => Err(ToolFailure::new(ToolErrorKind::UnknownTool, unknown)),
        };

        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": name,
            "ok": outcome.is_ok(),
            "outcome": outcome.as_ref().err().map(|f| f.kind.as_str()).unwrap_or("ok"),
            "duration_ms": start.elapsed().as_millis() as u64,
        });
        tracing::info!(audit = %audit, "tool");

        match outcome {
            Ok((content, observation)) => Dispatch {
                result: Message::tool(call_id, name, content),
                observation,
            },
            Err(failure) => Dispatch {
                result: Message::tool(call_id, name, failure.to_payload()),
                observation: None,
            },
        }
    }

    async fn run(
        &mut self,
        tool: ToolName,
        arguments: Option<&Value>,
        dump: &mut DumpState,
    ) -> Result<(String, Option<Message>), ToolFailure> {
        match tool {
            ToolName::TakeScreenshot => {
                parse_args(arguments)?;
                let (fields, observation) = self.take_screenshot(dump).await?;
                Ok((ok_payload(Some(&fields)), Some(observation)))
            }
            ToolName::MoveMouse => {
                let (x, y) = parse_point(arguments)?;
                self.desktop.move_to(x, y).map_err(failed)?;
                self.settle().await;
                Ok((ok_payload(None), None))
            }
            ToolName::ClickMouse => {
                parse_args(arguments)?;
                self.desktop.click().map_err(failed)?;
                self.settle().await;
                Ok((ok_payload(None), None))
            }
            ToolName::TypeText => {
                let text = parse_text(arguments)?;
                self.desktop.type_text(&text).map_err(failed)?;
                self.settle().await;
                Ok((ok_payload(None), None))
            }
            ToolName::ScrollDown => {
                parse_args(arguments)?;
                self.desktop.scroll_down().map_err(failed)?;
                self.settle().await;
                Ok((ok_payload(None), None))
            }
        }
    }

    async fn take_screenshot(
        &mut self,
        dump: &mut DumpState,
    ) -> Result<(CaptureFields, Message), ToolFailure> {
        let capture = self
            .desktop
            .capture(self.capture.target_w, self.capture.target_h)
            .map_err(failed)?;

        let path = self.capture.dump_dir.join(dump.file_name(&self.capture.dump_prefix, "png"));
        tokio::fs::write(&path, &capture.png)
            .await
            .map_err(|e| ToolFailure::new(ToolErrorKind::ToolFailed, format!("write {}: {e}", path.display())))?;
        dump.advance();

        let data_url = format!("data:image/png;base64,{}", B64.encode(&capture.png));
        let observation = Message::user_parts(vec![
            ContentPart::text(IMAGE_PLACEHOLDER),
            ContentPart::image_url(data_url),
        ]);
        let fields = CaptureFields {
            file: path.display().to_string(),
            screen_w: capture.screen_w,
            screen_h: capture.screen_h,
        };
        Ok((fields, observation))
    }

    async fn settle(&self) {
        if !self.action_settle.is_zero() {
            tokio::time::sleep(self.action_settle).await;
        }
    }
}

fn failed(e: anyhow::Error) -> ToolFailure {
    ToolFailure::new(ToolErrorKind::ToolFailed, format!("{e:#}"))
}
