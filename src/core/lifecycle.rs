//! 运行生命周期：记录日志目录与起止时间，并在结束时（正常 / 失败 / 中断）做一次尽力导出
//!
//! 起止时间只写一次；导出错误只记录日志，从不影响运行结果。

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::export::{ExportPaths, SessionExporter};

/// 运行的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Completed,
    Failed,
    Interrupted,
}

/// 本地时间（与模型服务日志的时间戳一致）
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// 生命周期状态，只由主任务写入
#[derive(Debug, Default)]
pub struct RunLifecycle {
    log_dir: Option<PathBuf>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl RunLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录日志目录与开始时间；重复调用无效
    pub fn begin(&mut self, log_dir: impl Into<PathBuf>, start: NaiveDateTime) {
        if self.start.is_none() {
            self.log_dir = Some(log_dir.into());
            self.start = Some(start);
        }
    }

    /// 记录结束时间；重复调用无效
    pub fn mark_end(&mut self, at: NaiveDateTime) {
        self.end.get_or_insert(at);
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    /// 补齐结束时间后导出；未记录开始时间或日志目录时跳过
    pub async fn finish(&mut self, exporter: &SessionExporter, how: RunEnd) -> Option<ExportPaths> {
        let (Some(log_dir), Some(start)) = (self.log_dir.clone(), self.start) else {
            tracing::debug!(?how, "run never started, skipping log export");
            return None;
        };
        self.mark_end(local_now());
        let end = self.end.unwrap_or(start);

        match how {
            RunEnd::Interrupted => tracing::warn!("interrupted, exporting logs before exit"),
            _ => tracing::info!(?how, "exporting logs"),
        }

        match exporter.export_window(&log_dir, start, end).await {
            Ok(paths) => {
                tracing::info!(raw = %paths.raw.display(), "model server raw log written");
                tracing::info!(clean = %paths.clean.display(), "model server cleaned log written");
                Some(paths)
            }
            Err(e) => {
                tracing::error!(error = %e, "log export failed");
                None
            }
        }
    }
}
