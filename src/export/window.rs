//! 按时间窗口导出本次运行的模型请求 / 响应日志
//!
//! 等待日志落盘后选取目录中最新修改的文件，只保留时间戳位于 `[start - 2s, end + 2s]` 的记录（整段原样保留），
//! 写出原始导出文件，再由 [`clean`](crate::export::clean) 生成清洗版本。

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use chrono::NaiveDateTime;
use regex::Regex;

use crate::export::clean::clean_log_file;
use crate::export::scanner::scan_records;
use crate::export::ExportError;

/// 窗口两端的容差
pub const WINDOW_SLACK_SECS: i64 = 2;

/// 导出产物路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub raw: PathBuf,
    pub clean: PathBuf,
}

/// 会话导出器
#[derive(Debug, Clone)]
pub struct SessionExporter {
    output_dir: PathBuf,
    settle: Duration,
    command_label: String,
}

impl SessionExporter {
    /// `command_label` 为启动命令行，清理后作为产物文件名前缀
    pub fn new(output_dir: impl Into<PathBuf>, command_label: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            settle: Duration::from_secs(5),
            command_label: command_label.into(),
        }
    }

    /// 覆盖落盘等待时间（测试中设为 0）
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// 导出 `[start - 2s, end + 2s]` 内的记录，返回原始与清洗产物路径
    pub async fn export_window(
        &self,
        log_dir: &Path,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<ExportPaths, ExportError> {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let source = newest_log_file(log_dir).await?;
        tracing::info!(source = %source.display(), "exporting model server log window");

        let bytes = tokio::fs::read(&source)
            .await
            .map_err(|e| ExportError::io(&source, e))?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.split('\n').collect();
        let picked = select_window(&lines, start, end);

        let ext = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| ".log".to_string());
        let raw = self
            .output_dir
            .join(format!("{}_raw{ext}", sanitize_command(&self.command_label)));
        tokio::fs::write(&raw, picked.join("\n"))
            .await
            .map_err(|e| ExportError::io(&raw, e))?;

        let clean = clean_log_file(&raw).await?;
        tracing::info!(raw = %raw.display(), clean = %clean.display(), lines = picked.len(), "log export written");
        Ok(ExportPaths { raw, clean })
    }
}

/// 目录中修改时间最新的普通文件
pub async fn newest_log_file(log_dir: &Path) -> Result<PathBuf, ExportError> {
    let mut entries = tokio::fs::read_dir(log_dir)
        .await
        .map_err(|e| ExportError::io(log_dir, e))?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ExportError::io(log_dir, e))?
    {
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, entry.path()));
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| ExportError::NoLogFiles(log_dir.to_path_buf()))
}

/// 选出窗口内记录的全部行；无时间戳的记录一律跳过
pub fn select_window<'a>(lines: &[&'a str], start: NaiveDateTime, end: NaiveDateTime) -> Vec<&'a str> {
    let slack = chrono::Duration::seconds(WINDOW_SLACK_SECS);
    let (t0, t1) = (start - slack, end + slack);

    scan_records(lines)
        .into_iter()
        .filter(|s| s.record.timestamp.is_some_and(|ts| t0 <= ts && ts <= t1))
        .flat_map(|s| {
            let stop = (s.start + s.consumed).min(lines.len());
            lines[s.start..stop].iter().copied()
        })
        .collect()
}

static UNSAFE_CHARS_RE: OnceLock<Regex> = OnceLock::new();

/// 命令行转为安全文件名
pub fn sanitize_command(command: &str) -> String {
    let re = UNSAFE_CHARS_RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());
    let replaced = re.replace_all(command, "_");
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "session".to_string()
    } else {
        trimmed.to_string()
    }
}
