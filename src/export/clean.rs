//! 清洗输出：把原始日志片段渲染为可读的请求 / 响应序列
//!
//! 每条记录输出横幅（方向 + 时间戳）与缩进 JSON（已脱敏）；JSON 无法解析时输出错误标记，
//! 并从标记行的下一行继续扫描，截断的记录不会吞掉其后的记录。

use std::path::{Path, PathBuf};

use crate::export::redact::redact_images;
use crate::export::scanner::{scan_records_with, LogRecord, ScanPolicy};
use crate::export::ExportError;

/// 横幅分隔线宽度
pub const BANNER_WIDTH: usize = 80;
/// 无法解析时的内联错误标记
pub const PARSE_ERROR_MARKER: &str = "[ERROR: Could not parse JSON]";

/// 渲染单条记录
fn render_record(record: &LogRecord, out: &mut Vec<String>) {
    let rule = "=".repeat(BANNER_WIDTH);
    let stamp = record.stamp_text.as_deref().unwrap_or("TIMESTAMP");
    out.push(format!("\n{rule}"));
    out.push(format!("[{stamp}] {}:", record.direction.label()));
    out.push(rule);

    let rendered = record.payload.clone().and_then(|mut payload| {
        redact_images(&mut payload);
        serde_json::to_string_pretty(&payload).ok()
    });
    out.push(rendered.unwrap_or_else(|| PARSE_ERROR_MARKER.to_string()));
}

/// 清洗整段文本
pub fn render_clean(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = Vec::new();
    for scanned in scan_records_with(&lines, ScanPolicy::Clean) {
        render_record(&scanned.record, &mut out);
    }
    out.join("\n")
}

/// `<stem>_clean<ext>`，与输入同目录
pub fn clean_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_clean{ext}"))
}

/// 读取原始导出文件，写出清洗结果，返回清洗文件路径
pub async fn clean_log_file(input: &Path) -> Result<PathBuf, ExportError> {
    let bytes = tokio::fs::read(input)
        .await
        .map_err(|e| ExportError::io(input, e))?;
    let cleaned = render_clean(&String::from_utf8_lossy(&bytes));
    let out = clean_path_for(input);
    tokio::fs::write(&out, cleaned)
        .await
        .map_err(|e| ExportError::io(&out, e))?;
    Ok(out)
}
