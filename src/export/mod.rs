//! 模型服务日志导出
//!
//! - scanner: 标记识别与花括号平衡的 JSON 记录提取
//! - redact: 内联图片指纹化
//! - clean: 可读的请求 / 响应清洗产物
//! - window: 按运行时间窗口导出原始日志

pub mod clean;
pub mod redact;
pub mod scanner;
pub mod window;

use std::path::{Path, PathBuf};

pub use clean::{clean_log_file, render_clean};
pub use redact::redact_images;
pub use scanner::{scan_records, Direction, LogRecord};
pub use window::{ExportPaths, SessionExporter};

/// 导出失败（只记录日志，不影响运行结果）
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No log files found in: {0}")]
    NoLogFiles(PathBuf),
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
