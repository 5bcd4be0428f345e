//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `DESKPILOT__*` 覆盖（双下划线表示嵌套，如 `DESKPILOT__AGENT__MAX_STEPS=20`）。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::llm::SamplingParams;
use crate::tools::CaptureSettings;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub capture: CaptureSection,
    pub agent: AgentSection,
    pub export: ExportSection,
}

/// [llm] 段：OpenAI 兼容的本地模型服务
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 完整的 chat completions URL
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1/chat/completions".to_string(),
            model: "model-identifier".to_string(),
            api_key: None,
            timeout_secs: 240,
            temperature: 0.2,
            max_tokens: 2048,
        }
    }
}

impl LlmSection {
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// [capture] 段：截图缩放尺寸与保存位置；screen_* 为无头桌面的屏幕尺寸
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    pub target_width: u32,
    pub target_height: u32,
    pub dump_dir: PathBuf,
    pub dump_prefix: String,
    pub dump_start: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            target_width: 1344,
            target_height: 756,
            dump_dir: PathBuf::from("dumps"),
            dump_prefix: "screen_".to_string(),
            dump_start: 1,
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

impl CaptureSection {
    pub fn settings(&self) -> CaptureSettings {
        CaptureSettings {
            dump_dir: self.dump_dir.clone(),
            dump_prefix: self.dump_prefix.clone(),
            target_w: self.target_width,
            target_h: self.target_height,
        }
    }
}

/// [agent] 段：回合上限与节奏
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub keep_last_screenshots: usize,
    pub max_steps: usize,
    pub step_delay_secs: f64,
    /// 鼠标 / 键盘动作后的等待（毫秒）
    pub action_settle_ms: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            keep_last_screenshots: 2,
            max_steps: 10,
            step_delay_secs: 0.4,
            action_settle_ms: 60,
        }
    }
}

impl AgentSection {
    /// 负数或非有限值按 0 处理
    pub fn step_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.step_delay_secs).unwrap_or(Duration::ZERO)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }
}

/// [export] 段：模型服务日志导出
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub enabled: bool,
    /// 未设置时为 ~/.lmstudio/server-logs/<当前年月>
    pub log_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub settle_secs: u64,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            enabled: true,
            log_dir: None,
            output_dir: PathBuf::from("."),
            settle_secs: 5,
        }
    }
}

impl ExportSection {
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }
}

/// ~/.lmstudio/server-logs/<YYYY-MM>（按本地时间）
pub fn default_log_dir() -> PathBuf {
    let month = chrono::Local::now().format("%Y-%m").to_string();
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lmstudio")
        .join("server-logs")
        .join(month)
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("DESKPILOT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// 从 config 目录加载配置，环境变量 DESKPILOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 DESKPILOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    build_config(config_path.as_deref(), env_source())
}

fn build_config(
    config_path: Option<&Path>,
    env: config::Environment,
) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
        }
    }

    builder.add_source(env).build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env() -> config::Environment {
        env_source().source(Some(HashMap::new()))
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.endpoint, "http://localhost:1234/v1/chat/completions");
        assert_eq!(cfg.llm.timeout_secs, 240);
        assert_eq!(cfg.capture.target_width, 1344);
        assert_eq!(cfg.capture.target_height, 756);
        assert_eq!(cfg.agent.keep_last_screenshots, 2);
        assert_eq!(cfg.agent.max_steps, 10);
        assert_eq!(cfg.agent.step_delay(), Duration::from_millis(400));
        assert!(cfg.export.enabled);
        assert!(cfg.export.resolved_log_dir().ends_with(
            chrono::Local::now().format("%Y-%m").to_string()
        ));
    }

    #[test]
    fn test_file_overrides_partial_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[agent]\nmax_steps = 3\n\n[export]\nlog_dir = \"/var/log/lm\"\nenabled = false\n",
        )
        .unwrap();

        let cfg = build_config(Some(&path), no_env()).unwrap();
        assert_eq!(cfg.agent.max_steps, 3);
        assert_eq!(cfg.agent.keep_last_screenshots, 2);
        assert!(!cfg.export.enabled);
        assert_eq!(cfg.export.resolved_log_dir(), PathBuf::from("/var/log/lm"));
        assert_eq!(cfg.llm.model, "model-identifier");
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").unwrap();

        let env = env_source().source(Some(HashMap::from([
            ("DESKPILOT__LLM__MODEL".to_string(), "from-env".to_string()),
            ("DESKPILOT__AGENT__MAX_STEPS".to_string(), "4".to_string()),
        ])));
        let cfg = build_config(Some(&path), env).unwrap();
        assert_eq!(cfg.llm.model, "from-env");
        assert_eq!(cfg.agent.max_steps, 4);
    }

    #[test]
    fn test_negative_step_delay_is_zero() {
        let section = AgentSection {
            step_delay_secs: -1.0,
            ..AgentSection::default()
        };
        assert_eq!(section.step_delay(), Duration::ZERO);
    }
}
