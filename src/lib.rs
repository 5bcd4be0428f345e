//! DeskPilot - 桌面操控智能体
//!
//! 模块划分：
//! - **agent**: 无头 Agent 运行时（按配置组装并运行一个任务）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 运行错误、会话状态、生命周期与中断处理
//! - **export**: 模型服务日志的时间窗口导出与清洗
//! - **llm**: 模型客户端抽象与实现（OpenAI 兼容 HTTP / 脚本化 Mock）
//! - **memory**: 对话历史与截图裁剪
//! - **react**: 单工具调用回合制主循环
//! - **scenarios**: 系统提示词与内置场景
//! - **tools**: 桌面工具目录、参数解析与分发

pub mod agent;
pub mod config;
pub mod core;
pub mod export;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod scenarios;
pub mod tools;

pub use agent::run_agent;
pub use config::{load_config, AppConfig};
