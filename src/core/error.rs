//! 运行错误类型
//!
//! 工具层错误不在此列（它们作为 tool 消息内容返回给模型）；这里只有会中止运行的错误。

use thiserror::Error;

use crate::llm::LlmError;

/// Agent 运行过程中的致命错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型服务调用失败（传输 / 超时 / 非成功响应），不重试
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// 创建 dump 目录等运行前准备失败
    #[error("Setup failed: {0}")]
    Setup(String),
}
