//! LLM 层：模型服务抽象与实现（OpenAI 兼容 HTTP / 脚本化 Mock）

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpLlmClient;
pub use mock::{ScriptStep, ScriptedLlmClient};
pub use traits::{ChatRequest, LlmClient, LlmError, SamplingParams};
