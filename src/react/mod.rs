//! 决策层：与模型服务的回合制工具调用循环

pub mod loop_;

pub use loop_::{AgentOutcome, AgentRun, LoopSettings, StopReason, TOO_MANY_CALLS_MESSAGE};
