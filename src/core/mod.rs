//! 核心层：运行错误、会话状态、生命周期与中断处理

pub mod error;
pub mod lifecycle;
pub mod session;
pub mod shutdown;

pub use error::AgentError;
pub use lifecycle::{local_now, RunEnd, RunLifecycle};
pub use session::{DumpState, Session};
pub use shutdown::{ShutdownManager, ShutdownReason};
