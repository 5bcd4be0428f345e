//! 工具层：工具目录、参数校验、分发边界与桌面能力接口

pub mod args;
pub mod catalog;
pub mod desktop;
pub mod dispatch;
pub mod headless;
pub mod outcome;

pub use catalog::{tools_schema, ToolName};
pub use desktop::{Capture, Desktop};
pub use dispatch::{CaptureSettings, Dispatch, ToolDispatcher};
pub use headless::HeadlessDesktop;
pub use outcome::{ToolErrorKind, ToolFailure};
