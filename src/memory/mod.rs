//! 记忆层：本次运行的对话历史（上下文存储）与截图裁剪策略

pub mod conversation;
pub mod pruning;

pub use conversation::{
    ContentPart, ConversationMemory, FunctionCall, ImageUrl, Message, MessageContent, Role,
    ToolCall,
};
pub use pruning::{prune_image_messages, IMAGE_PLACEHOLDER};
