//! 单次运行的会话状态
//!
//! Session 持有对话历史（上下文存储）与截图序号（DumpState）；由 Agent 循环独占修改，不跨运行共享。

use crate::memory::ConversationMemory;

/// 截图文件序号：每次成功截图后递增，是分发调用之间唯一需要保留的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpState {
    next_index: u32,
}

impl DumpState {
    pub fn new(start: u32) -> Self {
        Self { next_index: start }
    }

    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// `<prefix><四位补零序号>.<ext>`
    pub fn file_name(&self, prefix: &str, ext: &str) -> String {
        format!("{prefix}{:04}.{ext}", self.next_index)
    }

    pub fn advance(&mut self) {
        self.next_index += 1;
    }
}

/// 会话：消息历史 + 截图序号
#[derive(Debug, Clone)]
pub struct Session {
    pub memory: ConversationMemory,
    pub dump: DumpState,
}

impl Session {
    pub fn new(system_prompt: &str, task_prompt: &str, dump_start: u32) -> Self {
        Self {
            memory: ConversationMemory::seeded(system_prompt, task_prompt),
            dump: DumpState::new(dump_start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_file_name_zero_padded() {
        let mut dump = DumpState::new(1);
        assert_eq!(dump.file_name("screen_", "png"), "screen_0001.png");
        dump.advance();
        assert_eq!(dump.file_name("screen_", "png"), "screen_0002.png");
        assert_eq!(DumpState::new(12345).file_name("s", "png"), "s12345.png");
    }

    #[test]
    fn test_session_seeded() {
        let s = Session::new("sys", "task", 3);
        assert_eq!(s.memory.len(), 2);
        assert_eq!(s.dump.next_index(), 3);
    }
}
