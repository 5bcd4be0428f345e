//! 内置系统提示词与演练场景

/// 系统提示词
pub const SYSTEM_PROMPT: &str = "You are an AI controlling a Windows 11 laptop. You interact with the computer exclusively through tool calls. Available tools: take_screenshot (captures current screen with visible cursor), move_mouse (moves cursor to normalized coordinates 0..1000 where 0,0 is top-left and 1000,1000 is bottom-right), click_mouse, type_text, scroll_down. Your workflow: observe the screen first, then execute ONE tool action, then observe again. Always verify cursor visibility in screenshots. You may answer in plain text only when done, stop calling tools only after you complete your task in full.";

/// 一个演练场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub name: &'static str,
    pub task_prompt: &'static str,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "Basic cursor observation",
        task_prompt: "Look at the screen and report the current cursor position and shape.",
    },
    Scenario {
        name: "Center screen cursor movement",
        task_prompt: "Look at the screen, then move the mouse cursor to the center of the screen.",
    },
    Scenario {
        name: "Click at current position",
        task_prompt: "Look at the screen, then perform a click at the current cursor position, then verify the click result.",
    },
    Scenario {
        name: "Text typing test",
        task_prompt: "Look at the screen, click into any focused text input if needed, then type \"hello\".",
    },
];

/// 按 1 起始的编号取场景
pub fn by_number(n: usize) -> Option<&'static Scenario> {
    n.checked_sub(1).and_then(|i| SCENARIOS.get(i))
}
