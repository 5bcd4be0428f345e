//! 桌面能力接口
//!
//! 截图、移动光标、点击、输入文本、滚动均由 Desktop 实现提供（平台相关的副作用原语）；
//! 分发层只负责参数校验与结果组装。

/// 一次截图的结果：已编码的 PNG 与源屏幕尺寸
#[derive(Debug, Clone)]
pub struct Capture {
    pub png: Vec<u8>,
    pub screen_w: u32,
    pub screen_h: u32,
}

/// 桌面能力：坐标为 0..1000 归一化值（调用方已钳制）
pub trait Desktop: Send {
    /// 截图并缩放到 target_w x target_h（含可见光标）
    fn capture(&mut self, target_w: u32, target_h: u32) -> anyhow::Result<Capture>;

    fn move_to(&mut self, x_norm: f64, y_norm: f64) -> anyhow::Result<()>;

    fn click(&mut self) -> anyhow::Result<()>;

    fn type_text(&mut self, text: &str) -> anyhow::Result<()>;

    /// 向下滚动一格
    fn scroll_down(&mut self) -> anyhow::Result<()>;
}

/// 归一化坐标换算为像素坐标（四舍五入，落在 [0, size-1]）
pub fn norm_to_pixel(x_norm: f64, y_norm: f64, screen_w: u32, screen_h: u32) -> (u32, u32) {
    let scale = |v: f64, size: u32| -> u32 {
        let v = v.clamp(0.0, 1000.0);
        ((v / 1000.0) * f64::from(size.saturating_sub(1))).round() as u32
    };
    (scale(x_norm, screen_w), scale(y_norm, screen_h))
}
