//! 无头桌面：纯内存的 Desktop 实现
//!
//! 记录光标位置、点击次数、已输入文本与滚动次数；截图渲染为纯色画面并绘制光标十字，
//! 用 image 编码为 PNG。用于演练（dry run）与测试，无需任何平台输入/截屏接口。

use std::io::Cursor;

use anyhow::Context;
use image::{ImageFormat, Rgb, RgbImage};

use crate::tools::desktop::{norm_to_pixel, Capture, Desktop};

const BACKGROUND: Rgb<u8> = Rgb([32, 48, 64]);
const CURSOR: Rgb<u8> = Rgb([255, 255, 255]);
const CURSOR_ARM: i64 = 6;

/// 无头桌面状态
#[derive(Debug, Clone)]
pub struct HeadlessDesktop {
    screen_w: u32,
    screen_h: u32,
    cursor: (u32, u32),
    pub clicks: usize,
    pub scrolls: usize,
    pub typed: String,
    pub captures: usize,
}

impl HeadlessDesktop {
    pub fn new(screen_w: u32, screen_h: u32) -> Self {
        let screen_w = screen_w.max(1);
        let screen_h = screen_h.max(1);
        Self {
            screen_w,
            screen_h,
            cursor: (screen_w / 2, screen_h / 2),
            clicks: 0,
            scrolls: 0,
            typed: String::new(),
            captures: 0,
        }
    }

    /// 当前光标像素坐标
    pub fn cursor(&self) -> (u32, u32) {
        self.cursor
    }

    fn render(&self, target_w: u32, target_h: u32) -> RgbImage {
        let mut img = RgbImage::from_pixel(target_w, target_h, BACKGROUND);
        let cx = i64::from(self.cursor.0) * i64::from(target_w) / i64::from(self.screen_w);
        let cy = i64::from(self.cursor.1) * i64::from(target_h) / i64::from(self.screen_h);
        for d in -CURSOR_ARM..=CURSOR_ARM {
            put(&mut img, cx + d, cy);
            put(&mut img, cx, cy + d);
        }
        img
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, CURSOR);
    }
}

impl Desktop for HeadlessDesktop {
    fn capture(&mut self, target_w: u32, target_h: u32) -> anyhow::Result<Capture> {
        let img = self.render(target_w.max(1), target_h.max(1));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .context("encode headless frame as PNG")?;
        self.captures += 1;
        Ok(Capture {
            png: out.into_inner(),
            screen_w: self.screen_w,
            screen_h: self.screen_h,
        })
    }

    fn move_to(&mut self, x_norm: f64, y_norm: f64) -> anyhow::Result<()> {
        self.cursor = norm_to_pixel(x_norm, y_norm, self.screen_w, self.screen_h);
        tracing::debug!(x = self.cursor.0, y = self.cursor.1, "headless cursor moved");
        Ok(())
    }

    fn click(&mut self) -> anyhow::Result<()> {
        self.clicks += 1;
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.typed.push_str(text);
        Ok(())
    }

    fn scroll_down(&mut self) -> anyhow::Result<()> {
        self.scrolls += 1;
        Ok(())
    }
}
