//! 标注绘制 + 窗口显示
//!
//! 绘制在 CPU 上完成 (imageproc), 窗口只负责把成品帧贴到屏幕

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{info, warn};

use crate::detection::{BBox, Rgb};

pub mod window;

pub use window::{Command, Display, Window};

/// 边框线宽 (像素)
pub const BORDER_WIDTH: i32 = 2;
/// 标签字号
pub const LABEL_SCALE: f32 = 20.0;
/// 标签基线与框顶的距离
const LABEL_OFFSET: i32 = 10;

/// 一个待绘制的标注: 框 + 文字 + 颜色
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub bbox: BBox,
    pub text: String,
    pub color: Rgb,
}

impl Annotation {
    pub fn new(bbox: BBox, text: impl Into<String>, color: Rgb) -> Self {
        Self {
            bbox,
            text: text.into(),
            color,
        }
    }
}

/// 加载标签字体, 找不到时返回 None (只画框)
pub fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("⚠️ 无法读取字体 {}: {}, 标签文字将不显示", path.display(), e);
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            info!("✅ 字体加载成功: {}", path.display());
            Some(font)
        }
        Err(e) => {
            warn!("⚠️ 字体解析失败 {}: {}", path.display(), e);
            None
        }
    }
}

/// 在帧上绘制所有标注
pub fn draw_annotations(frame: &mut RgbaImage, annotations: &[Annotation], font: Option<&FontVec>) {
    for annotation in annotations {
        draw_annotation(frame, annotation, font);
    }
}

fn draw_annotation(frame: &mut RgbaImage, annotation: &Annotation, font: Option<&FontVec>) {
    let (r, g, b) = annotation.color;
    let color = Rgba([r, g, b, 255]);
    let bbox = &annotation.bbox;

    // 向内逐圈描边, 线宽不超出框本身
    for i in 0..BORDER_WIDTH {
        let w = bbox.width() - 2 * i;
        let h = bbox.height() - 2 * i;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(bbox.x1 + i, bbox.y1 + i).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(frame, rect, color);
    }

    if let Some(font) = font {
        if annotation.text.is_empty() {
            return;
        }
        let scale = PxScale::from(LABEL_SCALE);
        let y = (bbox.y1 - LABEL_OFFSET - LABEL_SCALE as i32).max(0);
        draw_text_mut(frame, color, bbox.x1, y, scale, font, &annotation.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn draws_two_pixel_border_in_color() {
        let mut frame = RgbaImage::from_pixel(50, 50, BLACK);
        let ann = Annotation::new(BBox::new(10, 10, 30, 30), "", (0, 255, 0));
        draw_annotations(&mut frame, &[ann], None);

        let green = Rgba([0, 255, 0, 255]);
        assert_eq!(*frame.get_pixel(10, 20), green);
        assert_eq!(*frame.get_pixel(11, 20), green);
        assert_eq!(*frame.get_pixel(12, 20), BLACK);
        assert_eq!(*frame.get_pixel(29, 29), green);
        assert_eq!(*frame.get_pixel(20, 20), BLACK);
        assert_eq!(*frame.get_pixel(5, 5), BLACK);
    }

    #[test]
    fn degenerate_box_is_skipped() {
        let mut frame = RgbaImage::from_pixel(8, 8, BLACK);
        let ann = Annotation::new(BBox::new(4, 4, 4, 6), "dog", (255, 0, 0));
        draw_annotations(&mut frame, &[ann], None);
        assert!(frame.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn box_partly_outside_frame_is_clipped() {
        let mut frame = RgbaImage::from_pixel(20, 20, BLACK);
        let ann = Annotation::new(BBox::new(-5, -5, 10, 10), "", (0, 0, 255));
        draw_annotations(&mut frame, &[ann], None);
        assert_eq!(*frame.get_pixel(9, 0), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn missing_font_is_none() {
        assert!(load_font(Path::new("/nonexistent/font.ttf")).is_none());
    }
}
