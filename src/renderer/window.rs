//! macroquad 全屏窗口: 显示成品帧并读取按键

use std::borrow::Cow;

use ::image::imageops::{self, FilterType};
use ::image::RgbaImage;
use macroquad::prelude::*;

/// 纹理边长上限, 超出时等比缩小后再上传
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// 运行期按键命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `s`: 停止检测
    Stop,
    /// `r`: 重置追踪
    Reset,
}

/// 帧显示接口, 控制循环只依赖它
#[allow(async_fn_in_trait)]
pub trait Display {
    /// 显示一帧并返回本帧按下的命令
    async fn present(&mut self, frame: &RgbaImage) -> Option<Command>;

    /// 持续显示一帧直到按下任意键
    async fn wait_for_key(&mut self, frame: &RgbaImage);
}

/// 全屏窗口, 画面等比缩放居中
#[derive(Default)]
pub struct Window {
    texture: Option<Texture2D>,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// 上传帧到纹理; 只在分辨率变化时重建纹理
    fn upload(&mut self, frame: &RgbaImage) {
        let frame = fit_texture(frame);
        let (w, h) = (frame.width() as u16, frame.height() as u16);
        let needs_rebuild = match &self.texture {
            Some(tex) => tex.width() != w as f32 || tex.height() != h as f32,
            None => true,
        };

        if needs_rebuild {
            let texture = Texture2D::from_rgba8(w, h, frame.as_raw());
            texture.set_filter(FilterMode::Linear);
            self.texture = Some(texture);
        } else if let Some(tex) = &self.texture {
            tex.update(&Image {
                bytes: frame.as_raw().clone(),
                width: w,
                height: h,
            });
        }
    }

    fn draw(&self) {
        clear_background(BLACK);
        let Some(texture) = &self.texture else {
            return;
        };

        let scale = (screen_width() / texture.width()).min(screen_height() / texture.height());
        let scaled_width = texture.width() * scale;
        let scaled_height = texture.height() * scale;
        draw_texture_ex(
            texture,
            (screen_width() - scaled_width) / 2.0,
            (screen_height() - scaled_height) / 2.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(scaled_width, scaled_height)),
                ..Default::default()
            },
        );
    }
}

impl Display for Window {
    async fn present(&mut self, frame: &RgbaImage) -> Option<Command> {
        self.upload(frame);
        self.draw();
        next_frame().await;

        if is_key_pressed(KeyCode::S) {
            Some(Command::Stop)
        } else if is_key_pressed(KeyCode::R) {
            Some(Command::Reset)
        } else {
            None
        }
    }

    async fn wait_for_key(&mut self, frame: &RgbaImage) {
        self.upload(frame);
        // 清掉启动前残留的按键
        let _ = get_last_key_pressed();
        loop {
            self.draw();
            next_frame().await;
            if get_last_key_pressed().is_some() {
                break;
            }
        }
    }
}

/// 等比缩小到纹理上限以内, 小图原样借用
pub fn fit_texture(frame: &RgbaImage) -> Cow<'_, RgbaImage> {
    let (w, h) = frame.dimensions();
    if w <= MAX_TEXTURE_SIZE && h <= MAX_TEXTURE_SIZE {
        return Cow::Borrowed(frame);
    }
    let scale = (MAX_TEXTURE_SIZE as f64 / w as f64).min(MAX_TEXTURE_SIZE as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, MAX_TEXTURE_SIZE);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, MAX_TEXTURE_SIZE);
    Cow::Owned(imageops::resize(frame, nw, nh, FilterType::Triangle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_frames_are_borrowed() {
        let frame = RgbaImage::new(1920, 1080);
        assert!(matches!(fit_texture(&frame), Cow::Borrowed(_)));
    }

    #[test]
    fn oversized_frames_shrink_within_texture_limit() {
        let frame = RgbaImage::new(70_000, 10);
        let fitted = fit_texture(&frame);
        assert_eq!(fitted.dimensions(), (MAX_TEXTURE_SIZE, 1));
        assert_eq!(
            fitted.as_raw().len(),
            fitted.width() as usize * fitted.height() as usize * 4
        );

        let tall = RgbaImage::new(100, 16_384);
        assert_eq!(fit_texture(&tall).dimensions(), (50, MAX_TEXTURE_SIZE));
    }
}
