//! 视频输入系统 (Video Input System)
//!
//! - FrameSource: 帧源接口, 主循环只依赖它
//! - CameraSource: 本地摄像头采集 (DirectShow/AVFoundation/V4L2)
//! - CaptureFilter: FFmpeg 帧过滤与 YUV → RGBA 转换
use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};

pub mod camera;
pub mod capture_filter;

pub use camera::{list_devices, CameraSource};
pub use capture_filter::{yuv420p_to_rgba, CaptureFilter, Yuv420pPlanes};

/// 帧源: 逐帧读取, 结束后释放设备
pub trait FrameSource {
    /// 读取下一帧; 失败或结束返回 None
    fn read(&mut self) -> Option<RgbaImage>;

    /// 释放底层设备, 重复调用无副作用
    fn release(&mut self);
}

/// 从磁盘读取一张图片
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("无法读取图片: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_an_error() {
        assert!(load_image(Path::new("/nonexistent/zoo.jpg")).is_err());
    }

    #[test]
    fn loads_png_from_disk() {
        let path = std::env::temp_dir().join("animal_tracker_load_image.png");
        RgbaImage::from_pixel(4, 3, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
        let _ = std::fs::remove_file(&path);
    }
}
