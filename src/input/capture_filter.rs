//! FFmpeg 帧过滤器: 摄像头 YUV420P 帧 → RGBA 图像
//!
//! 运行在 FFmpeg 调度线程中, 通过有界通道把转换后的帧交给主循环

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::{AVMediaType, Frame};
use image::RgbaImage;
use tracing::{debug, info, warn};

/// 分辨率上限, 超出视为损坏帧
const MAX_DIMENSION: u32 = 4096;

pub struct CaptureFilter {
    tx: Sender<RgbaImage>,
    stop: Arc<AtomicBool>,
    total_frames: usize,
    dropped_frames: usize,
}

impl CaptureFilter {
    pub fn new(tx: Sender<RgbaImage>, stop: Arc<AtomicBool>) -> Self {
        Self {
            tx,
            stop,
            total_frames: 0,
            dropped_frames: 0,
        }
    }

    fn drop_frame(&mut self, reason: &str) -> Result<Option<Frame>, String> {
        self.dropped_frames += 1;
        if self.total_frames <= 10 {
            warn!("⚠️ 丢弃帧 #{}: {}", self.total_frames, reason);
        }
        Ok(None)
    }
}

impl FrameFilter for CaptureFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        info!("✅ 采集线程启动");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        if self.stop.load(Ordering::Relaxed) {
            return Err("capture stopped".to_string());
        }
        self.total_frames += 1;

        // 过滤图已经把像素格式统一为 yuv420p
        let rgba = unsafe {
            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                return self.drop_frame("空帧/损坏帧");
            }
            let raw = &*frame.as_ptr();
            let w = raw.width.max(0) as u32;
            let h = raw.height.max(0) as u32;
            if w == 0 || h == 0 || w > MAX_DIMENSION || h > MAX_DIMENSION {
                return self.drop_frame("非法分辨率");
            }

            let y_stride = raw.linesize[0].max(0) as usize;
            let uv_stride = raw.linesize[1].max(0) as usize;
            if raw.data[0].is_null() || raw.data[1].is_null() || raw.data[2].is_null() {
                return self.drop_frame("YUV指针为空");
            }
            if y_stride < w as usize || uv_stride < (w as usize).div_ceil(2) {
                return self.drop_frame("步长异常");
            }

            let chroma_rows = (h as usize).div_ceil(2);
            let planes = Yuv420pPlanes {
                y: std::slice::from_raw_parts(raw.data[0], y_stride * h as usize),
                u: std::slice::from_raw_parts(raw.data[1], uv_stride * chroma_rows),
                v: std::slice::from_raw_parts(raw.data[2], uv_stride * chroma_rows),
                y_stride,
                uv_stride,
            };
            yuv420p_to_rgba(&planes, w, h)
        };

        match self.tx.try_send(rgba) {
            // 主循环处理不过来时丢帧, 保证显示的是最新画面
            Ok(()) | Err(TrySendError::Full(_)) => Ok(Some(frame)),
            Err(TrySendError::Disconnected(_)) => Err("frame receiver dropped".to_string()),
        }
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        debug!(
            "采集统计: 总帧{} 丢弃{}",
            self.total_frames, self.dropped_frames
        );
        info!("✅ 采集线程退出");
    }
}

/// YUV420P 三个平面 (带行步长)
pub struct Yuv420pPlanes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub y_stride: usize,
    pub uv_stride: usize,
}

/// BT.601 定点转换, 系数放大 128 倍
pub fn yuv420p_to_rgba(planes: &Yuv420pPlanes, width: u32, height: u32) -> RgbaImage {
    let (w, h) = (width as usize, height as usize);
    let mut buffer = vec![255u8; w * h * 4];

    for (row, out_row) in buffer.chunks_exact_mut(w * 4).enumerate().take(h) {
        let y_row = &planes.y[row * planes.y_stride..];
        let uv_offset = (row >> 1) * planes.uv_stride;
        let u_row = &planes.u[uv_offset..];
        let v_row = &planes.v[uv_offset..];

        for (x, px) in out_row.chunks_exact_mut(4).enumerate() {
            let y_val = y_row[x] as i32;
            let u_val = u_row[x >> 1] as i32 - 128;
            let v_val = v_row[x >> 1] as i32 - 128;

            px[0] = (y_val + ((v_val * 179) >> 7)).clamp(0, 255) as u8;
            px[1] = (y_val - ((u_val * 44) >> 7) - ((v_val * 91) >> 7)).clamp(0, 255) as u8;
            px[2] = (y_val + ((u_val * 227) >> 7)).clamp(0, 255) as u8;
        }
    }

    // 尺寸与缓冲区长度一致, 构造不会失败
    RgbaImage::from_raw(width, height, buffer).unwrap_or_else(|| RgbaImage::new(width, height))
}
