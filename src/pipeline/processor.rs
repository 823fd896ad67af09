//! 每帧处理: 检测 → 用户识别 → 过滤 → (追踪) → 标注

use std::time::Instant;

use ab_glyph::FontVec;
use anyhow::Result;
use image::{DynamicImage, RgbaImage};
use tracing::info;

use crate::config::TrackerConfig;
use crate::detection::{
    select_detections, to_track_inputs, ByteTracker, ColorMap, Tracker, IMAGE_DEFAULT_COLOR,
    VIDEO_DEFAULT_COLOR,
};
use crate::models::Detector;
use crate::renderer::{draw_annotations, Annotation};

/// 吞吐统计打印间隔 (帧)
const STATS_INTERVAL: u64 = 60;

/// 帧处理器: 持有检测器、追踪器、颜色表和字体, 由控制循环独占
pub struct FrameProcessor<D: Detector> {
    detector: D,
    tracker: ByteTracker,
    colors: ColorMap,
    font: Option<FontVec>,
    last_annotations: Vec<Annotation>,

    // 统计
    frame_count: u64,
    window_start: Instant,
    window_ms: f64,
}

impl<D: Detector> FrameProcessor<D> {
    pub fn new(detector: D, tracker: TrackerConfig, colors: ColorMap, font: Option<FontVec>) -> Self {
        Self {
            detector,
            tracker: ByteTracker::new(tracker),
            colors,
            font,
            last_annotations: Vec::new(),
            frame_count: 0,
            window_start: Instant::now(),
            window_ms: 0.0,
        }
    }

    /// 图片模式: 标注全部保留的检测框, 标签为类别名
    pub fn annotate_image(&mut self, image: DynamicImage) -> Result<RgbaImage> {
        let detections = select_detections(self.detector.detect(&image)?);
        info!("🔍 检测到 {} 个目标", detections.len());

        self.last_annotations = detections
            .into_iter()
            .map(|det| {
                let color = self.colors.color_or(&det.label, IMAGE_DEFAULT_COLOR);
                Annotation::new(det.bbox, det.label, color)
            })
            .collect();

        let mut frame = image.into_rgba8();
        draw_annotations(&mut frame, &self.last_annotations, self.font.as_ref());
        Ok(frame)
    }

    /// 视频模式: 检测结果送入追踪器, 只标注已确认的轨迹
    pub fn process_frame(&mut self, frame: RgbaImage) -> Result<RgbaImage> {
        let started = Instant::now();
        let image = DynamicImage::ImageRgba8(frame);

        let detections = select_detections(self.detector.detect(&image)?);
        let inputs = to_track_inputs(&detections);
        let tracks = self.tracker.update(&inputs);

        let colors = &self.colors;
        self.last_annotations = tracks
            .iter()
            .filter(|track| track.is_confirmed())
            .map(|track| {
                Annotation::new(
                    track.bbox,
                    format!("{} ID {}", track.label, track.id),
                    colors.color_or(&track.label, VIDEO_DEFAULT_COLOR),
                )
            })
            .collect();

        let mut frame = image.into_rgba8();
        draw_annotations(&mut frame, &self.last_annotations, self.font.as_ref());

        self.record(started);
        Ok(frame)
    }

    /// 清空全部轨迹, ID 从 1 重新开始
    pub fn reset_tracker(&mut self) {
        self.tracker.reset();
    }

    /// 上一帧绘制的标注
    pub fn last_annotations(&self) -> &[Annotation] {
        &self.last_annotations
    }

    pub fn tracker(&self) -> &ByteTracker {
        &self.tracker
    }

    fn record(&mut self, started: Instant) {
        self.frame_count += 1;
        self.window_ms += started.elapsed().as_secs_f64() * 1000.0;

        if self.frame_count % STATS_INTERVAL == 0 {
            let elapsed = self.window_start.elapsed().as_secs_f64();
            let fps = if elapsed > 0.0 {
                STATS_INTERVAL as f64 / elapsed
            } else {
                0.0
            };
            info!(
                "📊 帧 #{} | 处理 {:.1}ms | {:.1} fps | 目标 {} | {}",
                self.frame_count,
                self.window_ms / STATS_INTERVAL as f64,
                fps,
                self.last_annotations.len(),
                self.tracker.get_stats()
            );
            self.window_start = Instant::now();
            self.window_ms = 0.0;
        }
    }
}
