//! 运行参数 (命令行) + 跟踪器配置 (JSON)

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 动物检测与追踪
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "动物检测与追踪 - 图片 / 摄像头", long_about = None)]
pub struct Args {
    /// 图片路径; 省略则进入摄像头实时模式
    pub image: Option<PathBuf>,

    /// YOLOv8 ONNX 检测模型
    #[arg(short, long, default_value = "models/yolov8s.onnx")]
    pub model: PathBuf,

    /// 检测置信度阈值
    #[arg(long, default_value_t = 0.25)]
    pub conf: f32,

    /// NMS IOU阈值
    #[arg(long, default_value_t = 0.7)]
    pub iou: f32,

    /// 模型输入尺寸
    #[arg(long, default_value_t = 640)]
    pub imgsz: u32,

    /// 摄像头设备索引
    #[arg(short, long, default_value_t = 0)]
    pub camera: usize,

    /// 标签字体 (TTF/OTF); 找不到时只画框
    #[arg(long, default_value = "assets/font/DejaVuSans.ttf")]
    pub font: PathBuf,

    /// 跟踪器参数 JSON 文件
    #[arg(long)]
    pub tracker_config: Option<PathBuf>,

    /// 使用 CUDA 推理
    #[arg(long)]
    pub cuda: bool,

    /// 颜色表随机种子
    #[arg(long)]
    pub seed: Option<u64>,

    /// 列出摄像头设备后退出
    #[arg(long)]
    pub list_devices: bool,
}

impl Args {
    pub fn is_image_mode(&self) -> bool {
        self.image.is_some()
    }

    /// 检测器实际使用的置信度下限
    ///
    /// 摄像头模式下放宽到追踪器的低分阈值, 低分框才能参与第二轮救援匹配;
    /// 低于高分阈值的框不会新建轨迹.
    pub fn detector_conf(&self, tracker: &TrackerConfig) -> f32 {
        if self.is_image_mode() {
            self.conf
        } else {
            self.conf.min(tracker.low_score_threshold)
        }
    }
}

/// 跟踪器参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// 已确认轨迹最大允许丢失帧数
    pub max_age: u32,
    /// 确认所需的连续命中次数
    pub n_init: u32,

    pub high_score_threshold: f32,
    /// 低分阈值 (救援用)
    pub low_score_threshold: f32,
    pub high_iou_threshold: f32,
    pub low_iou_threshold: f32,

    /// 卡尔曼过程噪声 q
    pub kalman_process_noise: f32,
    /// 卡尔曼观测噪声 r
    pub kalman_obs_noise: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            n_init: 3,
            high_score_threshold: 0.25,
            low_score_threshold: 0.1,
            high_iou_threshold: 0.3,
            low_iou_threshold: 0.3,
            kalman_process_noise: 0.1,
            kalman_obs_noise: 0.5,
        }
    }
}

impl TrackerConfig {
    /// 从JSON文件加载配置, 失败时使用默认值
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                warn!("⚠️ 跟踪器配置解析失败: {}, 使用默认值", e);
                Self::default()
            }),
            Err(e) => {
                warn!("⚠️ 无法读取跟踪器配置 {}: {}, 使用默认值", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        info!("✅ 跟踪器配置已加载");
        Ok(config)
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        info!(
            "🎛️ 跟踪器: max_age={} n_init={} 高/低分={:.2}/{:.2} IOU={:.2}/{:.2}",
            self.max_age,
            self.n_init,
            self.high_score_threshold,
            self.low_score_threshold,
            self.high_iou_threshold,
            self.low_iou_threshold
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_cli() {
        let args = Args::parse_from(["animal-tracker"]);
        assert!(!args.is_image_mode());
        assert_eq!(args.model, PathBuf::from("models/yolov8s.onnx"));
        assert_eq!(args.camera, 0);
        assert!((args.conf - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn positional_image_selects_image_mode() {
        let args = Args::parse_from(["animal-tracker", "zoo.jpg", "--seed", "3"]);
        assert!(args.is_image_mode());
        assert_eq!(args.image, Some(PathBuf::from("zoo.jpg")));
        assert_eq!(args.seed, Some(3));
    }

    #[test]
    fn video_mode_lowers_detector_conf_to_rescue_threshold() {
        let tracker = TrackerConfig::default();
        let video = Args::parse_from(["animal-tracker"]);
        assert!((video.detector_conf(&tracker) - tracker.low_score_threshold).abs() < f32::EPSILON);
        assert!(video.detector_conf(&tracker) < tracker.high_score_threshold);

        let image = Args::parse_from(["animal-tracker", "zoo.jpg"]);
        assert!((image.detector_conf(&tracker) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = TrackerConfig::from_json(r#"{ "max_age": 10 }"#).unwrap();
        assert_eq!(cfg.max_age, 10);
        assert_eq!(cfg.n_init, TrackerConfig::default().n_init);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let cfg = TrackerConfig::load(Path::new("/nonexistent/tracker.json"));
        assert_eq!(cfg, TrackerConfig::default());
    }
}
