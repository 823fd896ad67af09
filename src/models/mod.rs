//! 模型统一接口与实现
//!
//! ## Model Trait
//! 统一的模型接口，定义标准流程: preprocess → run → postprocess
//!
//! ## Detector Trait
//! 流程层只关心 "帧 → 检测集合", 测试中可用脚本化的假检测器替换
//!
//! ## 使用示例
//! ```no_run
//! use animal_tracker::models::{Detector, YOLOv8};
//! # fn demo(args: &animal_tracker::Args, img: &image::DynamicImage) -> anyhow::Result<()> {
//! let mut model = YOLOv8::new(args, args.conf)?;
//! let detections = model.detect(img)?;
//! # Ok(()) }
//! ```
use anyhow::Result;
use image::DynamicImage;
use ndarray::{Array, IxDyn};

use crate::detection::Detection;

/// 统一的深度学习模型接口
///
/// ```text
/// 原始图片 → preprocess → ndarray张量
///          ↓
///     推理引擎 run
///          ↓
///     原始输出 → postprocess → 检测结果
/// ```
pub trait Model {
    /// 预处理: 图片 → NCHW 张量
    fn preprocess(&mut self, image: &DynamicImage) -> Result<Array<f32, IxDyn>>;

    /// 推理: 执行模型前向传播, 返回原始输出(未解码)
    fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>>;

    /// 后处理: 原始输出 → 原图坐标下的检测结果
    fn postprocess(&self, ys: Array<f32, IxDyn>, image: &DynamicImage) -> Result<Vec<Detection>>;

    /// 完整的推理流程: preprocess → run → postprocess
    fn forward(&mut self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let xs = self.preprocess(image)?;
        let ys = self.run(xs)?;
        self.postprocess(ys, image)
    }

    /// 打印模型信息
    fn summary(&self);
}

/// 检测器: 帧 → (框, 类别, 置信度) 集合
pub trait Detector {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

pub mod yolov8; // YOLOv8 完整模型 + 实现 Model trait

pub use yolov8::YOLOv8;
