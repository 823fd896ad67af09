//! ONNX Runtime 推理后端
//!
//! 负责: 会话构建 (CPU / CUDA), 类别名读取, 张量输入输出

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use ndarray::{Array, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use regex::Regex;
use tracing::{info, warn};

/// 执行设备
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    /// 模型文件
    pub f: PathBuf,
    pub ep: OrtEP,
    /// (height, width)
    pub image_size: (u32, u32),
}

pub struct OrtBackend {
    session: Session,
    input_name: String,
    ep: OrtEP,
    height: u32,
    width: u32,
    names: Vec<String>,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        if !config.f.exists() {
            bail!("模型文件不存在: {}", config.f.display());
        }

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?;
        if let OrtEP::CUDA(device_id) = config.ep {
            builder = builder.with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .build()])?;
        }
        let session = builder
            .commit_from_file(&config.f)
            .with_context(|| format!("模型加载失败: {}", config.f.display()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        // 类别名: 优先读取模型元数据, 否则使用 COCO 80 类
        let names = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten())
            .map(|raw| parse_names(&raw))
            .filter(|names| !names.is_empty())
            .unwrap_or_else(|| {
                warn!("⚠️ 模型未携带类别名, 使用 COCO 默认类别");
                coco_names()
            });

        let (height, width) = config.image_size;
        info!(
            "✅ 模型加载成功: {} ({} 类, {}x{}, {:?})",
            config.f.display(),
            names.len(),
            width,
            height,
            config.ep
        );

        Ok(Self {
            session,
            input_name,
            ep: config.ep,
            height,
            width,
            names,
        })
    }

    /// 前向推理: NCHW 输入 → 第一个输出张量
    pub fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        let shape = xs.shape().to_vec();
        let (data, _) = xs.into_raw_vec_and_offset();
        let input = ort::value::Value::from_array((shape.as_slice(), data.into_boxed_slice()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;
        let (out_shape, out_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = out_shape.iter().map(|&d| d.max(0) as usize).collect();

        Ok(Array::from_shape_vec(IxDyn(&dims), out_data.to_vec())?)
    }

    pub fn ep(&self) -> OrtEP {
        self.ep
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// 解析 ultralytics 导出的元数据: `{0: 'person', 1: 'bicycle', ...}`
pub fn parse_names(raw: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r#"(\d+)\s*:\s*['"]([^'"]*)['"]"#) else {
        return Vec::new();
    };
    let mut pairs: Vec<(usize, String)> = re
        .captures_iter(raw)
        .filter_map(|cap| {
            let id = cap[1].parse().ok()?;
            Some((id, cap[2].to_string()))
        })
        .collect();
    pairs.sort_by_key(|(id, _)| *id);

    // 下标即类别ID, 缺失的ID填 "unknown"
    let len = pairs.last().map(|(id, _)| id + 1).unwrap_or(0);
    let mut names = vec!["unknown".to_string(); len];
    for (id, name) in pairs {
        names[id] = name;
    }
    names
}

const COCO_NAMES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

pub fn coco_names() -> Vec<String> {
    COCO_NAMES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ultralytics_names_metadata() {
        let raw = "{0: 'person', 2: 'car', 1: 'bicycle'}";
        assert_eq!(parse_names(raw), ["person", "bicycle", "car"]);
    }

    #[test]
    fn sparse_ids_keep_their_index() {
        let names = parse_names("{0: 'person', 3: \"dog\"}");
        assert_eq!(names, ["person", "unknown", "unknown", "dog"]);
    }

    #[test]
    fn garbage_metadata_yields_nothing() {
        assert!(parse_names("not a dict").is_empty());
    }

    #[test]
    fn coco_fallback_has_animals() {
        let names = coco_names();
        assert_eq!(names.len(), 80);
        assert_eq!(names[0], "person");
        assert_eq!(names[16], "dog");
    }
}
