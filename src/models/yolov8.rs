// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 检测模型
// 包含: 模型加载、预处理、推理、后处理

use anyhow::{bail, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array, ArrayView2, Axis, IxDyn};
use tracing::info;

use super::{Detector, Model};
use crate::detection::{BBox, Detection};
use crate::{non_max_suppression, Args, Bbox, OrtBackend, OrtConfig, OrtEP};

const CXYWH_OFFSET: usize = 4;

/// YOLOv8 检测模型
pub struct YOLOv8 {
    engine: OrtBackend,
    height: u32,
    width: u32,
    conf: f32,
    iou: f32,
    names: Vec<String>,
}

impl YOLOv8 {
    /// 从命令行参数创建 YOLOv8 模型, `conf` 为检测置信度下限
    pub fn new(args: &Args, conf: f32) -> Result<Self> {
        let ep = if args.cuda { OrtEP::CUDA(0) } else { OrtEP::CPU };
        let engine = OrtBackend::build(OrtConfig {
            f: args.model.clone(),
            ep,
            image_size: (args.imgsz, args.imgsz),
        })?;

        let names = engine.names().to_vec();
        Ok(Self {
            height: engine.height(),
            width: engine.width(),
            engine,
            conf,
            iou: args.iou,
            names,
        })
    }

    fn scale_wh(&self, w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
        let r = (w1 / w0).min(h1 / h0);
        (r, (w0 * r).round(), (h0 * r).round())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Model for YOLOv8 {
    /// 等比缩放贴到左上角, 其余区域填灰
    fn preprocess(&mut self, image: &DynamicImage) -> Result<Array<f32, IxDyn>> {
        let (w0, h0) = image.dimensions();
        if w0 == 0 || h0 == 0 {
            bail!("空图像: {}x{}", w0, h0);
        }
        let (_, w_new, h_new) =
            self.scale_wh(w0 as f32, h0 as f32, self.width as f32, self.height as f32);
        let img = image.resize_exact(
            w_new as u32,
            h_new as u32,
            image::imageops::FilterType::Triangle,
        );

        let mut ys = Array::from_elem(
            (1, 3, self.height as usize, self.width as usize),
            144.0f32 / 255.0,
        )
        .into_dyn();
        for (x, y, rgb) in img.pixels() {
            let x = x as usize;
            let y = y as usize;
            let [r, g, b, _] = rgb.0;
            ys[[0, 0, y, x]] = (r as f32) / 255.0;
            ys[[0, 1, y, x]] = (g as f32) / 255.0;
            ys[[0, 2, y, x]] = (b as f32) / 255.0;
        }

        Ok(ys)
    }

    fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Array<f32, IxDyn>> {
        self.engine.run(xs)
    }

    fn postprocess(&self, ys: Array<f32, IxDyn>, image: &DynamicImage) -> Result<Vec<Detection>> {
        if ys.ndim() != 3 {
            bail!("模型输出维度异常: {:?}", ys.shape());
        }
        let (w0, h0) = image.dimensions();
        let ratio = (self.width as f32 / w0 as f32).min(self.height as f32 / h0 as f32);

        // 输出形状 [1, 4 + nc, anchors]
        let preds = ys.index_axis(Axis(0), 0);
        let preds = preds.into_dimensionality::<ndarray::Ix2>()?;
        let mut boxes = decode_predictions(preds, ratio, (w0 as f32, h0 as f32), self.conf);
        non_max_suppression(&mut boxes, self.iou);

        Ok(boxes
            .iter()
            .map(|b| to_detection(b, &self.names, (w0 as f32, h0 as f32)))
            .collect())
    }

    fn summary(&self) {
        info!(
            "\nSummary:\n\
            > EP: {:?}\n\
            > Height: {}, Width: {}\n\
            > nc: {}, conf: {}, iou: {}",
            self.engine.ep(),
            self.height,
            self.width,
            self.names.len(),
            self.conf,
            self.iou,
        );
    }
}

impl Detector for YOLOv8 {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>> {
        self.forward(image)
    }
}

/// 解码 [4 + nc, anchors] 原始预测 → 原图坐标下的框 (未做NMS)
pub fn decode_predictions(
    preds: ArrayView2<f32>,
    ratio: f32,
    (width_original, height_original): (f32, f32),
    conf: f32,
) -> Vec<Bbox> {
    let mut boxes = Vec::new();
    for pred in preds.axis_iter(Axis(1)) {
        if pred.len() <= CXYWH_OFFSET {
            break;
        }
        let bbox = pred.slice(s![0..CXYWH_OFFSET]);
        let clss = pred.slice(s![CXYWH_OFFSET..]);

        let Some((id, &confidence)) = clss
            .into_iter()
            .enumerate()
            .reduce(|max, x| if x.1 > max.1 { x } else { max })
        else {
            continue;
        };

        if confidence < conf {
            continue;
        }

        let cx = bbox[0] / ratio;
        let cy = bbox[1] / ratio;
        let w = bbox[2] / ratio;
        let h = bbox[3] / ratio;
        let x = (cx - w / 2.).max(0.0).min(width_original);
        let y = (cy - h / 2.).max(0.0).min(height_original);
        let w = (cx + w / 2.).min(width_original) - x;
        let h = (cy + h / 2.).min(height_original) - y;
        boxes.push(Bbox::new(x, y, w.max(0.0), h.max(0.0), id, confidence));
    }
    boxes
}

/// 浮点框 → 整数像素坐标检测 (截断取整)
fn to_detection(b: &Bbox, names: &[String], (w0, h0): (f32, f32)) -> Detection {
    let label = names
        .get(b.id())
        .cloned()
        .unwrap_or_else(|| format!("class{}", b.id()));
    Detection::new(
        BBox::new(
            b.xmin() as i32,
            b.ymin() as i32,
            b.xmax().min(w0) as i32,
            b.ymax().min(h0) as i32,
        ),
        label,
        b.confidence(),
    )
}
