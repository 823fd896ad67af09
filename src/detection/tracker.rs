//! 多目标跟踪公共组件
//! Common components for multi-object tracking

use super::types::{BBox, TrackInput};

// ========== 公共数据结构 ==========

/// 轨迹状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    /// 新建, 尚未连续命中 n_init 次
    Tentative,
    /// 已确认, 可以显示
    Confirmed,
}

/// 跟踪对象 (统一的跟踪结果)
#[derive(Clone, Debug)]
pub struct Track {
    /// 唯一跟踪ID (reset 后从1重新开始)
    pub id: u32,

    /// 当前边界框 (滤波平滑后)
    pub bbox: BBox,

    /// 最近一次匹配到的检测类别
    pub label: String,

    /// 最近一次匹配到的检测置信度
    pub confidence: f32,

    pub(crate) state: TrackState,

    /// 连续命中次数
    pub(crate) hits: u32,

    /// 距上次匹配的帧数
    pub(crate) time_since_update: u32,

    pub(crate) kalman: KalmanBoxFilter,
}

impl Track {
    pub(crate) fn new(id: u32, input: &TrackInput, q: f32, r: f32, n_init: u32) -> Self {
        let kalman = KalmanBoxFilter::new(input.bbox().to_ltrb_f32(), q, r);
        let state = if n_init <= 1 {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        };
        Self {
            id,
            bbox: BBox::from_ltrb_f32(kalman.state_ltrb()),
            label: input.label.clone(),
            confidence: input.confidence,
            state,
            hits: 1,
            time_since_update: 0,
            kalman,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    pub(crate) fn predict(&mut self) {
        self.kalman.predict();
        self.bbox = BBox::from_ltrb_f32(self.kalman.state_ltrb());
    }

    pub(crate) fn update(&mut self, input: &TrackInput, n_init: u32) {
        self.kalman.update(input.bbox().to_ltrb_f32());
        self.bbox = BBox::from_ltrb_f32(self.kalman.state_ltrb());
        self.label = input.label.clone();
        self.confidence = input.confidence;
        self.hits += 1;
        self.time_since_update = 0;
        if self.state == TrackState::Tentative && self.hits >= n_init {
            self.state = TrackState::Confirmed;
        }
    }

    /// 标记丢失, 返回是否应删除
    pub(crate) fn mark_missed(&mut self, max_age: u32) -> bool {
        self.time_since_update += 1;
        match self.state {
            TrackState::Tentative => true,
            TrackState::Confirmed => self.time_since_update > max_age,
        }
    }
}

// ========== 卡尔曼滤波器 ==========

/// 简化卡尔曼滤波器 (用于单个边界框的位置和尺寸平滑)
/// 状态向量: [x_center, y_center, width, height, vx, vy, vw, vh]
#[derive(Clone, Debug)]
pub struct KalmanBoxFilter {
    state: [f32; 8],

    /// 估计误差协方差 (简化为对角阵)
    p: [f32; 8],

    /// 过程噪声
    q: f32,

    /// 观测噪声
    r: f32,
}

impl KalmanBoxFilter {
    /// - `ltrb`: 初始边界框
    /// - `q`: 过程噪声 (0.1-1.0, 越小越平滑)
    /// - `r`: 观测噪声 (越大越平滑)
    pub fn new(ltrb: [f32; 4], q: f32, r: f32) -> Self {
        let [l, t, rr, b] = ltrb;
        Self {
            state: [(l + rr) / 2.0, (t + b) / 2.0, rr - l, b - t, 0.0, 0.0, 0.0, 0.0],
            p: [10.0; 8],
            q,
            r,
        }
    }

    /// 预测下一帧状态 (匀速运动模型)
    pub fn predict(&mut self) {
        self.state[0] += self.state[4];
        self.state[1] += self.state[5];
        self.state[2] += self.state[6];
        self.state[3] += self.state[7];

        for p in self.p.iter_mut() {
            *p += self.q;
        }
    }

    pub fn update(&mut self, ltrb: [f32; 4]) {
        let [l, t, r, b] = ltrb;
        let y = [
            (l + r) / 2.0 - self.state[0],
            (t + b) / 2.0 - self.state[1],
            (r - l) - self.state[2],
            (b - t) - self.state[3],
        ];

        // 卡尔曼增益: 速度分量增益更低
        let mut k = [0.0f32; 8];
        for (i, ki) in k.iter_mut().enumerate() {
            let r = if i < 4 { self.r } else { self.r * 5.0 };
            *ki = self.p[i] / (self.p[i] + r);
        }

        for i in 0..4 {
            self.state[i] += k[i] * y[i];
            self.state[i + 4] += k[i + 4] * y[i];
        }

        for (p, ki) in self.p.iter_mut().zip(k) {
            *p *= 1.0 - ki;
        }
    }

    /// 当前状态的 [l, t, r, b]
    pub fn state_ltrb(&self) -> [f32; 4] {
        let cx = self.state[0];
        let cy = self.state[1];
        let w = self.state[2].max(1.0);
        let h = self.state[3].max(1.0);
        [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.state[4], self.state[5])
    }
}

// ========== 跟踪器统一接口 ==========

/// 多目标跟踪器 Trait
pub trait Tracker {
    /// 输入当前帧检测, 返回全部活跃轨迹 (含未确认的)
    fn update(&mut self, detections: &[TrackInput]) -> &[Track];

    /// 重置跟踪器 (清除所有轨迹, ID 从头分配)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

// ========== 工具函数 ==========

/// 计算两个 [l, t, r, b] 框的IOU
pub fn compute_iou(a: [f32; 4], b: [f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }

    let intersection = (x2 - x1) * (y2 - y1);
    let area1 = (a[2] - a[0]) * (a[3] - a[1]);
    let area2 = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area1 + area2 - intersection;

    if union <= 0.0 {
        return 0.0;
    }

    intersection / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_basics() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((compute_iou(a, a) - 1.0).abs() < 1e-6);
        assert_eq!(compute_iou(a, [20.0, 20.0, 30.0, 30.0]), 0.0);
        let half = compute_iou(a, [5.0, 0.0, 15.0, 10.0]);
        assert!((half - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn kalman_converges_on_static_box() {
        let b = [100.0, 100.0, 200.0, 180.0];
        let mut kf = KalmanBoxFilter::new(b, 0.1, 0.5);
        for _ in 0..10 {
            kf.predict();
            kf.update(b);
        }
        let s = kf.state_ltrb();
        for i in 0..4 {
            assert!((s[i] - b[i]).abs() < 1.0);
        }
    }

    #[test]
    fn kalman_follows_motion() {
        let mut kf = KalmanBoxFilter::new([0.0, 0.0, 10.0, 10.0], 0.1, 0.5);
        for step in 1..=20 {
            let dx = step as f32 * 2.0;
            kf.predict();
            kf.update([dx, 0.0, dx + 10.0, 10.0]);
        }
        let (vx, vy) = kf.velocity();
        assert!(vx > 1.0);
        assert!(vy.abs() < 0.5);
    }
}
