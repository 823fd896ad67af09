/// 检测与追踪数据结构定义
/// Data structures for detection and tracking

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box), 整数像素坐标 x1,y1 左上 / x2,y2 右下
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 由 (left, top, width, height) 构造
    pub fn from_ltwh(l: i32, t: i32, w: i32, h: i32) -> Self {
        Self {
            x1: l,
            y1: t,
            x2: l + w,
            y2: t + h,
        }
    }

    pub fn width(&self) -> i32 {
        (self.x2 - self.x1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y2 - self.y1).max(0)
    }

    /// 面积 (i64 防止 4K 画面下溢出)
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// 转换为追踪器输入格式 [left, top, width, height]
    pub fn to_ltwh(&self) -> [i32; 4] {
        [self.x1, self.y1, self.width(), self.height()]
    }

    /// 浮点 ltrb, 供卡尔曼滤波使用
    pub fn to_ltrb_f32(&self) -> [f32; 4] {
        [
            self.x1 as f32,
            self.y1 as f32,
            self.x2 as f32,
            self.y2 as f32,
        ]
    }

    pub fn from_ltrb_f32(ltrb: [f32; 4]) -> Self {
        Self {
            x1: ltrb[0].round() as i32,
            y1: ltrb[1].round() as i32,
            x2: ltrb[2].round() as i32,
            y2: ltrb[3].round() as i32,
        }
    }
}

/// 单帧检测结果: 框 + 类别名 + 置信度
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub label: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BBox, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            confidence,
        }
    }
}

/// 追踪器输入 (检测 → 追踪适配后的格式)
#[derive(Clone, Debug, PartialEq)]
pub struct TrackInput {
    /// [left, top, width, height]
    pub ltwh: [i32; 4],
    pub confidence: f32,
    pub label: String,
}

impl TrackInput {
    pub fn bbox(&self) -> BBox {
        let [l, t, w, h] = self.ltwh;
        BBox::from_ltwh(l, t, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_is_width_times_height() {
        let b = BBox::new(10, 20, 30, 45);
        assert_eq!(b.width(), 20);
        assert_eq!(b.height(), 25);
        assert_eq!(b.area(), 500);
    }

    #[test]
    fn inverted_box_has_zero_area() {
        let b = BBox::new(30, 30, 10, 10);
        assert_eq!(b.area(), 0);
    }

    #[test]
    fn ltwh_conversion() {
        let b = BBox::new(5, 6, 15, 26);
        assert_eq!(b.to_ltwh(), [5, 6, 10, 20]);
        assert_eq!(BBox::from_ltwh(5, 6, 10, 20), b);
    }
}
