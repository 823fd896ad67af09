//! 类别颜色表 (Color Map)
//!
//! 启动时随机生成一次, 整个进程生命周期内不变.

use std::collections::HashMap;

use rand::Rng;

use super::classes::color_labels;

pub type Rgb = (u8, u8, u8);

/// 图片模式: 未知类别默认蓝色
pub const IMAGE_DEFAULT_COLOR: Rgb = (0, 0, 255);
/// 视频模式: 未知类别默认绿色
pub const VIDEO_DEFAULT_COLOR: Rgb = (0, 255, 0);

#[derive(Clone, Debug)]
pub struct ColorMap {
    colors: HashMap<String, Rgb>,
}

impl ColorMap {
    /// 为白名单全部类别 + 用户标签各生成一个随机颜色
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let colors = color_labels()
            .into_iter()
            .map(|label| (label.to_string(), (rng.gen(), rng.gen(), rng.gen())))
            .collect();
        Self { colors }
    }

    pub fn get(&self, label: &str) -> Option<Rgb> {
        self.colors.get(label).copied()
    }

    /// 查询颜色, 未登记的类别使用 `default`
    pub fn color_or(&self, label: &str, default: Rgb) -> Rgb {
        self.get(label).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
