//! 类别白名单 (Class allow-list)
//!
//! 支持的动物类别 + 人类别名. COCO 模型把人标为 "person".

use phf::phf_set;

/// 画面中最大的人形框的显示标签
pub const USER_LABEL: &str = "User: Human";

/// 支持的动物类别 (含 "human")
pub static ANIMAL_CLASSES: phf::Set<&'static str> = phf_set! {
    "bird", "cat", "dog", "horse", "sheep", "cow",
    "elephant", "bear", "zebra", "giraffe", "lion",
    "tiger", "monkey", "kangaroo", "panda", "rabbit",
    "human", "squirrel", "deer", "fox", "wolf", "crocodile",
};

/// 人类别名
pub static HUMAN_ALIASES: phf::Set<&'static str> = phf_set! {
    "person", "human",
};

pub fn is_human_alias(label: &str) -> bool {
    HUMAN_ALIASES.contains(label)
}

/// 是否在白名单内 (动物 或 人类别名)
pub fn is_allowed(label: &str) -> bool {
    ANIMAL_CLASSES.contains(label) || HUMAN_ALIASES.contains(label)
}

/// 需要分配颜色的全部标签 (白名单 + 用户标签), 顺序固定
pub fn color_labels() -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = ANIMAL_CLASSES
        .iter()
        .chain(HUMAN_ALIASES.iter())
        .copied()
        .collect();
    labels.sort_unstable();
    labels.dedup();
    labels.push(USER_LABEL);
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list() {
        assert!(is_allowed("dog"));
        assert!(is_allowed("person"));
        assert!(is_allowed("human"));
        assert!(!is_allowed("car"));
        assert!(!is_allowed(USER_LABEL));
    }

    #[test]
    fn color_labels_cover_allow_list_once() {
        let labels = color_labels();
        assert_eq!(labels.len(), 24); // 22 动物 + person + 用户标签
        assert!(labels.contains(&"person"));
        assert_eq!(labels.last(), Some(&USER_LABEL));
        assert_eq!(labels.iter().filter(|l| **l == "human").count(), 1);
    }
}
