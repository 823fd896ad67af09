//! 类别过滤 + 追踪输入适配

use super::classes::{is_allowed, USER_LABEL};
use super::types::{Detection, TrackInput};
use super::user::identify_user;

/// 用户识别 + 类别过滤
///
/// 先在原始检测上识别用户, 再过滤; 用户检测改名为 "User: Human".
/// 过滤按原始类别名判断, 所以用户检测一定会保留.
pub fn select_detections(detections: Vec<Detection>) -> Vec<Detection> {
    let user = identify_user(&detections);

    detections
        .into_iter()
        .enumerate()
        .filter(|(_, d)| is_allowed(&d.label))
        .map(|(idx, mut d)| {
            if Some(idx) == user {
                d.label = USER_LABEL.to_string();
            }
            d
        })
        .collect()
}

/// 检测 → 追踪器输入 ([l, t, w, h], conf, label)
pub fn to_track_inputs(detections: &[Detection]) -> Vec<TrackInput> {
    detections
        .iter()
        .map(|d| TrackInput {
            ltwh: d.bbox.to_ltwh(),
            confidence: d.confidence,
            label: d.label.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::BBox;

    fn det(label: &str, x1: i32, y1: i32, x2: i32, y2: i32) -> Detection {
        Detection::new(BBox::new(x1, y1, x2, y2), label, 0.8)
    }

    #[test]
    fn drops_unlisted_classes() {
        let kept = select_detections(vec![
            det("car", 0, 0, 5, 5),
            det("dog", 0, 0, 5, 5),
            det("chair", 0, 0, 5, 5),
            det("bird", 0, 0, 5, 5),
        ]);
        let labels: Vec<_> = kept.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["dog", "bird"]);
    }

    #[test]
    fn relabels_only_the_largest_person() {
        let out = select_detections(vec![
            det("person", 0, 0, 20, 25),      // 500
            det("person", 100, 100, 130, 140), // 1200
            det("dog", 200, 200, 260, 240),
            det("car", 0, 0, 500, 500),
        ]);
        let labels: Vec<_> = out.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["person", USER_LABEL, "dog"]);
        assert_eq!(out[1].bbox, BBox::new(100, 100, 130, 140));
    }

    #[test]
    fn identical_person_boxes_relabel_once() {
        let out = select_detections(vec![det("person", 0, 0, 10, 10), det("person", 0, 0, 10, 10)]);
        let users = out.iter().filter(|d| d.label == USER_LABEL).count();
        assert_eq!(users, 1);
        assert_eq!(out[0].label, USER_LABEL);
    }

    #[test]
    fn no_humans_keeps_original_labels() {
        let out = select_detections(vec![det("cat", 0, 0, 10, 10), det("bird", 5, 5, 8, 8)]);
        let labels: Vec<_> = out.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, ["cat", "bird"]);
    }

    #[test]
    fn adapts_to_ltwh() {
        let inputs = to_track_inputs(&[det(USER_LABEL, 10, 20, 40, 80)]);
        assert_eq!(inputs[0].ltwh, [10, 20, 30, 60]);
        assert_eq!(inputs[0].label, USER_LABEL);
        assert_eq!(inputs[0].confidence, 0.8);
    }
}
