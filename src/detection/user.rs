//! 用户识别 (User Identification)
//!
//! 在所有人形检测中选出面积最大的一个, 作为画面的主要用户.

use super::classes::is_human_alias;
use super::types::Detection;

/// 返回面积最大的人形检测的下标
///
/// 只有面积严格大于当前最大值(初始为0)才会替换, 因此:
/// - 面积为0的框永远不会被选中
/// - 面积相同时先出现的优先
pub fn identify_user(detections: &[Detection]) -> Option<usize> {
    let mut max_area = 0i64;
    let mut user = None;

    for (idx, det) in detections.iter().enumerate() {
        if !is_human_alias(&det.label) {
            continue;
        }
        let area = det.bbox.area();
        if area > max_area {
            max_area = area;
            user = Some(idx);
        }
    }

    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::BBox;

    fn det(label: &str, x1: i32, y1: i32, x2: i32, y2: i32) -> Detection {
        Detection::new(BBox::new(x1, y1, x2, y2), label, 0.9)
    }

    #[test]
    fn picks_largest_human() {
        let dets = vec![
            det("person", 0, 0, 20, 25),  // 500
            det("dog", 0, 0, 100, 100),   // 非人
            det("person", 0, 0, 30, 40),  // 1200
            det("human", 50, 50, 60, 60), // 100
        ];
        assert_eq!(identify_user(&dets), Some(2));
    }

    #[test]
    fn none_without_humans() {
        let dets = vec![det("cat", 0, 0, 10, 10), det("car", 0, 0, 50, 50)];
        assert_eq!(identify_user(&dets), None);
        assert_eq!(identify_user(&[]), None);
    }

    #[test]
    fn first_seen_wins_on_tie() {
        let dets = vec![det("person", 0, 0, 10, 10), det("human", 20, 20, 30, 30)];
        assert_eq!(identify_user(&dets), Some(0));
    }

    #[test]
    fn zero_area_is_never_user() {
        let dets = vec![det("person", 5, 5, 5, 40)];
        assert_eq!(identify_user(&dets), None);
    }
}
