//! ByteTrack 算法实现
//! ByteTrack: Simple and effective multi-object tracking
//!
//! 核心思想:
//! 1. 高低分检测框分开处理
//! 2. 高分框优先匹配 (IOU)
//! 3. 低分框救援已确认但丢失的轨迹
//! 4. 纯运动模型,无需外观特征
//!
//! 轨迹需连续命中 `n_init` 次才确认, 确认后丢失超过 `max_age` 帧删除.

use super::tracker::{compute_iou, Track, Tracker};
use super::types::TrackInput;
use crate::config::TrackerConfig;

/// ByteTrack 追踪器
pub struct ByteTracker {
    tracks: Vec<Track>,

    /// 下一个分配的ID
    next_id: u32,

    config: TrackerConfig,
}

impl ByteTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// 已确认的轨迹
    pub fn confirmed(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_confirmed())
    }

    /// IOU 贪心匹配, 返回 (检测下标, 轨迹下标)
    fn match_detections_to_tracks(
        &self,
        detections: &[(usize, &TrackInput)],
        track_indices: &[usize],
        iou_threshold: f32,
    ) -> Vec<(usize, usize)> {
        if detections.is_empty() || track_indices.is_empty() {
            return Vec::new();
        }

        // (代价, 检测下标, 局部检测下标, 轨迹下标, 局部轨迹下标)
        let mut candidates = Vec::new();
        for (local_det_idx, (det_idx, detection)) in detections.iter().enumerate() {
            let det_box = detection.bbox().to_ltrb_f32();
            for (local_track_idx, &track_idx) in track_indices.iter().enumerate() {
                let track_box = self.tracks[track_idx].kalman.state_ltrb();
                let iou = compute_iou(det_box, track_box);
                if iou >= iou_threshold {
                    candidates.push((1.0 - iou, *det_idx, local_det_idx, track_idx, local_track_idx));
                }
            }
        }

        // 贪心匹配: 按代价排序
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut assignments = Vec::new();
        let mut used_det = vec![false; detections.len()];
        let mut used_track = vec![false; track_indices.len()];

        for (_, det_idx, local_det_idx, track_idx, local_track_idx) in candidates {
            if !used_det[local_det_idx] && !used_track[local_track_idx] {
                assignments.push((det_idx, track_idx));
                used_det[local_det_idx] = true;
                used_track[local_track_idx] = true;
            }
        }

        assignments
    }

    /// 获取跟踪统计信息
    pub fn get_stats(&self) -> String {
        format!(
            "跟踪: {} 个 (确认 {}) | 总ID: {}",
            self.tracks.len(),
            self.confirmed().count(),
            self.next_id - 1
        )
    }
}

impl Default for ByteTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Tracker for ByteTracker {
    /// 更新跟踪 (ByteTrack 两轮匹配)
    fn update(&mut self, detections: &[TrackInput]) -> &[Track] {
        let cfg = self.config.clone();

        // 1. 所有轨迹先预测
        for track in &mut self.tracks {
            track.predict();
        }

        // 2. 分离高低分检测框
        let mut high_dets: Vec<(usize, &TrackInput)> = Vec::new();
        let mut low_dets: Vec<(usize, &TrackInput)> = Vec::new();
        for (idx, det) in detections.iter().enumerate() {
            if det.confidence >= cfg.high_score_threshold {
                high_dets.push((idx, det));
            } else if det.confidence >= cfg.low_score_threshold {
                low_dets.push((idx, det));
            }
        }

        // 3. 第一轮匹配: 高分检测 + 所有轨迹
        let mut matched_det = vec![false; detections.len()];
        let mut matched_track = vec![false; self.tracks.len()];

        let all_tracks: Vec<usize> = (0..self.tracks.len()).collect();
        let assignments =
            self.match_detections_to_tracks(&high_dets, &all_tracks, cfg.high_iou_threshold);
        for (det_idx, track_idx) in assignments {
            matched_det[det_idx] = true;
            matched_track[track_idx] = true;
            self.tracks[track_idx].update(&detections[det_idx], cfg.n_init);
        }

        // 4. 第二轮匹配: 低分检测 + 未匹配的已确认轨迹 (救援)
        let unmatched_confirmed: Vec<usize> = (0..self.tracks.len())
            .filter(|&idx| !matched_track[idx] && self.tracks[idx].is_confirmed())
            .collect();
        let low_assignments =
            self.match_detections_to_tracks(&low_dets, &unmatched_confirmed, cfg.low_iou_threshold);
        for (det_idx, track_idx) in low_assignments {
            matched_det[det_idx] = true;
            matched_track[track_idx] = true;
            self.tracks[track_idx].update(&detections[det_idx], cfg.n_init);
        }

        // 5. 未匹配的轨迹 → 标记丢失, 超龄或未确认的删除
        let mut keep = vec![true; self.tracks.len()];
        for (track_idx, &matched) in matched_track.iter().enumerate() {
            if !matched && self.tracks[track_idx].mark_missed(cfg.max_age) {
                keep[track_idx] = false;
            }
        }
        let mut flags = keep.into_iter();
        self.tracks.retain(|_| flags.next().unwrap_or(true));

        // 6. 未匹配的高分检测 → 新建轨迹
        for (det_idx, &matched) in matched_det.iter().enumerate() {
            let det = &detections[det_idx];
            if !matched && det.confidence >= cfg.high_score_threshold {
                self.tracks.push(Track::new(
                    self.next_id,
                    det,
                    cfg.kalman_process_noise,
                    cfg.kalman_obs_noise,
                    cfg.n_init,
                ));
                self.next_id += 1;
            }
        }

        &self.tracks
    }

    fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 1;
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(label: &str, l: i32, t: i32, w: i32, h: i32, conf: f32) -> TrackInput {
        TrackInput {
            ltwh: [l, t, w, h],
            confidence: conf,
            label: label.to_string(),
        }
    }

    fn confirmed_ids(tracker: &ByteTracker) -> Vec<u32> {
        tracker.confirmed().map(|t| t.id).collect()
    }

    #[test]
    fn confirms_after_n_init_hits() {
        let mut tracker = ByteTracker::default();
        let n_init = tracker.config().n_init;
        let dog = input("dog", 100, 100, 80, 60, 0.9);

        for frame in 1..=n_init {
            tracker.update(std::slice::from_ref(&dog));
            let expect_confirmed = frame >= n_init;
            assert_eq!(!confirmed_ids(&tracker).is_empty(), expect_confirmed);
        }
        assert_eq!(confirmed_ids(&tracker), vec![1]);
        let track = tracker.confirmed().next().map(|t| t.label.clone());
        assert_eq!(track.as_deref(), Some("dog"));
    }

    #[test]
    fn identity_persists_across_small_motion() {
        let mut tracker = ByteTracker::default();
        for step in 0..10 {
            tracker.update(&[input("cat", 50 + step * 3, 40, 60, 60, 0.8)]);
        }
        assert_eq!(confirmed_ids(&tracker), vec![1]);
        assert_eq!(tracker.track_count(), 1);
    }

    #[test]
    fn tentative_track_dies_on_first_miss() {
        let mut tracker = ByteTracker::default();
        tracker.update(&[input("bird", 0, 0, 20, 20, 0.9)]);
        assert_eq!(tracker.track_count(), 1);
        tracker.update(&[]);
        assert_eq!(tracker.track_count(), 0);
    }

    #[test]
    fn confirmed_track_expires_after_max_age() {
        let config = TrackerConfig {
            max_age: 5,
            ..TrackerConfig::default()
        };
        let mut tracker = ByteTracker::new(config);
        let horse = input("horse", 200, 200, 100, 100, 0.9);
        for _ in 0..tracker.config().n_init {
            tracker.update(std::slice::from_ref(&horse));
        }
        for _ in 0..5 {
            tracker.update(&[]);
        }
        assert_eq!(confirmed_ids(&tracker), vec![1]);
        tracker.update(&[]);
        assert!(confirmed_ids(&tracker).is_empty());
    }

    #[test]
    fn reset_restarts_id_sequence() {
        let mut tracker = ByteTracker::default();
        let n_init = tracker.config().n_init;
        let a = input("dog", 0, 0, 50, 50, 0.9);
        let b = input("cat", 300, 300, 50, 50, 0.9);
        for _ in 0..n_init {
            tracker.update(&[a.clone(), b.clone()]);
        }
        assert_eq!(confirmed_ids(&tracker), vec![1, 2]);

        tracker.reset();
        assert_eq!(tracker.track_count(), 0);

        for _ in 0..n_init {
            tracker.update(std::slice::from_ref(&b));
        }
        assert_eq!(confirmed_ids(&tracker), vec![1]);
    }

    #[test]
    fn low_score_detection_rescues_confirmed_track() {
        let mut tracker = ByteTracker::default();
        let strong = input("sheep", 10, 10, 40, 40, 0.9);
        for _ in 0..tracker.config().n_init {
            tracker.update(std::slice::from_ref(&strong));
        }
        let weak = input("sheep", 11, 10, 40, 40, 0.15);
        tracker.update(std::slice::from_ref(&weak));
        let track = tracker.confirmed().next().map(|t| (t.id, t.time_since_update()));
        assert_eq!(track, Some((1, 0)));
    }

    #[test]
    fn label_follows_latest_match() {
        let mut tracker = ByteTracker::default();
        for _ in 0..3 {
            tracker.update(&[input("person", 0, 0, 100, 200, 0.9)]);
        }
        tracker.update(&[input(crate::detection::USER_LABEL, 0, 0, 100, 200, 0.9)]);
        let label = tracker.confirmed().next().map(|t| t.label.clone());
        assert_eq!(label.as_deref(), Some(crate::detection::USER_LABEL));
    }
}
