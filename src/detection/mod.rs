/// 检测系统 (Detection System)
///
/// 每帧流程中模型之外的全部逻辑
/// - User:     最大人形框识别
/// - Filter:   类别白名单过滤 + 追踪输入适配
/// - Color:    类别颜色表
/// - Tracker:  目标追踪
pub mod bytetrack;
pub mod classes;
pub mod color;
pub mod filter;
pub mod tracker;
pub mod types;
pub mod user;

pub use bytetrack::ByteTracker;
pub use classes::{is_allowed, is_human_alias, USER_LABEL};
pub use color::{ColorMap, Rgb, IMAGE_DEFAULT_COLOR, VIDEO_DEFAULT_COLOR};
pub use filter::{select_detections, to_track_inputs};
pub use tracker::{Track, TrackState, Tracker};
pub use types::{BBox, Detection, TrackInput};
pub use user::identify_user;
