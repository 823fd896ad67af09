/// 视频处理流水线 (Video Processing Pipeline)
///
/// 单线程同步架构, 每帧依次执行:
/// 读帧 → 检测 → 用户识别 → 过滤 → 追踪 → 绘制 → 显示 → 读取按键
///
/// 图片模式只走一次 检测 → 用户识别 → 过滤 → 绘制 → 显示
pub mod processor;

pub use processor::FrameProcessor;

use anyhow::Result;
use image::DynamicImage;
use tracing::{info, warn};

use crate::input::FrameSource;
use crate::models::Detector;
use crate::renderer::{Command, Display};

/// 图片模式: 标注后显示, 按任意键退出
pub async fn run_image<D, W>(
    processor: &mut FrameProcessor<D>,
    image: DynamicImage,
    display: &mut W,
) -> Result<()>
where
    D: Detector,
    W: Display,
{
    let frame = processor.annotate_image(image)?;
    display.wait_for_key(&frame).await;
    Ok(())
}

/// 视频模式控制循环
///
/// 以下任一情况结束循环: 按下 `s`, 读帧失败, 处理出错.
/// 无论哪种情况, 帧源都在返回前释放.
pub async fn run_video<D, S, W>(
    processor: &mut FrameProcessor<D>,
    source: &mut S,
    display: &mut W,
) -> Result<()>
where
    D: Detector,
    S: FrameSource,
    W: Display,
{
    info!("Press 's' to stop, 'r' to reset tracking...");
    let result = drive(processor, source, display).await;
    source.release();
    result
}

async fn drive<D, S, W>(
    processor: &mut FrameProcessor<D>,
    source: &mut S,
    display: &mut W,
) -> Result<()>
where
    D: Detector,
    S: FrameSource,
    W: Display,
{
    loop {
        let Some(frame) = source.read() else {
            warn!("⚠️ 读帧失败, 结束检测");
            return Ok(());
        };

        let frame = processor.process_frame(frame)?;

        match display.present(&frame).await {
            Some(Command::Stop) => {
                info!("🛑 Stopping detection...");
                return Ok(());
            }
            Some(Command::Reset) => {
                processor.reset_tracker();
                info!("🔄 Tracker reset.");
            }
            None => {}
        }
    }
}
