//! 摄像头输入 - 本地摄像头采集
//!
//! 支持 DirectShow(Windows) / AVFoundation(macOS) / V4L2(Linux)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Input};
use image::RgbaImage;
use tracing::{error, info, warn};

use super::capture_filter::CaptureFilter;
use super::FrameSource;

/// 打开设备的最长等待时间
const OPEN_TIMEOUT: Duration = Duration::from_secs(10);
/// 两帧之间的最长等待时间, 超时视为读帧失败
const READ_TIMEOUT: Duration = Duration::from_secs(5);
/// 释放时等待采集线程退出的最长时间
const RELEASE_TIMEOUT: Duration = Duration::from_secs(2);

#[cfg(target_os = "windows")]
const CAPTURE_FORMAT: &str = "dshow";
#[cfg(target_os = "macos")]
const CAPTURE_FORMAT: &str = "avfoundation";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CAPTURE_FORMAT: &str = "v4l2";

/// 摄像头帧源
///
/// 采集在独立线程中运行, 主循环通过 `read` 取最新帧
pub struct CameraSource {
    device_index: usize,
    rx: Receiver<RgbaImage>,
    stop: Arc<AtomicBool>,
    worker: Option<CaptureWorker>,
}

impl CameraSource {
    /// 打开指定索引的摄像头, 设备无法打开时返回错误
    pub fn open(device_index: usize) -> Result<Self> {
        let url = camera_url(device_index)?;
        info!("📷 打开摄像头 #{} ({}: {})", device_index, CAPTURE_FORMAT, url);

        let (tx, rx) = crossbeam_channel::bounded(2);
        let (status_tx, status_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let stop = Arc::new(AtomicBool::new(false));

        let filter = CaptureFilter::new(tx, stop.clone());
        let worker = CaptureWorker::spawn("camera-capture", move || {
            let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
            let pipe = pipe.filter("capture", Box::new(filter));
            let out = create_null_output().add_frame_pipeline(pipe);
            let input = Input::new(url).set_format(CAPTURE_FORMAT);

            let started = FfmpegContext::builder()
                .input(input)
                .filter_descs(["format=yuv420p"].into())
                .output(out)
                .build()
                .map_err(|e| format!("构建失败: {}", e))
                .and_then(|ctx| ctx.start().map_err(|e| format!("启动失败: {}", e)));

            match started {
                Ok(sch) => {
                    let _ = status_tx.send(Ok(()));
                    if let Err(e) = sch.wait() {
                        warn!("⚠️ 采集结束: {}", e);
                    }
                }
                Err(e) => {
                    let _ = status_tx.send(Err(e));
                }
            }
        })
        .context("无法创建采集线程")?;

        match status_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                worker.join_timeout(RELEASE_TIMEOUT);
                bail!("无法打开摄像头 #{}: {}", device_index, e);
            }
            Err(_) => {
                stop.store(true, Ordering::Relaxed);
                worker.join_timeout(RELEASE_TIMEOUT);
                bail!("打开摄像头 #{} 超时", device_index);
            }
        }

        info!("✅ 摄像头连接成功, 开始采集");
        Ok(Self {
            device_index,
            rx,
            stop,
            worker: Some(worker),
        })
    }
}

impl FrameSource for CameraSource {
    fn read(&mut self) -> Option<RgbaImage> {
        if self.worker.is_none() {
            return None;
        }
        match self.rx.recv_timeout(READ_TIMEOUT) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) => {
                warn!("⚠️ 摄像头 #{} 超时无帧", self.device_index);
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("⚠️ 摄像头 #{} 采集已结束", self.device_index);
                None
            }
        }
    }

    fn release(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.stop.store(true, Ordering::Relaxed);
        // 清空队列, 让采集线程尽快拿到下一帧并看到停止标志
        while self.rx.try_recv().is_ok() {}
        if !worker.join_timeout(RELEASE_TIMEOUT) {
            // 设备不再出帧时过滤器看不到停止标志, 不等它
            warn!(
                "⚠️ 摄像头 #{} 采集线程未在 {:?} 内退出, 已分离",
                self.device_index, RELEASE_TIMEOUT
            );
        }
        info!("📷 摄像头 #{} 已释放", self.device_index);
    }
}

/// 采集工作线程, 退出时通过 `done` 通道通知 (包括 panic)
struct CaptureWorker {
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

impl CaptureWorker {
    fn spawn<F>(name: &str, f: F) -> std::io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (done_tx, done) = crossbeam_channel::bounded::<()>(1);
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                // 线程结束时 done_tx 被释放, 等待方收到 Disconnected
                let _done: Sender<()> = done_tx;
                f();
            })?;
        Ok(Self { handle, done })
    }

    /// 最多等待 `timeout`; 线程已退出返回 true, 超时则分离线程返回 false
    fn join_timeout(self, timeout: Duration) -> bool {
        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    error!("❌ 采集线程异常退出");
                }
                true
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// 摄像头地址 - 根据平台选择
fn camera_url(index: usize) -> Result<String> {
    #[cfg(target_os = "windows")]
    {
        // dshow 需要设备名
        let devices = list_devices()?;
        let name = devices
            .get(index)
            .ok_or_else(|| anyhow!("摄像头 #{} 不存在 (共 {} 个设备)", index, devices.len()))?;
        Ok(format!("video={}", name))
    }
    #[cfg(target_os = "macos")]
    {
        Ok(format!("{}", index))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let path = format!("/dev/video{}", index);
        if !std::path::Path::new(&path).exists() {
            return Err(anyhow!("摄像头设备不存在: {}", path));
        }
        Ok(path)
    }
}

/// 获取可用的摄像头设备列表
pub fn list_devices() -> Result<Vec<String>> {
    ez_ffmpeg::device::get_input_video_devices().map_err(|e| anyhow!("获取摄像头列表失败: {}", e))
}
