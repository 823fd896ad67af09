/// 动物检测与追踪 (Animal Detection & Tracking)
///
/// 两种模式:
/// 1. 图片模式: `animal-tracker photo.jpg` 检测一次, 全屏显示, 按任意键退出
/// 2. 摄像头模式: `animal-tracker` 实时检测 + 追踪, `s` 停止, `r` 重置追踪
///
/// 单线程架构: 读帧 → 检测 → 用户识别 → 过滤 → 追踪 → 绘制 → 显示
use anyhow::Result;
use clap::Parser;
use macroquad::window::Conf;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use animal_tracker::detection::ColorMap;
use animal_tracker::input::{self, CameraSource};
use animal_tracker::pipeline::{self, FrameProcessor};
use animal_tracker::renderer::{self, Window};
use animal_tracker::{Args, Model, TrackerConfig, YOLOv8};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const IMAGE_WINDOW_TITLE: &str = "Animal Detection - Image";
const VIDEO_WINDOW_TITLE: &str = "Animal Detection & Tracking";

fn window_conf() -> Conf {
    let title = if Args::parse().is_image_mode() {
        IMAGE_WINDOW_TITLE
    } else {
        VIDEO_WINDOW_TITLE
    };
    Conf {
        window_title: title.to_string(),
        fullscreen: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("animal_tracker=info,ort=warn")),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if args.list_devices {
        for (idx, name) in input::list_devices()?.iter().enumerate() {
            info!("📷 #{}: {}", idx, name);
        }
        return Ok(());
    }

    info!("🚀 动物检测系统启动");
    info!("📦 检测模型: {}", args.model.display());

    let tracker = match &args.tracker_config {
        Some(path) => TrackerConfig::load(path),
        None => TrackerConfig::default(),
    };
    tracker.print_summary();

    let model = YOLOv8::new(&args, args.detector_conf(&tracker))?;
    model.summary();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let colors = ColorMap::generate(&mut rng);
    let font = renderer::load_font(&args.font);

    let mut processor = FrameProcessor::new(model, tracker, colors, font);
    let mut window = Window::new();

    match &args.image {
        Some(path) => {
            let image = match input::load_image(path) {
                Ok(image) => image,
                Err(e) => {
                    error!("Error: Unable to read image. ({:#})", e);
                    std::process::exit(1);
                }
            };
            info!("🖼️ 图片模式: {}", path.display());
            pipeline::run_image(&mut processor, image, &mut window).await
        }
        None => {
            // 打不开摄像头与读帧失败同样处理: 记录后正常结束
            let mut camera = match CameraSource::open(args.camera) {
                Ok(camera) => camera,
                Err(e) => {
                    warn!("⚠️ {:#}", e);
                    return Ok(());
                }
            };
            pipeline::run_video(&mut processor, &mut camera, &mut window).await
        }
    }
}
