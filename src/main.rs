use anyhow::Result;
use clap::Parser;
use hero_lens::{capture::CaptureScreen, config::Config, image::ImageLoader, DisplayCommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hero-lens")]
#[command(about = "On-device photo classification demo")]
struct Args {
    /// Path to the photo to capture and classify
    #[arg(long)]
    image: PathBuf,

    /// Directory holding model.onnx and labels.txt
    #[arg(long, default_value = "assets")]
    assets_dir: String,

    /// ONNX Runtime intra-op threads (defaults to 75% of cores)
    #[arg(long)]
    intra_threads: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting hero-lens...");
    tracing::info!("Assets directory: {}", args.assets_dir);

    let config = Config::new(args.assets_dir, args.intra_threads)?;

    // 单一UI上下文：顺序消费屏幕发来的显示指令
    let (display_tx, mut display_rx) = mpsc::unbounded_channel();
    let ui_task = tokio::spawn(async move {
        while let Some(command) = display_rx.recv().await {
            match command {
                DisplayCommand::ShowImage(image) => {
                    tracing::info!("Showing captured image ({}x{})", image.width(), image.height());
                }
                DisplayCommand::ShowResult(text) => {
                    println!("{}", text);
                }
                DisplayCommand::SetCaptureEnabled(enabled) => {
                    tracing::debug!("Capture trigger enabled: {}", enabled);
                }
                DisplayCommand::ShowProgress(visible) => {
                    tracing::debug!("Progress indicator visible: {}", visible);
                }
            }
        }
    });

    // 进入拍摄屏幕即开始后台加载分类器
    let mut screen = CaptureScreen::new(config, display_tx);
    screen.wait_for_classifier().await;

    if let Some(reason) = screen.classifier_failure() {
        screen.destroy();
        anyhow::bail!("classifier unavailable: {}", reason);
    }

    let photo = ImageLoader::from_path(&args.image)?;
    tracing::info!("Captured photo: {}", args.image.display());
    screen.on_capture(photo).await;

    // 退出屏幕：中止挂起的初始化并释放分类器
    screen.destroy();
    drop(screen);
    ui_task.await?;

    Ok(())
}
