use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tumor_classifier::{
    config::Config, models::ModelManager, web::serve, ClassificationPipeline,
};

#[derive(Parser)]
#[command(name = "tumor-classifier")]
#[command(about = "ONNX-powered brain tumor MRI classification service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:5005")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Model file name inside the model directory
    #[arg(long)]
    model_file: Option<String>,

    /// Classify a single image file, print the result and exit
    #[arg(long)]
    image: Option<PathBuf>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let config = Config::new(
        args.bind,
        args.models_dir,
        args.model_file,
        args.workers,
        args.dev,
    )?;

    tracing::info!("Model path: {}", config.model_path().display());

    if let Some(image_path) = args.image {
        return classify_once(config, &image_path);
    }

    tracing::info!("Starting tumor classification service...");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Worker threads: {}", config.workers);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))?;

    Ok(())
}

/// 单次分类模式：输出 "<label> - <pct>%"
fn classify_once(config: Config, image_path: &Path) -> Result<()> {
    let models = Arc::new(ModelManager::load(config));
    let pipeline = ClassificationPipeline::new(models);

    let result = pipeline
        .classify_path(image_path)
        .with_context(|| format!("failed to classify {}", image_path.display()))?;

    println!("{}", result.display);
    Ok(())
}
