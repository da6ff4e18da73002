use crate::{
    classify::{ClassificationResult, ClassificationStats},
    config::NUM_CLASSES,
    image::{ImageLoader, ImagePreprocessor, Postprocessor},
    models::ModelManager,
    Result,
};
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 模型输出形状 [batch, classes]
pub const OUTPUT_SHAPE: [usize; 2] = [1, NUM_CLASSES];

/// 分类处理流水线：预处理 -> 推理 -> 后处理
///
/// 每次调用都在当前线程上顺序执行，请求之间不共享可变状态。
#[derive(Clone)]
pub struct ClassificationPipeline {
    models: Arc<ModelManager>,
}

impl ClassificationPipeline {
    pub fn new(models: Arc<ModelManager>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    /// 处理base64图像
    pub fn classify_base64(&self, base64_data: &str) -> Result<ClassificationResult> {
        let start_time = Instant::now();
        let image = ImageLoader::from_base64(base64_data)?;
        self.process_image(&image, start_time, start_time.elapsed())
    }

    /// 处理字节流图像
    pub fn classify_bytes(&self, bytes: &[u8]) -> Result<ClassificationResult> {
        let start_time = Instant::now();
        let image = ImageLoader::from_bytes(bytes)?;
        self.process_image(&image, start_time, start_time.elapsed())
    }

    /// 处理本地图像文件
    pub fn classify_path<P: AsRef<Path>>(&self, path: P) -> Result<ClassificationResult> {
        let start_time = Instant::now();
        let image = ImageLoader::from_path(path)?;
        self.process_image(&image, start_time, start_time.elapsed())
    }

    /// 处理已解码的图像
    pub fn classify_image(&self, image: &DynamicImage) -> Result<ClassificationResult> {
        self.process_image(image, Instant::now(), Duration::ZERO)
    }

    fn process_image(
        &self,
        image: &DynamicImage,
        start_time: Instant,
        decode_time: Duration,
    ) -> Result<ClassificationResult> {
        let model_config = &self.models.config().model_config;
        let (width, height) = image.dimensions();
        let mut stats = ClassificationStats::new(width, height, decode_time);

        let preprocess_start = Instant::now();
        let tensor = ImagePreprocessor::preprocess(image, model_config.input_size)?;
        stats.preprocess_time_ms = preprocess_start.elapsed().as_millis() as u64;

        let engine = self.models.engine()?;
        let inference_start = Instant::now();
        let output = engine.run(&tensor, OUTPUT_SHAPE)?;
        stats.inference_time_ms = inference_start.elapsed().as_millis() as u64;

        let postprocess_start = Instant::now();
        let prediction = Postprocessor::postprocess(output.scores(), &model_config.labels)?;
        let scores = Postprocessor::label_scores(output.scores(), &model_config.labels);
        stats.postprocess_time_ms = postprocess_start.elapsed().as_millis() as u64;

        let total_time = start_time.elapsed();
        stats.total_time_ms = total_time.as_millis() as u64;

        tracing::info!(
            "Classification completed: {}x{} -> {} ({:.4}), total_time={:.3}s",
            width,
            height,
            prediction.label,
            prediction.confidence,
            total_time.as_secs_f32()
        );

        Ok(ClassificationResult {
            display: prediction.to_string(),
            prediction,
            scores,
            processing_time: total_time.as_secs_f32(),
            stats,
        })
    }
}
