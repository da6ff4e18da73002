use crate::image::{LabelScore, PredictionResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 完整的分类处理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// 最高分类别
    pub prediction: PredictionResult,
    /// 展示用文本，如 "Glioma - 87%"
    pub display: String,
    /// 全部类别的原始分数
    pub scores: Vec<LabelScore>,
    /// 处理耗时（秒）
    pub processing_time: f32,
    pub stats: ClassificationStats,
}

/// 分类处理统计信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationStats {
    /// 原图宽度
    pub original_width: u32,
    /// 原图高度
    pub original_height: u32,
    /// 解码耗时（毫秒）
    pub decode_time_ms: u64,
    /// 预处理耗时（毫秒）
    pub preprocess_time_ms: u64,
    /// 推理耗时（毫秒）
    pub inference_time_ms: u64,
    /// 后处理耗时（毫秒）
    pub postprocess_time_ms: u64,
    /// 总耗时（毫秒）
    pub total_time_ms: u64,
}

impl ClassificationStats {
    pub fn new(original_width: u32, original_height: u32, decode_time: Duration) -> Self {
        Self {
            original_width,
            original_height,
            decode_time_ms: decode_time.as_millis() as u64,
            ..Self::default()
        }
    }
}
