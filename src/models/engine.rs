use crate::image::InputTensor;
use crate::Result;

/// 推理引擎的原始输出，按模型类别顺序排列
#[derive(Debug, Clone, PartialEq)]
pub struct OutputVector {
    scores: Vec<f32>,
}

impl OutputVector {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl From<Vec<f32>> for OutputVector {
    fn from(scores: Vec<f32>) -> Self {
        Self::new(scores)
    }
}

/// 预训练模型的前向推理
///
/// 实现者接收 [`InputTensor`]（NHWC，batch 为 1），返回形状为
/// `output_shape` 的分数。引擎加载一次后在请求之间复用。
pub trait InferenceEngine: Send + Sync {
    fn run(&self, input: &InputTensor, output_shape: [usize; 2]) -> Result<OutputVector>;

    /// 引擎描述，用于日志和服务信息
    fn describe(&self) -> String;
}
