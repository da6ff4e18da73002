use crate::image::InputTensor;
use crate::models::{InferenceEngine, OutputVector};
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// 基于 ONNX Runtime 的肿瘤分类模型
pub struct OnnxClassifier {
    session: Mutex<Session>,
    model_path: PathBuf,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxClassifier {
    /// 加载模型，文件缺失或加载失败时返回 EngineUnavailable
    pub fn load(config: &Config) -> Result<Self> {
        let model_path = config.model_path();

        if !model_path.exists() {
            return Err(ClassifyError::EngineUnavailable(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = Self::build_session(config, &model_path).map_err(|e| {
            ClassifyError::EngineUnavailable(format!(
                "Failed to load model {}: {}",
                model_path.display(),
                e
            ))
        })?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifyError::EngineUnavailable(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::EngineUnavailable(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model ready: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            model_path,
            input_name,
            output_name,
        })
    }

    fn build_session(config: &Config, model_path: &Path) -> Result<Session> {
        let level = if config.onnx_config.enable_optimization {
            match config.onnx_config.optimization_level {
                i32::MIN..=0 => GraphOptimizationLevel::Disable,
                1 => GraphOptimizationLevel::Level1,
                2 => GraphOptimizationLevel::Level2,
                _ => GraphOptimizationLevel::Level3,
            }
        } else {
            GraphOptimizationLevel::Disable
        };

        let session = Session::builder()?
            .with_optimization_level(level)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(model_path)?;

        Ok(session)
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl InferenceEngine for OnnxClassifier {
    fn run(&self, input: &InputTensor, output_shape: [usize; 2]) -> Result<OutputVector> {
        let input_tensor = Tensor::from_array(input.to_array()?)?;

        // 推理 - 在锁内提取数据避免生命周期冲突
        let (shape, scores) = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => {
                    let array = output.try_extract_array::<f32>()?;
                    (array.shape().to_vec(), array.iter().copied().collect::<Vec<f32>>())
                }
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(ClassifyError::Inference(format!(
                        "Output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        let expected = output_shape.iter().product::<usize>();
        if scores.len() != expected {
            return Err(ClassifyError::EmptyOutput {
                expected,
                actual: scores.len(),
            });
        }

        tracing::debug!("Model output shape {:?}: {:?}", shape, scores);

        Ok(OutputVector::new(scores))
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.model_path.display())
    }
}

impl Drop for OnnxClassifier {
    fn drop(&mut self) {
        tracing::debug!("Releasing classification model: {}", self.model_path.display());
    }
}
