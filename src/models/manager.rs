use crate::config::NUM_CLASSES;
use crate::models::{InferenceEngine, OnnxClassifier};
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// 推理引擎的持有者
///
/// 服务启动时加载一次模型，之后在所有请求之间共享。模型不可用时服务仍然
/// 启动，每个请求都会得到 EngineUnavailable。
pub struct ModelManager {
    engine: std::result::Result<Arc<dyn InferenceEngine>, String>,
    config: Config,
}

impl ModelManager {
    /// 从配置加载 ONNX 模型
    pub fn load(config: Config) -> Self {
        tracing::info!("Initializing model manager...");

        let engine = match OnnxClassifier::load(&config) {
            Ok(classifier) => {
                tracing::info!("Classification model loaded successfully");
                Ok(Arc::new(classifier) as Arc<dyn InferenceEngine>)
            }
            Err(e) => {
                tracing::warn!("Classification model unavailable, requests will fail: {}", e);
                Err(e.to_string())
            }
        };

        Self { engine, config }
    }

    /// 使用外部提供的推理引擎
    pub fn with_engine(engine: Arc<dyn InferenceEngine>, config: Config) -> Self {
        tracing::info!("Using injected inference engine: {}", engine.describe());
        Self {
            engine: Ok(engine),
            config,
        }
    }

    /// 获取推理引擎引用
    pub fn engine(&self) -> Result<Arc<dyn InferenceEngine>> {
        match &self.engine {
            Ok(engine) => Ok(Arc::clone(engine)),
            Err(reason) => Err(ClassifyError::EngineUnavailable(reason.clone())),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_ok()
    }

    /// 获取配置引用
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");
        self.engine().map(|_| ())
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            engine: self.engine.as_ref().ok().map(|e| e.describe()),
            model_path: self.config.model_path(),
            loaded: self.is_loaded(),
            load_error: self.engine.as_ref().err().cloned(),
            input_size: self.config.model_config.input_size,
            labels: self.config.model_config.labels,
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    pub model_path: PathBuf,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
    pub input_size: u32,
    pub labels: [&'static str; NUM_CLASSES],
    pub intra_threads: usize,
    pub optimization_level: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::InputTensor;
    use crate::models::OutputVector;

    struct ConstantEngine;

    impl InferenceEngine for ConstantEngine {
        fn run(&self, _input: &InputTensor, _output_shape: [usize; 2]) -> Result<OutputVector> {
            Ok(OutputVector::new(vec![0.25; NUM_CLASSES]))
        }

        fn describe(&self) -> String {
            "constant".to_string()
        }
    }

    fn config_without_model() -> Config {
        Config::new(
            "127.0.0.1:0".to_string(),
            "/nonexistent/models".to_string(),
            None,
            Some(1),
            false,
        )
        .unwrap()
    }

    #[test]
    fn missing_model_keeps_manager_alive_but_unavailable() {
        let manager = ModelManager::load(config_without_model());

        assert!(!manager.is_loaded());
        assert!(matches!(manager.engine(), Err(ClassifyError::EngineUnavailable(_))));
        assert!(matches!(manager.health_check(), Err(ClassifyError::EngineUnavailable(_))));

        let stats = manager.stats();
        assert!(!stats.loaded);
        assert!(stats.load_error.is_some());
        assert_eq!(stats.input_size, 150);
    }

    #[test]
    fn corrupt_model_keeps_manager_alive_but_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(crate::config::DEFAULT_MODEL_FILE),
            [0u8, 1, 2, 3, 4, 5, 6, 7],
        )
        .unwrap();
        let config = Config::new(
            "127.0.0.1:0".to_string(),
            dir.path().to_string_lossy().into_owned(),
            None,
            Some(1),
            false,
        )
        .unwrap();

        let manager = ModelManager::load(config);

        assert!(!manager.is_loaded());
        assert!(matches!(manager.engine(), Err(ClassifyError::EngineUnavailable(_))));
        assert!(manager.stats().load_error.is_some());
    }

    #[test]
    fn injected_engine_is_shared() {
        let manager = ModelManager::with_engine(Arc::new(ConstantEngine), config_without_model());

        assert!(manager.health_check().is_ok());
        let first = manager.engine().unwrap();
        let second = manager.engine().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.stats().engine.as_deref(), Some("constant"));
    }
}
