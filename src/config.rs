use anyhow::Result;
use std::path::PathBuf;

/// 模型输出的类别顺序，与训练时的标签索引一致
pub const CLASS_LABELS: [&str; NUM_CLASSES] = ["Glioma", "Meningioma", "No tumor", "Pituitary"];

/// 分类器输出的类别数量
pub const NUM_CLASSES: usize = 4;

/// 模型输入的边长（像素）
pub const DEFAULT_INPUT_SIZE: u32 = 150;

/// 默认模型文件名
pub const DEFAULT_MODEL_FILE: &str = "brain_tumor_cnn.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 工作线程数量
    pub workers: usize,

    /// 开发模式
    pub dev_mode: bool,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,

    /// 分类模型配置
    pub model_config: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,

    /// 启用图优化
    pub enable_optimization: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// 模型文件名（相对于models_dir）
    pub file_name: String,

    /// 输入图像边长，图像会被拉伸到 input_size x input_size
    pub input_size: u32,

    /// 类别标签，顺序与模型输出一致
    pub labels: [&'static str; NUM_CLASSES],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_MODEL_FILE.to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            labels: CLASS_LABELS,
        }
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        models_dir: String,
        model_file: Option<String>,
        workers: Option<usize>,
        dev_mode: bool,
    ) -> Result<Self> {
        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);
        if workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
            enable_optimization: true,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
        };

        let mut model_config = ModelConfig::default();
        if let Some(file_name) = model_file {
            model_config.file_name = file_name;
        }

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            model_config,
        })
    }

    /// 获取分类模型路径
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.model_config.file_name)
    }
}
