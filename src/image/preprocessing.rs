use crate::image::ImageLoader;
use crate::utils::error::ClassifyError;
use crate::Result;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// RGB通道数
pub const RGB_CHANNELS: usize = 3;

/// 模型输入张量
///
/// 数据按行优先排列，每个像素依次存放 R, G, B，取值范围 [0.0, 1.0]。
/// 对应 NHWC 布局下 batch 为 1 的张量。
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    size: usize,
}

impl InputTensor {
    /// 边长（像素）
    pub fn size(&self) -> usize {
        self.size
    }

    /// 张量形状 [batch, height, width, channels]
    pub fn shape(&self) -> [usize; 4] {
        [1, self.size, self.size, RGB_CHANNELS]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// 取第 index 个像素的 (R, G, B)
    pub fn pixel(&self, index: usize) -> Option<[f32; 3]> {
        let start = index * RGB_CHANNELS;
        self.data
            .get(start..start + RGB_CHANNELS)
            .map(|c| [c[0], c[1], c[2]])
    }

    /// 按本机字节序序列化为原始字节
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    /// 转换为推理引擎使用的 NHWC 数组
    pub fn to_array(&self) -> Result<Array4<f32>> {
        let [n, h, w, c] = self.shape();
        Array4::from_shape_vec((n, h, w, c), self.data.clone())
            .map_err(|e| ClassifyError::Internal(format!("Invalid tensor shape: {}", e)))
    }
}

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 将任意尺寸的图像转换为模型输入张量
    ///
    /// 1. 双线性插值拉伸到 target_size x target_size（不保持宽高比，不裁剪）
    /// 2. 每个通道除以 255 归一化
    /// 3. 行优先、RGB交错展开
    pub fn preprocess(image: &DynamicImage, target_size: u32) -> Result<InputTensor> {
        if target_size == 0 {
            return Err(ClassifyError::InvalidInput(
                "Target size must be at least 1".to_string(),
            ));
        }
        ImageLoader::validate_dimensions(image)?;

        let resized = image.resize_exact(target_size, target_size, FilterType::Triangle);
        let rgb = resized.to_rgb8();

        let data: Vec<f32> = rgb
            .pixels()
            .flat_map(|p| p.0.map(|channel| f32::from(channel) / 255.0))
            .collect();

        let size = target_size as usize;
        debug_assert_eq!(data.len(), size * size * RGB_CHANNELS);

        Ok(InputTensor { data, size })
    }

    /// 解码并预处理原始字节，解码失败时返回 Decode 错误
    pub fn preprocess_bytes(bytes: &[u8], target_size: u32) -> Result<InputTensor> {
        let image = ImageLoader::from_bytes(bytes)?;
        Self::preprocess(&image, target_size)
    }
}
