use crate::utils::error::ClassifyError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use std::path::Path;

/// 单张图像允许的最大字节数
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        // 移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = if base64_data.starts_with("data:") {
            base64_data.split(',').nth(1).unwrap_or(base64_data)
        } else {
            base64_data
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        Self::from_bytes(&image_bytes)
    }

    /// 从字节流加载图像，格式由解码器判断
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ClassifyError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        tracing::debug!(
            "Decoding {} bytes, detected format: {:?}",
            bytes.len(),
            Self::detect_format(bytes)
        );

        let image = image::load_from_memory(bytes)?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 从文件路径加载图像，无法读取的文件同样视为解码失败
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path = path.as_ref();
        tracing::debug!("Loading image from: {}", path.display());

        let bytes = std::fs::read(path).map_err(ImageError::IoError)?;
        Self::from_bytes(&bytes)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像尺寸：至少需要一个像素
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_png_bytes() {
        let image = ImageLoader::from_bytes(&png_bytes(7, 3)).unwrap();
        assert_eq!(image.dimensions(), (7, 3));
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let err = ImageLoader::from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn truncated_png_fails_with_decode_error() {
        let bytes = png_bytes(16, 16);
        let err = ImageLoader::from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn base64_accepts_data_url_prefix() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(4, 4));
        let with_prefix = format!("data:image/png;base64,{}", encoded);

        let plain = ImageLoader::from_base64(&encoded).unwrap();
        let prefixed = ImageLoader::from_base64(&with_prefix).unwrap();
        assert_eq!(plain.dimensions(), prefixed.dimensions());
    }

    #[test]
    fn invalid_base64_is_reported() {
        let err = ImageLoader::from_base64("@@@not-base64@@@").unwrap_err();
        assert!(matches!(err, ClassifyError::Base64(_)));
    }

    #[test]
    fn missing_file_fails_with_decode_error() {
        let err = ImageLoader::from_path("/nonexistent/scan.png").unwrap_err();
        assert!(
            matches!(err, ClassifyError::Decode(ImageError::IoError(_))),
            "got {err:?}"
        );
    }

    #[test]
    fn any_decodable_format_is_accepted() {
        let pnm = b"P6\n1 1\n255\n\xff\x00\x00";
        assert_eq!(ImageLoader::detect_format(pnm), Some(ImageFormat::Pnm));

        let image = ImageLoader::from_bytes(pnm).unwrap();
        assert_eq!(image.dimensions(), (1, 1));
        assert_eq!(image.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn corrupt_known_format_fails_with_decode_error() {
        let err = ImageLoader::from_bytes(b"P6\n4 4\n255\n\xff").unwrap_err();
        assert!(matches!(err, ClassifyError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn oversized_payload_is_rejected_before_decoding() {
        let bytes = vec![0u8; MAX_IMAGE_BYTES + 1];
        let err = ImageLoader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ClassifyError::FileTooLarge(_, MAX_IMAGE_BYTES)));
    }
}
