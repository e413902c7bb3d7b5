//! 视觉服务 - 基础设施层
//!
//! 只暴露"检测物体边界"和"裁剪"两个能力，不认识物品、标题或描述。

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// 模拟检测使用的画面尺寸
pub const SIMULATED_FRAME: (u32, u32) = (1000, 1000);

/// 模拟检测返回的固定边界
pub const SIMULATED_BOUNDS: BoundingBox = BoundingBox {
    x: 100,
    y: 100,
    width: 800,
    height: 800,
};

/// 物体边界框（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// 视觉服务错误
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("图片不存在: {}", .0.display())]
    NotFound(PathBuf),
    #[error("图片解码失败: {0}")]
    Decode(String),
    #[error("图片编码失败: {0}")]
    Encode(String),
    #[error("不支持的输出格式: {0}")]
    UnsupportedFormat(String),
}

/// 裁剪请求
#[derive(Debug, Clone)]
pub struct CropRequest<'a> {
    pub source: &'a Path,
    pub area: BoundingBox,
    pub output: &'a Path,
    pub format: &'a str,
    pub quality: u8,
}

/// 视觉服务
///
/// 调用均为同步且有界，由上层放到阻塞线程池执行。
pub trait VisionService: Send + Sync {
    /// 图片尺寸 (宽, 高)
    fn dimensions(&self, image: &Path) -> Result<(u32, u32), VisionError>;

    /// 检测主体物体的边界
    fn detect_bounds(&self, image: &Path) -> Result<BoundingBox, VisionError>;

    /// 按区域裁剪并写出
    fn crop(&self, request: &CropRequest<'_>) -> Result<(), VisionError>;
}

/// 模拟视觉服务
///
/// 不读取像素，返回固定检测结果，裁剪只记录日志。
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedVision;

impl VisionService for SimulatedVision {
    fn dimensions(&self, _image: &Path) -> Result<(u32, u32), VisionError> {
        Ok(SIMULATED_FRAME)
    }

    fn detect_bounds(&self, image: &Path) -> Result<BoundingBox, VisionError> {
        debug!(
            "检测物体边界: {}",
            image.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(SIMULATED_BOUNDS)
    }

    fn crop(&self, request: &CropRequest<'_>) -> Result<(), VisionError> {
        debug!(
            "模拟裁剪 {:?} -> {} (格式: {}, 质量: {}%)",
            request.area,
            request.output.display(),
            request.format,
            request.quality
        );
        Ok(())
    }
}

/// 基于 `image` crate 的视觉服务
#[derive(Debug, Clone, Copy)]
pub struct RasterVision {
    /// 与背景色的亮度差超过该值即视为物体
    pub threshold: u8,
}

impl Default for RasterVision {
    fn default() -> Self {
        Self { threshold: 24 }
    }
}

impl RasterVision {
    fn open(&self, image: &Path) -> Result<DynamicImage, VisionError> {
        if !image.exists() {
            return Err(VisionError::NotFound(image.to_path_buf()));
        }
        image::open(image).map_err(|e| VisionError::Decode(e.to_string()))
    }
}

impl VisionService for RasterVision {
    fn dimensions(&self, image: &Path) -> Result<(u32, u32), VisionError> {
        if !image.exists() {
            return Err(VisionError::NotFound(image.to_path_buf()));
        }
        image::image_dimensions(image).map_err(|e| VisionError::Decode(e.to_string()))
    }

    fn detect_bounds(&self, image: &Path) -> Result<BoundingBox, VisionError> {
        let luma = self.open(image)?.to_luma8();
        let (width, height) = luma.dimensions();
        let background = luma.get_pixel(0, 0).0[0];

        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut found = false;

        for (x, y, pixel) in luma.enumerate_pixels() {
            if pixel.0[0].abs_diff(background) > self.threshold {
                found = true;
                min = (min.0.min(x), min.1.min(y));
                max = (max.0.max(x), max.1.max(y));
            }
        }

        if !found {
            warn!("⚠️ 未检测到明显物体, 使用整张图片: {}", image.display());
            return Ok(BoundingBox::new(0, 0, width, height));
        }

        Ok(BoundingBox::new(
            min.0,
            min.1,
            max.0 - min.0 + 1,
            max.1 - min.1 + 1,
        ))
    }

    fn crop(&self, request: &CropRequest<'_>) -> Result<(), VisionError> {
        let img = self.open(request.source)?;
        let area = request.area;
        let cropped = img.crop_imm(area.x, area.y, area.width, area.height);
        debug!(
            "裁剪 {}x{} -> {}x{}",
            img.width(),
            img.height(),
            cropped.width(),
            cropped.height()
        );

        let format = request.format.to_ascii_lowercase();
        if format == "jpg" || format == "jpeg" {
            let file = File::create(request.output).map_err(|e| VisionError::Encode(e.to_string()))?;
            let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), request.quality);
            return encoder
                .encode_image(&cropped.to_rgb8())
                .map_err(|e| VisionError::Encode(e.to_string()));
        }

        let image_format = ImageFormat::from_extension(&format)
            .ok_or_else(|| VisionError::UnsupportedFormat(request.format.to_string()))?;
        cropped
            .save_with_format(request.output, image_format)
            .map_err(|e| VisionError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_test_image(path: &Path) {
        let mut img = RgbImage::from_pixel(40, 30, Rgb([255, 255, 255]));
        for x in 10..20 {
            for y in 5..15 {
                img.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        img.save(path).unwrap();
    }

    #[test]
    fn test_simulated_vision_is_fixed() {
        let vision = SimulatedVision;
        let path = Path::new("anything.jpg");
        assert_eq!(vision.dimensions(path).unwrap(), SIMULATED_FRAME);
        assert_eq!(vision.detect_bounds(path).unwrap(), SIMULATED_BOUNDS);
    }

    #[test]
    fn test_raster_detects_dark_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coin.png");
        write_test_image(&path);

        let vision = RasterVision::default();
        assert_eq!(vision.dimensions(&path).unwrap(), (40, 30));
        assert_eq!(
            vision.detect_bounds(&path).unwrap(),
            BoundingBox::new(10, 5, 10, 10)
        );
    }

    #[test]
    fn test_raster_crop_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("coin.png");
        let output = dir.path().join("coin_cropped.jpg");
        write_test_image(&source);

        let vision = RasterVision::default();
        vision
            .crop(&CropRequest {
                source: &source,
                area: BoundingBox::new(8, 3, 14, 14),
                output: &output,
                format: "jpg",
                quality: 90,
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (14, 14));
    }

    #[test]
    fn test_raster_missing_file() {
        let vision = RasterVision::default();
        let err = vision.detect_bounds(Path::new("/no/such/coin.png")).unwrap_err();
        assert!(matches!(err, VisionError::NotFound(_)));
    }
}
