//! 图片阶段 - 业务能力层
//!
//! 调用视觉服务检测主体、计算带边距的裁剪区域并写出裁剪图。
//! 失败时该物品失败，其余阶段不再执行。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::{ImageStageConfig, VisionBackend};
use crate::error::StageError;
use crate::infrastructure::vision::{
    BoundingBox, CropRequest, RasterVision, SimulatedVision, VisionError, VisionService,
};

/// 图片阶段
#[derive(Clone)]
pub struct ImageStage {
    config: ImageStageConfig,
    vision: Arc<dyn VisionService>,
}

impl ImageStage {
    pub fn new(config: &ImageStageConfig, vision: Arc<dyn VisionService>) -> Self {
        Self {
            config: config.clone(),
            vision,
        }
    }

    /// 按配置的后端创建
    pub fn from_config(config: &ImageStageConfig) -> Self {
        let vision: Arc<dyn VisionService> = match config.backend {
            VisionBackend::Simulated => Arc::new(SimulatedVision),
            VisionBackend::Raster => Arc::new(RasterVision::default()),
        };
        Self::new(config, vision)
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// `<输出目录>/<物品名>_cropped.<格式>`
    pub fn output_path(&self, output_dir: &Path, item_name: &str) -> PathBuf {
        output_dir.join(format!(
            "{}_cropped.{}",
            item_name,
            self.config.output_format.trim_start_matches('.')
        ))
    }

    /// 裁剪单张图片（同步，可能阻塞）
    pub fn process(&self, image: &Path, output: &Path) -> Result<PathBuf, StageError> {
        let to_stage_error = |e: VisionError| StageError::Image {
            path: image.to_path_buf(),
            message: e.to_string(),
        };

        if !image.exists() {
            return Err(to_stage_error(VisionError::NotFound(image.to_path_buf())));
        }

        let (width, height) = self.vision.dimensions(image).map_err(to_stage_error)?;
        let bounds = self.vision.detect_bounds(image).map_err(to_stage_error)?;

        let area = calculate_crop_area(bounds, width, height, self.config.padding_percent);
        let area = ensure_min_size(
            area,
            width,
            height,
            self.config.min_width,
            self.config.min_height,
        );
        if area.width == 0 || area.height == 0 {
            return Err(StageError::Image {
                path: image.to_path_buf(),
                message: format!("裁剪区域为空: {:?}", area),
            });
        }
        debug!("检测边界 {:?} -> 裁剪区域 {:?}", bounds, area);

        self.vision
            .crop(&CropRequest {
                source: image,
                area,
                output,
                format: &self.config.output_format,
                quality: self.config.quality,
            })
            .map_err(to_stage_error)?;

        Ok(output.to_path_buf())
    }

    /// 在阻塞线程池中裁剪
    pub async fn process_async(&self, image: PathBuf, output: PathBuf) -> Result<PathBuf, StageError> {
        let stage = self.clone();
        let image_for_error = image.clone();
        tokio::task::spawn_blocking(move || stage.process(&image, &output))
            .await
            .map_err(|e| StageError::Image {
                path: image_for_error,
                message: format!("裁剪任务异常退出: {}", e),
            })?
    }
}

/// 在检测边界外加 `padding_percent` 的边距，并限制在图片范围内
pub fn calculate_crop_area(
    bounds: BoundingBox,
    image_width: u32,
    image_height: u32,
    padding_percent: f64,
) -> BoundingBox {
    let padding = padding_percent / 100.0;
    let pad_x = (bounds.width as f64 * padding) as u32;
    let pad_y = (bounds.height as f64 * padding) as u32;

    let x = bounds.x.saturating_sub(pad_x).min(image_width);
    let y = bounds.y.saturating_sub(pad_y).min(image_height);
    let width = (image_width - x).min(bounds.width.saturating_add(2 * pad_x));
    let height = (image_height - y).min(bounds.height.saturating_add(2 * pad_y));

    BoundingBox::new(x, y, width, height)
}

/// 在图片允许的范围内把裁剪区域扩大到至少 `min_width × min_height`
pub fn ensure_min_size(
    area: BoundingBox,
    image_width: u32,
    image_height: u32,
    min_width: u32,
    min_height: u32,
) -> BoundingBox {
    let (x, width) = grow_span(area.x, area.width, image_width, min_width);
    let (y, height) = grow_span(area.y, area.height, image_height, min_height);
    BoundingBox::new(x, y, width, height)
}

fn grow_span(start: u32, len: u32, limit: u32, min_len: u32) -> (u32, u32) {
    let target = len.max(min_len).min(limit);
    if target <= len {
        return (start, len);
    }
    let extra = target - len;
    let start = start.saturating_sub(extra / 2).min(limit - target);
    (start, target)
}
