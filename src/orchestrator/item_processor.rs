//! 单个物品处理器 - 编排层
//!
//! ## 职责
//!
//! 非批处理模式下处理一张图片：准备输出目录、查找该物品的元数据、
//! 调用 `ListingFlow` 并输出单个物品的结果。

use std::path::Path;

use tokio::fs;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppResult, FileError, InputError};
use crate::models::listing::ItemResult;
use crate::models::loaders::load_optional_metadata;
use crate::workflow::{ItemCtx, ListingFlow};

/// 处理单个物品
///
/// # 参数
/// - `flow`: 物品处理流程
/// - `image_path`: 输入图片
/// - `output_dir`: 产物输出目录
/// - `metadata_file`: 可选的元数据文件
///
/// # 返回
/// 物品结果；图片不存在时返回输入错误
pub async fn process_item(
    flow: &ListingFlow,
    image_path: &Path,
    output_dir: &Path,
    metadata_file: Option<&Path>,
) -> AppResult<ItemResult> {
    if !image_path.is_file() {
        return Err(InputError::NotFound {
            path: image_path.to_path_buf(),
        }
        .into());
    }

    let metadata = load_optional_metadata(metadata_file).await?;
    fs::create_dir_all(output_dir)
        .await
        .map_err(|source| FileError::CreateDirFailed {
            path: output_dir.to_path_buf(),
            source,
        })?;

    let ctx = ItemCtx::new(0, 1, image_path.to_path_buf(), output_dir.to_path_buf());
    info!("{} 开始处理: {}", ctx, image_path.display());

    let result = flow.run(&ctx, metadata.get(&ctx.item_name)).await;
    if result.success {
        info!("{} ✅ 处理完成", ctx);
    } else {
        error!(
            "{} ❌ 处理失败: {}",
            ctx,
            result.error.as_deref().unwrap_or("未知错误")
        );
    }
    Ok(result)
}

/// 按配置创建流程后处理单个物品
pub async fn process_item_with_config(
    config: &Config,
    image_path: &Path,
    output_dir: &Path,
    metadata_file: Option<&Path>,
) -> AppResult<ItemResult> {
    let flow = ListingFlow::new(config);
    process_item(&flow, image_path, output_dir, metadata_file).await
}
