use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::InputError;

/// 支持的图片扩展名（比较时忽略大小写）
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "webp"];

/// 判断文件是否为支持的图片
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// 列出目录下（不递归）所有支持的图片，按文件名排序
///
/// 子目录与其他文件被忽略。
pub async fn discover_images(input_dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    if !input_dir.exists() {
        return Err(InputError::NotFound {
            path: input_dir.to_path_buf(),
        });
    }
    if !input_dir.is_dir() {
        return Err(InputError::NotADirectory {
            path: input_dir.to_path_buf(),
        });
    }

    let mut entries = fs::read_dir(input_dir)
        .await
        .map_err(|_| InputError::NotFound {
            path: input_dir.to_path_buf(),
        })?;

    let mut images = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_file())
            .unwrap_or(false);

        if is_file && is_supported_image(&path) {
            images.push(path);
        } else {
            debug!("跳过非图片条目: {}", path.display());
        }
    }

    images.sort();
    Ok(images)
}
