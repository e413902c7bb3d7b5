use std::collections::HashMap;
use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::error::{AppResult, InputError};
use crate::models::attributes::ItemAttributes;

/// 物品名称（文件名 stem） → 属性覆盖项
pub type MetadataIndex = HashMap<String, ItemAttributes>;

/// 从 JSON 文件加载元数据
///
/// 文件不存在时只给出警告并返回空表；内容无法解析则返回错误。
pub async fn load_metadata(metadata_file: &Path) -> AppResult<MetadataIndex> {
    if !metadata_file.exists() {
        warn!("⚠️ 元数据文件不存在, 忽略: {}", metadata_file.display());
        return Ok(MetadataIndex::new());
    }

    let content = fs::read_to_string(metadata_file)
        .await
        .map_err(|source| InputError::MetadataRead {
            path: metadata_file.to_path_buf(),
            source,
        })?;

    let index: MetadataIndex =
        serde_json::from_str(&content).map_err(|source| InputError::MetadataParse {
            path: metadata_file.to_path_buf(),
            source,
        })?;

    info!("✓ 已加载 {} 个物品的元数据", index.len());
    Ok(index)
}

/// 可选地加载元数据文件
pub async fn load_optional_metadata(metadata_file: Option<&Path>) -> AppResult<MetadataIndex> {
    match metadata_file {
        Some(path) => load_metadata(path).await,
        None => Ok(MetadataIndex::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_metadata_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        let raw = json!({
            "coin_001": { "year": 1881, "mint_mark": "CC" },
            "coin_002": { "condition": "Very Fine" }
        });
        std::fs::write(&path, raw.to_string()).unwrap();

        let index = load_metadata(&path).await.unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index["coin_001"].get("year"), Some("1881"));
        assert_eq!(index["coin_002"].get("condition"), Some("Very Fine"));
        assert!(!index.contains_key("coin_042"));
    }

    #[tokio::test]
    async fn test_missing_metadata_file_is_empty() {
        let index = load_metadata(Path::new("/no/such/items.json")).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_metadata_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(load_metadata(&path).await.is_err());
    }
}
