//! 汇总写入服务 - 业务能力层
//!
//! 只负责"把批处理汇总写到输出目录"能力，不关心流程

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{AppResult, FileError};
use crate::models::listing::BatchSummary;

/// 汇总文件名
pub const SUMMARY_FILE_NAME: &str = "processing_summary.json";

/// 汇总写入服务
///
/// 先写临时文件再重命名，目录中不会出现写了一半的汇总。
pub struct SummaryWriter {
    file_name: String,
}

impl SummaryWriter {
    pub fn new() -> Self {
        Self {
            file_name: SUMMARY_FILE_NAME.to_string(),
        }
    }

    pub fn path_in(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.file_name)
    }

    /// 写入汇总，返回汇总文件路径
    pub async fn write(&self, summary: &BatchSummary, output_dir: &Path) -> AppResult<PathBuf> {
        fs::create_dir_all(output_dir)
            .await
            .map_err(|source| FileError::CreateDirFailed {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let path = self.path_in(output_dir);
        let json = serde_json::to_string_pretty(summary).map_err(|source| {
            FileError::SerializeFailed {
                path: path.clone(),
                source,
            }
        })?;

        let tmp_path = output_dir.join(format!("{}.tmp", self.file_name));
        fs::write(&tmp_path, json)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        debug!(
            "写入汇总: {} 个物品 -> {}",
            summary.listings.len(),
            path.display()
        );
        Ok(path)
    }
}

impl Default for SummaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_dir_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/out");

        let summary = BatchSummary::empty_with_notice("没有图片");
        let path = SummaryWriter::new().write(&summary, &output).await.unwrap();

        assert_eq!(path, output.join(SUMMARY_FILE_NAME));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["processed_images"], 0);
        assert_eq!(value["listings"], serde_json::json!([]));
        assert!(!output.join(format!("{SUMMARY_FILE_NAME}.tmp")).exists());
    }
}
