//! 物品信息来源 - 基础设施层
//!
//! 外部分析服务（图像识别、AI 分析等）的边界，只返回扁平属性表。

use std::path::Path;

use tracing::debug;

use crate::error::StageError;
use crate::models::attributes::ItemAttributes;

/// 物品信息来源
pub trait ItemInfoSource: Send + Sync {
    /// 分析物品并与调用方提供的元数据合并（元数据优先）
    fn analyze(
        &self,
        image: &Path,
        metadata: Option<&ItemAttributes>,
    ) -> Result<ItemAttributes, StageError>;
}

/// 模拟分析结果
pub const SIMULATED_ANALYSIS: [(&str, &str); 16] = [
    ("type", "Silver Coin"),
    ("denomination", "Dollar"),
    ("series", "Morgan"),
    ("year", "1921"),
    ("mint_mark", "S"),
    ("condition", "Fine"),
    ("rarity", "Common"),
    ("metal_content", "90% Silver, 10% Copper"),
    ("weight", "26.73 grams"),
    ("diameter", "38.1 mm"),
    ("designer", "George T. Morgan"),
    ("mintage", "21,695,000"),
    ("estimated_value", "$25-35"),
    (
        "historical_context",
        "The Morgan Dollar was minted from 1878-1904 and again in 1921.",
    ),
    (
        "story",
        "This coin represents a pivotal era in American numismatics.",
    ),
    (
        "investment_potential",
        "Silver content provides inherent value with collectible premium.",
    ),
];

/// 模拟分析器
///
/// 对任何图片返回同一组分析结果。
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedAnalyzer;

impl ItemInfoSource for SimulatedAnalyzer {
    fn analyze(
        &self,
        image: &Path,
        metadata: Option<&ItemAttributes>,
    ) -> Result<ItemAttributes, StageError> {
        debug!(
            "分析物品: {}",
            image.file_name().unwrap_or_default().to_string_lossy()
        );

        let mut info: ItemAttributes = SIMULATED_ANALYSIS.into_iter().collect();
        if let Some(metadata) = metadata {
            info.merge(metadata);
        }
        Ok(info)
    }
}

/// 只使用元数据的信息来源（不做任何分析）
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataOnly;

impl ItemInfoSource for MetadataOnly {
    fn analyze(
        &self,
        _image: &Path,
        metadata: Option<&ItemAttributes>,
    ) -> Result<ItemAttributes, StageError> {
        Ok(metadata.cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_metadata_uses_analysis() {
        let info = SimulatedAnalyzer
            .analyze(Path::new("coin_042.jpg"), None)
            .unwrap();
        assert_eq!(info.get("year"), Some("1921"));
        assert_eq!(info.get("designer"), Some("George T. Morgan"));
        assert_eq!(info.len(), SIMULATED_ANALYSIS.len());
    }

    #[test]
    fn test_metadata_wins() {
        let metadata: ItemAttributes = [("year", "1881"), ("grader", "NGC")].into_iter().collect();
        let info = SimulatedAnalyzer
            .analyze(Path::new("coin_001.jpg"), Some(&metadata))
            .unwrap();
        assert_eq!(info.get("year"), Some("1881"));
        assert_eq!(info.get("grader"), Some("NGC"));
        assert_eq!(info.get("type"), Some("Silver Coin"));
    }

    #[test]
    fn test_metadata_only_source() {
        let info = MetadataOnly.analyze(Path::new("x.jpg"), None).unwrap();
        assert!(info.is_empty());
    }
}
