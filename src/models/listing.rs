//! 单个物品结果与批处理汇总

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Image,
    Title,
    Description,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Image, Stage::Title, Stage::Description];

    /// 阶段序号（从 1 开始，仅用于日志）
    pub fn position(self) -> usize {
        match self {
            Stage::Image => 1,
            Stage::Title => 2,
            Stage::Description => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Image => "图片裁剪",
            Stage::Title => "标题生成",
            Stage::Description => "描述生成",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.position(), Stage::ALL.len(), self.label())
    }
}

/// 单个物品的流水线状态
///
/// `Pending → ImageStage → TitleStage → DescriptionStage → Done`，
/// 任意阶段都可以直接进入 `Failed`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipelineState {
    #[default]
    Pending,
    ImageStage,
    TitleStage,
    DescriptionStage,
    Done,
    Failed,
}

impl PipelineState {
    /// 正常推进到下一个状态；终止状态保持不变
    pub fn next(self) -> Self {
        match self {
            PipelineState::Pending => PipelineState::ImageStage,
            PipelineState::ImageStage => PipelineState::TitleStage,
            PipelineState::TitleStage => PipelineState::DescriptionStage,
            PipelineState::DescriptionStage => PipelineState::Done,
            PipelineState::Done => PipelineState::Done,
            PipelineState::Failed => PipelineState::Failed,
        }
    }

    /// 当前状态对应的阶段
    pub fn stage(self) -> Option<Stage> {
        match self {
            PipelineState::ImageStage => Some(Stage::Image),
            PipelineState::TitleStage => Some(Stage::Title),
            PipelineState::DescriptionStage => Some(Stage::Description),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// 各阶段产物
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingOutputs {
    /// 裁剪后图片路径（图片阶段关闭时为原图路径）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cropped_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// 描述文件路径，或描述阶段关闭时的占位文本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 单个物品的处理结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    pub image_path: String,
    pub item_name: String,
    pub success: bool,
    pub outputs: ListingOutputs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 发现顺序（从 0 开始）
    #[serde(skip)]
    pub index: usize,
    #[serde(skip)]
    pub state: PipelineState,
    /// 实际生成过产物的阶段
    #[serde(skip)]
    pub generated: Vec<Stage>,
}

impl ItemResult {
    pub fn new(image_path: &Path, index: usize) -> Self {
        Self {
            image_path: image_path.to_string_lossy().to_string(),
            item_name: item_name_of(image_path),
            success: false,
            outputs: ListingOutputs::default(),
            error: None,
            index,
            state: PipelineState::Pending,
            generated: Vec::new(),
        }
    }

    pub fn has_generated(&self, stage: Stage) -> bool {
        self.generated.contains(&stage)
    }
}

/// 物品名称取自文件名（不含扩展名）
pub fn item_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// 批处理汇总
///
/// 只由批处理器持有和修改，运行结束时写出一次。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    #[serde(rename = "processed_images")]
    pub processed_count: usize,
    #[serde(rename = "generated_titles")]
    pub titles_generated_count: usize,
    #[serde(rename = "generated_descriptions")]
    pub descriptions_generated_count: usize,
    #[serde(rename = "failed")]
    pub failed_count: usize,
    pub listings: Vec<ItemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 没有任何物品时的汇总
    pub fn empty_with_notice(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            ..Self::default()
        }
    }

    /// 记录一个物品结果并更新计数
    pub fn record(&mut self, result: ItemResult) {
        if result.success {
            self.processed_count += 1;
        } else {
            self.failed_count += 1;
        }
        if result.has_generated(Stage::Title) {
            self.titles_generated_count += 1;
        }
        if result.has_generated(Stage::Description) {
            self.descriptions_generated_count += 1;
        }
        self.listings.push(result);
    }

    /// 按发现顺序重新排列，保证输出确定
    pub fn sort_by_discovery(&mut self) {
        self.listings.sort_by_key(|item| item.index);
    }

    pub fn total(&self) -> usize {
        self.processed_count + self.failed_count
    }

    /// 成功率 = processed / (processed + failed)，分母为 0 时为 0
    pub fn success_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.processed_count as f64 / total as f64
        }
    }
}
