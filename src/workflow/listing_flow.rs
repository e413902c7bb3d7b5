//! 物品处理流程 - 流程层
//!
//! 核心职责：定义"一个物品"的完整处理流程
//!
//! 流程顺序：
//! 1. 图片裁剪
//! 2. 标题生成
//! 3. 描述生成并写入文件
//!
//! 每个阶段可以单独关闭；任一阶段失败则该物品直接进入 `Failed`，
//! 剩余阶段不再执行，但不影响其他物品。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tracing::{error, info};

use crate::config::Config;
use crate::error::StageError;
use crate::infrastructure::{ItemInfoSource, SimulatedAnalyzer, VisionService};
use crate::models::attributes::ItemAttributes;
use crate::models::listing::{ItemResult, PipelineState, Stage};
use crate::services::description_generator::DISABLED_DESCRIPTION;
use crate::services::title_generator::UNTITLED_LISTING;
use crate::services::{DescriptionGenerator, ImageStage, TitleGenerator};
use crate::utils::logging::truncate_text;
use crate::workflow::item_ctx::ItemCtx;

/// 物品处理流程
///
/// - 编排单个物品的三个阶段
/// - 不持有批处理状态，可在多个工作任务间共享
/// - 只依赖业务能力（services）与外部信息来源
pub struct ListingFlow {
    image_stage: ImageStage,
    title_generator: TitleGenerator,
    description_generator: DescriptionGenerator,
    info_source: Arc<dyn ItemInfoSource>,
}

/// 单次运行中逐步积累的中间数据
struct FlowState<'a> {
    metadata: Option<&'a ItemAttributes>,
    working_image: PathBuf,
    attrs: Option<ItemAttributes>,
}

impl ListingFlow {
    /// 按配置创建（视觉后端由配置决定，使用模拟分析器）
    pub fn new(config: &Config) -> Self {
        Self {
            image_stage: ImageStage::from_config(&config.image_stage),
            title_generator: TitleGenerator::new(config),
            description_generator: DescriptionGenerator::new(config),
            info_source: Arc::new(SimulatedAnalyzer),
        }
    }

    /// 注入外部协作方
    pub fn with_services(
        config: &Config,
        vision: Arc<dyn VisionService>,
        info_source: Arc<dyn ItemInfoSource>,
    ) -> Self {
        Self {
            image_stage: ImageStage::new(&config.image_stage, vision),
            title_generator: TitleGenerator::new(config),
            description_generator: DescriptionGenerator::new(config),
            info_source,
        }
    }

    pub fn title_generator(&self) -> &TitleGenerator {
        &self.title_generator
    }

    pub fn description_generator(&self) -> &DescriptionGenerator {
        &self.description_generator
    }

    /// 处理单个物品，永远返回结果（失败记录在结果中）
    pub async fn run(&self, ctx: &ItemCtx, metadata: Option<&ItemAttributes>) -> ItemResult {
        let mut result = ItemResult::new(&ctx.image_path, ctx.index);
        let mut flow = FlowState {
            metadata,
            working_image: ctx.image_path.clone(),
            attrs: None,
        };

        loop {
            result.state = result.state.next();
            let Some(stage) = result.state.stage() else {
                break;
            };

            if let Err(e) = self.run_stage(stage, ctx, &mut flow, &mut result).await {
                error!("{} ✗ {} 失败: {}", ctx, stage.label(), e);
                result.state = PipelineState::Failed;
                result.error = Some(e.to_string());
                return result;
            }
        }

        result.success = true;
        result
    }

    async fn run_stage(
        &self,
        stage: Stage,
        ctx: &ItemCtx,
        flow: &mut FlowState<'_>,
        result: &mut ItemResult,
    ) -> Result<(), StageError> {
        match stage {
            Stage::Image => self.image_step(ctx, flow, result).await,
            Stage::Title => self.title_step(ctx, flow, result),
            Stage::Description => self.description_step(ctx, flow, result).await,
        }
    }

    async fn image_step(
        &self,
        ctx: &ItemCtx,
        flow: &mut FlowState<'_>,
        result: &mut ItemResult,
    ) -> Result<(), StageError> {
        if !self.image_stage.is_enabled() {
            info!("{} {} 已关闭, 使用原图", ctx, Stage::Image);
            result.outputs.cropped_image = Some(ctx.image_path.to_string_lossy().to_string());
            return Ok(());
        }

        info!("{} {} ...", ctx, Stage::Image);
        let output = self.image_stage.output_path(&ctx.output_dir, &ctx.item_name);
        let cropped = self
            .image_stage
            .process_async(ctx.image_path.clone(), output)
            .await?;

        info!("{} ✓ 图片已处理: {}", ctx, cropped.display());
        result.outputs.cropped_image = Some(cropped.to_string_lossy().to_string());
        result.generated.push(Stage::Image);
        flow.working_image = cropped;
        Ok(())
    }

    fn title_step(
        &self,
        ctx: &ItemCtx,
        flow: &mut FlowState<'_>,
        result: &mut ItemResult,
    ) -> Result<(), StageError> {
        if !self.title_generator.is_enabled() {
            info!("{} {} 已关闭", ctx, Stage::Title);
            result.outputs.title = Some(UNTITLED_LISTING.to_string());
            return Ok(());
        }

        info!("{} {} ...", ctx, Stage::Title);
        let title = self.title_generator.generate(self.attributes(ctx, flow)?);

        info!("{} ✓ 标题: {}", ctx, title);
        result.outputs.title = Some(title);
        result.generated.push(Stage::Title);
        Ok(())
    }

    async fn description_step(
        &self,
        ctx: &ItemCtx,
        flow: &mut FlowState<'_>,
        result: &mut ItemResult,
    ) -> Result<(), StageError> {
        if !self.description_generator.is_enabled() {
            info!("{} {} 已关闭", ctx, Stage::Description);
            result.outputs.description = Some(DISABLED_DESCRIPTION.to_string());
            return Ok(());
        }

        info!("{} {} ...", ctx, Stage::Description);
        let description = self
            .description_generator
            .generate(self.attributes(ctx, flow)?);

        let path = ctx.description_path();
        fs::write(&path, &description)
            .await
            .map_err(|source| StageError::Description {
                path: path.clone(),
                source,
            })?;

        info!(
            "{} ✓ 描述已保存: {} ({} 字符)",
            ctx,
            path.display(),
            description.chars().count()
        );
        tracing::debug!("{} 描述预览: {}", ctx, truncate_text(&description, 80));
        result.outputs.description = Some(path.to_string_lossy().to_string());
        result.generated.push(Stage::Description);
        Ok(())
    }

    /// 获取物品属性（首次需要时分析，之后复用）
    fn attributes<'f>(
        &self,
        ctx: &ItemCtx,
        flow: &'f mut FlowState<'_>,
    ) -> Result<&'f ItemAttributes, StageError> {
        if flow.attrs.is_none() {
            let attrs = self
                .info_source
                .analyze(&flow.working_image, flow.metadata)?;
            tracing::debug!("{} 物品属性: {} 项", ctx, attrs.len());
            flow.attrs = Some(attrs);
        }
        flow.attrs.as_ref().ok_or_else(|| StageError::Analysis {
            item: ctx.item_name.clone(),
            message: "属性缺失".to_string(),
        })
    }
}
