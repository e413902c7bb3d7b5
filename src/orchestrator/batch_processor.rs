//! 批量物品处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **扫描输入**：列出输入目录下所有支持的图片
//! 2. **加载元数据**：按物品名提供属性覆盖
//! 3. **并发控制**：使用 Semaphore 限制同时处理的物品数量
//! 4. **结果汇总**：按完成顺序收集结果，写出前按发现顺序重排
//! 5. **取消**：收到取消信号后不再启动新物品，已开始的物品继续完成，不写汇总
//!
//! 单个物品的失败只记录在汇总中，不会中断批处理。

use std::path::Path;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::fs;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, FileError, InputError, StageError};
use crate::models::listing::{BatchSummary, ItemResult, PipelineState};
use crate::models::loaders::{discover_images, load_optional_metadata};
use crate::services::SummaryWriter;
use crate::utils::logging::{log_items_found, log_startup, print_final_stats};
use crate::workflow::{ItemCtx, ListingFlow};

/// 批量处理器
pub struct BatchRunner {
    config: Arc<Config>,
    flow: Arc<ListingFlow>,
    writer: SummaryWriter,
    cancel: Option<watch::Receiver<bool>>,
}

impl BatchRunner {
    /// 使用默认协作方创建
    pub fn new(config: Arc<Config>) -> Self {
        let flow = ListingFlow::new(&config);
        Self::with_flow(config, flow)
    }

    /// 使用指定的物品流程创建
    pub fn with_flow(config: Arc<Config>, flow: ListingFlow) -> Self {
        Self {
            config,
            flow: Arc::new(flow),
            writer: SummaryWriter::new(),
            cancel: None,
        }
    }

    /// 绑定取消信号（值变为 `true` 即取消）
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 处理整个目录，返回（并写出）批处理汇总
    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        metadata_file: Option<&Path>,
    ) -> AppResult<BatchSummary> {
        let max_concurrent = self.config.autopilot.max_concurrent_items.max(1);
        log_startup(self.config.autopilot.enabled, max_concurrent);
        info!("📁 输入目录: {}", input_dir.display());
        info!("📁 输出目录: {}", output_dir.display());

        let images = match discover_images(input_dir).await {
            Ok(images) if images.is_empty() => {
                let notice = InputError::NoImages {
                    path: input_dir.to_path_buf(),
                }
                .to_string();
                return self.finish_empty(notice, output_dir).await;
            }
            Ok(images) => images,
            Err(e) => return self.finish_empty(e.to_string(), output_dir).await,
        };

        let metadata = Arc::new(load_optional_metadata(metadata_file).await?);
        fs::create_dir_all(output_dir)
            .await
            .map_err(|source| FileError::CreateDirFailed {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let total = images.len();
        log_items_found(total, max_concurrent);

        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut pending = FuturesUnordered::new();
        let mut abandoned = 0;

        for (index, image_path) in images.into_iter().enumerate() {
            if self.is_cancelled() {
                abandoned = total - index;
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| StageError::Task {
                    item: image_path.display().to_string(),
                    message: e.to_string(),
                })?;
            if self.is_cancelled() {
                abandoned = total - index;
                break;
            }

            let ctx = ItemCtx::new(index, total, image_path.clone(), output_dir.to_path_buf());
            let flow = self.flow.clone();
            let metadata = metadata.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                flow.run(&ctx, metadata.get(&ctx.item_name)).await
            });
            pending.push(handle.map(move |joined| (index, image_path, joined)));
        }

        let mut summary = BatchSummary::new();
        while let Some((index, image_path, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("[物品 {}/{}] 任务执行失败: {}", index + 1, total, e);
                    crashed_result(&image_path, index, &e.to_string())
                }
            };
            summary.record(result);
        }

        if abandoned > 0 {
            warn!(
                "⚠️ 已取消: 完成 {} 个物品, 放弃 {} 个, 不写出汇总",
                summary.total(),
                abandoned
            );
            return Err(AppError::Cancelled {
                completed: summary.total(),
                abandoned,
            });
        }

        summary.sort_by_discovery();
        let summary_path = self.writer.write(&summary, output_dir).await?;
        print_final_stats(&summary, &summary_path);
        Ok(summary)
    }

    async fn finish_empty(&self, notice: String, output_dir: &Path) -> AppResult<BatchSummary> {
        warn!("⚠️ {}", notice);
        let summary = BatchSummary::empty_with_notice(notice);
        let summary_path = self.writer.write(&summary, output_dir).await?;
        print_final_stats(&summary, &summary_path);
        Ok(summary)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }
}

/// 任务异常退出（panic）时的物品结果
fn crashed_result(image_path: &Path, index: usize, message: &str) -> ItemResult {
    let mut result = ItemResult::new(image_path, index);
    result.state = PipelineState::Failed;
    result.error = Some(format!("任务执行失败: {}", message));
    result
}
