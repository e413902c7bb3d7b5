//! # Listing Autopilot
//!
//! 根据物品图片批量生成拍卖上架素材（裁剪图、标题、描述）的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部协作方，只暴露能力
//! - `VisionService` - 主体检测与裁剪（模拟 / 像素两种后端）
//! - `ItemInfoSource` - 物品属性分析（模拟分析 + 元数据覆盖）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个物品
//! - `template_resolver` - 占位符模板解析
//! - `TitleGenerator` - 标题生成
//! - `section_builder` / `DescriptionGenerator` - 分段描述生成
//! - `ImageStage` - 裁剪区域计算与写出
//! - `SummaryWriter` - 写批处理汇总
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个物品"的完整处理流程
//! - `ItemCtx` - 上下文封装（发现顺序 + 物品名 + 输出目录）
//! - `ListingFlow` - 状态机（裁剪 → 标题 → 描述）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理并发、重排与取消
//! - `orchestrator/item_processor` - 单个物品处理器
//!
//! ## 模块结构

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{BatchSummary, ItemAttributes, ItemResult};
pub use orchestrator::{process_item, BatchRunner};
pub use workflow::{ItemCtx, ListingFlow};
