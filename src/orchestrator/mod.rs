//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量物品处理器
//! - 扫描输入目录、加载元数据
//! - 控制并发数量（Semaphore）
//! - 汇总、重排并写出批处理结果
//! - 响应取消信号
//!
//! ### `item_processor` - 单个物品处理器
//! - 非批处理模式下处理一张图片
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor / item_processor
//!     ↓
//! workflow::ListingFlow (处理单个物品)
//!     ↓
//! services (能力层：image_stage / title / description / summary)
//!     ↓
//! infrastructure (外部协作方：vision / item_info)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，item_processor 管单个
//! 2. **向下依赖**：编排层 → workflow → services → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;
pub mod item_processor;

// 重新导出主要类型
pub use batch_processor::BatchRunner;
pub use item_processor::{process_item, process_item_with_config};
