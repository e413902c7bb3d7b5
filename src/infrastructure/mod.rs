//! 基础设施层
//!
//! 持有外部协作方（视觉服务、物品分析服务），只暴露能力。

pub mod item_info;
pub mod vision;

pub use item_info::{ItemInfoSource, MetadataOnly, SimulatedAnalyzer};
pub use vision::{BoundingBox, CropRequest, RasterVision, SimulatedVision, VisionError, VisionService};
