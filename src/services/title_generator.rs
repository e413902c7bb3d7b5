//! 标题生成服务 - 业务能力层
//!
//! 只负责"生成一行标题"能力，不关心流程

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::config::{Config, TitleGeneratorConfig};
use crate::models::attributes::ItemAttributes;
use crate::services::template_resolver;

/// 标题生成关闭时的固定标题
pub const UNTITLED_LISTING: &str = "Untitled Listing";

/// 模板列表为空时使用的模板
pub const DEFAULT_TITLE_TEMPLATE: &str = "{year} {type} {denomination} {condition}";

/// 标题生成服务
///
/// 职责：
/// - 选择当前模板（模板列表中的第一个）
/// - 委托模板解析并按 `max_length` 截断
/// - 统计生成数量
pub struct TitleGenerator {
    config: TitleGeneratorConfig,
    generated_count: AtomicUsize,
}

impl TitleGenerator {
    /// 创建新的标题生成服务
    pub fn new(config: &Config) -> Self {
        Self::with_config(config.title_generator.clone())
    }

    pub fn with_config(config: TitleGeneratorConfig) -> Self {
        Self {
            config,
            generated_count: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 当前使用的模板
    pub fn active_template(&self) -> &str {
        self.config
            .templates
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_TITLE_TEMPLATE)
    }

    /// 生成标题
    pub fn generate(&self, attrs: &ItemAttributes) -> String {
        if !self.is_enabled() {
            return UNTITLED_LISTING.to_string();
        }

        let title =
            template_resolver::resolve(self.active_template(), attrs, self.config.max_length);
        debug!("标题模板 {:?} -> {:?}", self.active_template(), title);

        self.generated_count.fetch_add(1, Ordering::Relaxed);
        title
    }

    /// 已生成的标题数量
    pub fn generated_count(&self) -> usize {
        self.generated_count.load(Ordering::Relaxed)
    }
}
