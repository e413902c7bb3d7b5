//! 描述生成服务 - 业务能力层
//!
//! 按配置的段落顺序拼接描述，追加页脚并限制总长度。

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Local, NaiveDate};
use tracing::debug;

use crate::config::{Config, DescriptionGeneratorConfig};
use crate::models::attributes::ItemAttributes;
use crate::services::section_builder;

/// 描述生成关闭时的占位文本
pub const DISABLED_DESCRIPTION: &str = "No description available.";

/// 截断标记
pub const TRUNCATION_MARKER: &str = "\n...\n[Description truncated]";

const FOOTER_RULE_WIDTH: usize = 60;

/// 描述生成服务
pub struct DescriptionGenerator {
    config: DescriptionGeneratorConfig,
    generated_count: AtomicUsize,
}

impl DescriptionGenerator {
    /// 创建新的描述生成服务
    pub fn new(config: &Config) -> Self {
        Self::with_config(config.description_generator.clone())
    }

    pub fn with_config(config: DescriptionGeneratorConfig) -> Self {
        Self {
            config,
            generated_count: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// 生成描述（页脚使用当天日期）
    pub fn generate(&self, attrs: &ItemAttributes) -> String {
        self.generate_at(attrs, Local::now().date_naive())
    }

    /// 生成描述，页脚使用指定日期
    pub fn generate_at(&self, attrs: &ItemAttributes, date: NaiveDate) -> String {
        if !self.is_enabled() {
            return DISABLED_DESCRIPTION.to_string();
        }

        let body = self
            .config
            .sections
            .iter()
            .map(|name| section_builder::build_named(name, attrs, &self.config))
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let footer = footer(date);
        let description = if body.is_empty() {
            footer
        } else {
            format!("{}\n\n{}", body, footer)
        };

        let description = truncate_description(&description, self.config.max_length);
        debug!("描述长度: {} 字符", description.chars().count());

        self.generated_count.fetch_add(1, Ordering::Relaxed);
        description
    }

    /// 已生成的描述数量
    pub fn generated_count(&self) -> usize {
        self.generated_count.load(Ordering::Relaxed)
    }
}

fn footer(date: NaiveDate) -> String {
    let rule = "=".repeat(FOOTER_RULE_WIDTH);
    format!(
        "{rule}\nListing generated on: {}\nQuestions? Feel free to contact us for more information.\n{rule}",
        date.format("%Y-%m-%d")
    )
}

/// 超长时截断内容并追加截断标记，结果（按字符计）不超过 `max_length`
pub fn truncate_description(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_length <= marker_len {
        return TRUNCATION_MARKER.chars().take(max_length).collect();
    }

    let mut out: String = text.chars().take(max_length - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
