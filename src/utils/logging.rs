/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::path::Path;

use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

use crate::models::listing::BatchSummary;

/// 初始化日志订阅器
///
/// 过滤规则取自 `RUST_LOG`，未设置时默认 `info`（`verbose` 时为 `debug`）。
/// 重复调用不会报错。
pub fn init(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `autopilot`: 是否为自动驾驶模式（只影响提示文字）
/// - `max_concurrent`: 最大并发数
pub fn log_startup(autopilot: bool, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    if autopilot {
        info!("🚀 程序启动 - 自动驾驶批处理模式");
    } else {
        info!("🚀 程序启动 - 批处理模式（自动驾驶已关闭）");
    }
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录图片扫描结果
pub fn log_items_found(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 张待处理的图片", total);
    info!("📋 最多同时处理 {} 个物品", max_concurrent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 批处理汇总
/// - `summary_path`: 汇总文件路径
pub fn print_final_stats(summary: &BatchSummary, summary_path: &Path) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.processed_count, summary.total());
    info!("❌ 失败: {}", summary.failed_count);
    info!("📝 标题: {}", summary.titles_generated_count);
    info!("📄 描述: {}", summary.descriptions_generated_count);
    info!("📈 成功率: {:.1}%", summary.success_rate() * 100.0);
    info!("{}", "=".repeat(60));
    info!("汇总已保存至: {}", summary_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("银币描述很长", 2), "银币...");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
