//! 命令处理
//!
//! 每个子命令一个处理函数；配置只加载一次，以 `Arc<Config>` 只读共享。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cli::{Command, IoArgs};
use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{ItemInfoSource, MetadataOnly, SimulatedAnalyzer};
use crate::models::loaders::{discover_images, load_metadata, load_optional_metadata, MetadataIndex};
use crate::models::listing::item_name_of;
use crate::models::ItemAttributes;
use crate::orchestrator::{process_item_with_config, BatchRunner};
use crate::services::{DescriptionGenerator, ImageStage, TitleGenerator};

/// 命令执行结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub processed: usize,
    pub failed: usize,
    /// 有失败时是否应以非零状态退出
    pub strict: bool,
}

impl Outcome {
    pub fn should_fail(&self) -> bool {
        self.strict && self.failed > 0
    }
}

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    cancel: watch::Receiver<bool>,
}

impl App {
    /// 加载配置并初始化应用
    pub fn initialize(io: &IoArgs, cancel: watch::Receiver<bool>) -> Result<Self> {
        let config = Config::load(io.config.as_deref()).context("加载配置失败")?;
        Ok(Self {
            config: Arc::new(config),
            cancel,
        })
    }

    pub fn with_config(config: Config, cancel: watch::Receiver<bool>) -> Self {
        Self {
            config: Arc::new(config),
            cancel,
        }
    }

    /// 执行子命令
    pub async fn execute(&self, command: &Command) -> Result<Outcome> {
        match command {
            Command::Run {
                io,
                metadata,
                strict,
            } => {
                let mut outcome = self.run_pipeline(io, metadata.as_deref()).await?;
                outcome.strict = *strict;
                Ok(outcome)
            }
            Command::Title { io, from_metadata } => {
                if *from_metadata {
                    self.titles_from_metadata(io).await
                } else {
                    self.titles(io).await
                }
            }
            Command::Describe { io, metadata } => self.describe(io, metadata.as_deref()).await,
            Command::Crop { io } => self.crop(io).await,
        }
    }

    /// 完整流程
    async fn run_pipeline(&self, io: &IoArgs, metadata: Option<&Path>) -> Result<Outcome> {
        if io.batch {
            let summary = BatchRunner::new(self.config.clone())
                .with_cancel(self.cancel.clone())
                .run(&io.input, &io.output, metadata)
                .await?;
            return Ok(Outcome {
                processed: summary.processed_count,
                failed: summary.failed_count,
                strict: false,
            });
        }

        let result =
            match process_item_with_config(&self.config, &io.input, &io.output, metadata).await {
                Ok(result) => result,
                Err(AppError::Input(e)) => {
                    warn!("⚠️ {}", e);
                    return Ok(Outcome::default());
                }
                Err(e) => return Err(e.into()),
            };

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(Outcome {
            processed: usize::from(result.success),
            failed: usize::from(!result.success),
            strict: false,
        })
    }

    /// 根据图片生成标题
    async fn titles(&self, io: &IoArgs) -> Result<Outcome> {
        let generator = TitleGenerator::new(&self.config);
        let analyzer = SimulatedAnalyzer;
        let mut outcome = Outcome::default();

        if !io.batch {
            let attrs = analyzer.analyze(&io.input, None)?;
            let title = generator.generate(&attrs);
            println!("{}", title);

            let mut titles = BTreeMap::new();
            titles.insert(io.input.display().to_string(), title);
            write_json(&io.output, &titles).await?;
            outcome.processed = 1;
            return Ok(outcome);
        }

        let mut titles = BTreeMap::new();
        for image in self.images_or_empty(&io.input).await {
            let name = file_name_of(&image);
            match analyzer.analyze(&image, None) {
                Ok(attrs) => {
                    let title = generator.generate(&attrs);
                    info!("[{}] ✓ 标题: {}", name, title);
                    titles.insert(name, title);
                    outcome.processed += 1;
                }
                Err(e) => {
                    error!("[{}] ✗ 标题生成失败: {}", name, e);
                    outcome.failed += 1;
                }
            }
        }

        write_json(&io.output, &titles).await?;
        info!(
            "✅ 标题生成完成: {} 个, 已保存至 {}",
            generator.generated_count(),
            io.output.display()
        );
        Ok(outcome)
    }

    /// 直接按元数据生成标题，不做图片分析
    async fn titles_from_metadata(&self, io: &IoArgs) -> Result<Outcome> {
        let generator = TitleGenerator::new(&self.config);
        let metadata = load_metadata(&io.input).await?;
        let mut outcome = Outcome::default();

        let mut titles = BTreeMap::new();
        for (item_id, attrs) in sorted(&metadata) {
            match MetadataOnly.analyze(&io.input, Some(attrs)) {
                Ok(attrs) => {
                    let title = generator.generate(&attrs);
                    info!("[{}] ✓ 标题: {}", item_id, title);
                    titles.insert(item_id.clone(), title);
                    outcome.processed += 1;
                }
                Err(e) => {
                    error!("[{}] ✗ 标题生成失败: {}", item_id, e);
                    outcome.failed += 1;
                }
            }
        }

        write_json(&io.output, &titles).await?;
        info!("✅ 已保存 {} 个标题至 {}", titles.len(), io.output.display());
        Ok(outcome)
    }

    /// 生成描述文本文件
    async fn describe(&self, io: &IoArgs, metadata: Option<&Path>) -> Result<Outcome> {
        let generator = DescriptionGenerator::new(&self.config);
        let metadata = load_optional_metadata(metadata).await?;
        let mut outcome = Outcome::default();

        let jobs: Vec<(PathBuf, PathBuf)> = if io.batch {
            self.images_or_empty(&io.input)
                .await
                .into_iter()
                .map(|image| {
                    let output = io
                        .output
                        .join(format!("{}_description.txt", item_name_of(&image)));
                    (image, output)
                })
                .collect()
        } else {
            vec![(io.input.clone(), io.output.clone())]
        };

        for (image, output) in jobs {
            let name = item_name_of(&image);
            let description = match SimulatedAnalyzer.analyze(&image, metadata.get(&name)) {
                Ok(attrs) => generator.generate(&attrs),
                Err(e) => {
                    error!("[{}] ✗ 描述生成失败: {}", name, e);
                    outcome.failed += 1;
                    continue;
                }
            };

            write_text(&output, &description).await?;
            info!(
                "[{}] ✓ 描述已保存: {} ({} 字符)",
                name,
                output.display(),
                description.chars().count()
            );
            if !io.batch {
                println!("{}", description);
            }
            outcome.processed += 1;
        }

        Ok(outcome)
    }

    /// 裁剪图片
    async fn crop(&self, io: &IoArgs) -> Result<Outcome> {
        let stage = ImageStage::from_config(&self.config.image_stage);
        let mut outcome = Outcome::default();

        if !stage.is_enabled() {
            warn!("⚠️ 图片裁剪已在配置中关闭, 跳过");
            return Ok(outcome);
        }

        let jobs: Vec<(PathBuf, PathBuf)> = if io.batch {
            fs::create_dir_all(&io.output)
                .await
                .with_context(|| format!("创建输出目录失败: {}", io.output.display()))?;
            self.images_or_empty(&io.input)
                .await
                .into_iter()
                .map(|image| {
                    let output = stage.output_path(&io.output, &item_name_of(&image));
                    (image, output)
                })
                .collect()
        } else {
            vec![(io.input.clone(), io.output.clone())]
        };

        for (image, output) in jobs {
            match stage.process_async(image.clone(), output).await {
                Ok(path) => {
                    info!("[{}] ✓ 已裁剪: {}", file_name_of(&image), path.display());
                    outcome.processed += 1;
                }
                Err(e) => {
                    error!("[{}] ✗ {}", file_name_of(&image), e);
                    outcome.failed += 1;
                }
            }
        }

        info!("✅ 裁剪完成: 成功 {}, 失败 {}", outcome.processed, outcome.failed);
        Ok(outcome)
    }

    /// 列出输入目录中的图片；目录缺失或为空时只给出警告
    async fn images_or_empty(&self, input: &Path) -> Vec<PathBuf> {
        match discover_images(input).await {
            Ok(images) => {
                if images.is_empty() {
                    warn!("⚠️ 目录中没有可处理的图片: {}", input.display());
                } else {
                    info!("✓ 找到 {} 张图片", images.len());
                }
                images
            }
            Err(e) => {
                warn!("⚠️ {}", e);
                Vec::new()
            }
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn sorted(metadata: &MetadataIndex) -> Vec<(&String, &ItemAttributes)> {
    let mut items: Vec<_> = metadata.iter().collect();
    items.sort_by(|a, b| a.0.cmp(b.0));
    items
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("创建目录失败: {}", parent.display()))?;
    }
    Ok(())
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path).await?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .await
        .with_context(|| format!("写入文件失败: {}", path.display()))
}

async fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent(path).await?;
    fs::write(path, text)
        .await
        .with_context(|| format!("写入文件失败: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let (_tx, rx) = watch::channel(false);
        App::with_config(Config::default(), rx)
    }

    fn io(input: &Path, output: &Path, batch: bool) -> IoArgs {
        IoArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            config: None,
            batch,
        }
    }

    #[test]
    fn test_strict_outcome() {
        let outcome = Outcome {
            processed: 2,
            failed: 1,
            strict: true,
        };
        assert!(outcome.should_fail());
        assert!(!Outcome { strict: false, ..outcome }.should_fail());
        assert!(!Outcome { failed: 0, ..outcome }.should_fail());
    }

    #[tokio::test]
    async fn test_titles_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = dir.path().join("items.json");
        std::fs::write(
            &metadata,
            r#"{"b": {"year": 1899, "type": "Silver Coin", "denomination": "Dollar", "condition": "Fine"}, "a": {"type": "Token"}}"#,
        )
        .unwrap();
        let output = dir.path().join("titles.json");

        let outcome = app()
            .execute(&Command::Title {
                io: io(&metadata, &output, false),
                from_metadata: true,
            })
            .await
            .unwrap();

        assert_eq!(outcome.processed, 2);
        let titles: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(titles["b"], "1899 Silver Coin Dollar Fine");
        assert_eq!(titles["a"], "1921 Token Dollar Fine");
    }

    #[tokio::test]
    async fn test_batch_titles_keyed_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("coin_1.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("coin_2.png"), b"x").unwrap();
        let output = dir.path().join("out/titles.json");

        app()
            .execute(&Command::Title {
                io: io(dir.path(), &output, true),
                from_metadata: false,
            })
            .await
            .unwrap();

        let titles: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            titles.keys().collect::<Vec<_>>(),
            ["coin_1.jpg", "coin_2.png"]
        );
    }

    #[tokio::test]
    async fn test_describe_batch_writes_text_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("coin_9.jpg"), b"x").unwrap();

        let outcome = app()
            .execute(&Command::Describe {
                io: io(input.path(), output.path(), true),
                metadata: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.processed, 1);
        let text = std::fs::read_to_string(output.path().join("coin_9_description.txt")).unwrap();
        assert!(text.contains("Listing generated on:"));
    }

    #[tokio::test]
    async fn test_crop_batch_counts_missing_directory_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = app()
            .execute(&Command::Crop {
                io: io(&dir.path().join("nope"), &dir.path().join("out"), true),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::default());
    }

    #[tokio::test]
    async fn test_run_single_missing_image_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = app()
            .execute(&Command::Run {
                io: io(&dir.path().join("ghost.jpg"), dir.path(), false),
                metadata: None,
                strict: true,
            })
            .await
            .unwrap();
        assert!(!outcome.should_fail());
    }
}
