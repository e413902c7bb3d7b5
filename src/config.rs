//! 运行配置
//!
//! 每次运行只加载一次，之后以 `Arc<Config>` 只读共享给所有组件。
//! 任意缺失的键都回落到内置默认值。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, ConfigError};
use crate::services::description_generator::TRUNCATION_MARKER;

/// 未指定 `--config` 时查找的默认配置文件
pub const DEFAULT_CONFIG_PATH: &str = "config/autopilot-config.json";

/// 程序配置文件
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub autopilot: AutopilotConfig,
    #[serde(alias = "image_cropper")]
    pub image_stage: ImageStageConfig,
    pub title_generator: TitleGeneratorConfig,
    pub description_generator: DescriptionGeneratorConfig,
}

/// 自动驾驶模式配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// 只影响日志措辞，不控制阶段是否执行
    pub enabled: bool,
    /// 同时处理的物品数量
    pub max_concurrent_items: usize,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent_items: 4,
        }
    }
}

/// 视觉服务实现
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionBackend {
    /// 固定检测结果，不读取像素
    #[default]
    Simulated,
    /// 使用 `image` crate 解码、检测并裁剪
    Raster,
}

/// 图片阶段配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageStageConfig {
    pub enabled: bool,
    pub backend: VisionBackend,
    pub padding_percent: f64,
    pub min_width: u32,
    pub min_height: u32,
    pub output_format: String,
    pub quality: u8,
}

impl Default for ImageStageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: VisionBackend::Simulated,
            padding_percent: 5.0,
            min_width: 800,
            min_height: 800,
            output_format: "jpg".to_string(),
            quality: 95,
        }
    }
}

/// 标题生成配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleGeneratorConfig {
    pub enabled: bool,
    pub max_length: usize,
    /// 第一个模板为当前使用的模板
    pub templates: Vec<String>,
    pub include_year: bool,
    pub include_condition: bool,
}

impl Default for TitleGeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_length: 80,
            templates: vec![
                "{year} {type} {denomination} {condition}".to_string(),
                "{type} {denomination} - {year} - {condition}".to_string(),
                "Vintage {year} {type} {denomination}".to_string(),
            ],
            include_year: true,
            include_condition: true,
        }
    }
}

/// 描述生成配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionGeneratorConfig {
    pub enabled: bool,
    pub include_history: bool,
    pub include_specifications: bool,
    pub include_story: bool,
    pub max_length: usize,
    pub sections: Vec<String>,
}

impl Default for DescriptionGeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_history: true,
            include_specifications: true,
            include_story: true,
            max_length: 5000,
            sections: [
                "overview",
                "specifications",
                "condition",
                "history",
                "value_proposition",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    /// 加载配置
    ///
    /// - 显式指定的路径必须存在且可解析，否则为致命错误
    /// - 未指定时尝试 [`DEFAULT_CONFIG_PATH`]，不存在则使用内置默认值
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    }
                    .into());
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("未找到配置文件，使用内置默认配置");
                    Self::default()
                }
            }
        };

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 从文件读取，按扩展名选择 JSON 或 TOML
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let config = if is_toml {
            toml::from_str(&content).map_err(|e| parse_error(path, e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| parse_error(path, e.to_string()))?
        };

        info!("✓ 已加载配置文件: {}", path.display());
        Ok(config)
    }

    /// 从 JSON 字符串解析
    pub fn from_json_str(content: &str) -> AppResult<Self> {
        serde_json::from_str(content).map_err(|e| parse_error(Path::new("<inline>"), e.to_string()))
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var("AUTOPILOT_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.autopilot.max_concurrent_items = n;
        }
        if let Some(enabled) = std::env::var("AUTOPILOT_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.autopilot.enabled = enabled;
        }
        self
    }

    /// 校验配置值
    pub fn validate(&self) -> AppResult<()> {
        let image = &self.image_stage;
        if !(1..=100).contains(&image.quality) {
            return Err(AppError::invalid_config(
                "image_stage.quality",
                format!("必须在 1-100 之间, 当前为 {}", image.quality),
            ));
        }
        if !(0.0..=100.0).contains(&image.padding_percent) {
            return Err(AppError::invalid_config(
                "image_stage.padding_percent",
                format!("必须在 0-100 之间, 当前为 {}", image.padding_percent),
            ));
        }
        if image.output_format.trim().is_empty() {
            return Err(AppError::invalid_config(
                "image_stage.output_format",
                "不能为空",
            ));
        }
        if self.title_generator.max_length == 0 {
            return Err(AppError::invalid_config(
                "title_generator.max_length",
                "必须大于 0",
            ));
        }
        let marker_len = TRUNCATION_MARKER.chars().count();
        if self.description_generator.max_length <= marker_len {
            return Err(AppError::invalid_config(
                "description_generator.max_length",
                format!("必须大于截断标记长度 {}", marker_len),
            ));
        }
        if self.autopilot.max_concurrent_items == 0 {
            return Err(AppError::invalid_config(
                "autopilot.max_concurrent_items",
                "必须至少为 1",
            ));
        }
        Ok(())
    }
}

fn parse_error(path: &Path, message: String) -> AppError {
    AppError::Config(ConfigError::Parse {
        path: PathBuf::from(path),
        message,
    })
}
