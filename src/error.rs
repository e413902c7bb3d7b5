use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只有 `Config` 与 `Input` 会传播到命令行；
/// 单个物品的 `Stage` 错误在流程边界被捕获并记录到结果中。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（致命，批处理开始前中止）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输入错误（非致命，产生空汇总）
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 单个阶段失败
    #[error("阶段错误: {0}")]
    Stage(#[from] StageError),
    /// 文件写入错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 批处理被取消
    #[error("批处理已取消: 已完成 {completed} 个, 放弃 {abandoned} 个")]
    Cancelled { completed: usize, abandoned: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 指定的配置文件不存在
    #[error("配置文件不存在: {}", path.display())]
    NotFound { path: PathBuf },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 解析配置文件失败
    #[error("解析配置文件失败 ({}): {message}", path.display())]
    Parse { path: PathBuf, message: String },
    /// 配置值不合法
    #[error("配置项 {key} 不合法: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// 输入错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 输入路径不存在
    #[error("输入路径不存在: {}", path.display())]
    NotFound { path: PathBuf },
    /// 输入路径不是目录
    #[error("输入路径不是目录: {}", path.display())]
    NotADirectory { path: PathBuf },
    /// 目录中没有图片
    #[error("目录中没有可处理的图片: {}", path.display())]
    NoImages { path: PathBuf },
    /// 读取元数据文件失败
    #[error("读取元数据文件失败 ({}): {source}", path.display())]
    MetadataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 元数据 JSON 解析失败
    #[error("元数据解析失败 ({}): {source}", path.display())]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 单个物品的阶段错误
#[derive(Debug, Error)]
pub enum StageError {
    /// 图片阶段失败
    #[error("图片处理失败 ({}): {message}", path.display())]
    Image { path: PathBuf, message: String },
    /// 物品信息分析失败
    #[error("物品分析失败 ({item}): {message}")]
    Analysis { item: String, message: String },
    /// 描述写入失败
    #[error("描述保存失败 ({}): {source}", path.display())]
    Description {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 工作任务异常退出
    #[error("物品 {item} 的处理任务异常退出: {message}")]
    Task { item: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 创建目录失败
    #[error("创建目录失败 ({}): {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("序列化失败 ({}): {source}", path.display())]
    SerializeFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建配置项不合法错误
    pub fn invalid_config(key: &'static str, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::Invalid {
            key,
            reason: reason.into(),
        })
    }

    /// 是否为需要中止整个运行的致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::File(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
