//! 命令行参数定义
//!
//! 每个机器人对应一个固定的子命令，未知命令由解析器直接拒绝。

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// 拍卖物品上架自动驾驶
#[derive(Debug, Parser)]
#[command(name = "listing-autopilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "根据物品图片自动生成裁剪图、标题和描述")]
pub struct Cli {
    /// 输出调试日志（RUST_LOG 优先）
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// 所有命令共用的输入输出参数
#[derive(Debug, Clone, Args)]
pub struct IoArgs {
    /// 输入图片或目录
    pub input: PathBuf,

    /// 输出文件或目录
    pub output: PathBuf,

    /// 配置文件路径（.json 或 .toml）
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 目录模式：处理输入目录下的所有图片
    #[arg(long)]
    pub batch: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 完整流程：裁剪 → 标题 → 描述，并写出汇总
    Run {
        #[command(flatten)]
        io: IoArgs,

        /// 元数据 JSON（物品名 → 属性）
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// 有物品失败时以非零状态退出
        #[arg(long)]
        strict: bool,
    },
    /// 只生成标题（JSON 输出）
    Title {
        #[command(flatten)]
        io: IoArgs,

        /// 输入为元数据 JSON，直接按元数据生成标题
        #[arg(long, conflicts_with = "batch")]
        from_metadata: bool,
    },
    /// 只生成描述（文本输出）
    Describe {
        #[command(flatten)]
        io: IoArgs,

        /// 元数据 JSON（物品名 → 属性）
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// 只裁剪图片
    Crop {
        #[command(flatten)]
        io: IoArgs,
    },
}

impl Command {
    pub fn io(&self) -> &IoArgs {
        match self {
            Command::Run { io, .. }
            | Command::Title { io, .. }
            | Command::Describe { io, .. }
            | Command::Crop { io } => io,
        }
    }
}
