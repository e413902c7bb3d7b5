//! 物品处理上下文
//!
//! 封装"我正在处理第几个物品、产物写到哪里"这一信息

use std::fmt::Display;
use std::path::PathBuf;

use crate::models::listing::item_name_of;

/// 物品处理上下文
#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 发现顺序（从 0 开始）
    pub index: usize,

    /// 本次运行的物品总数（仅用于日志显示）
    pub total: usize,

    /// 物品名称（图片文件名 stem）
    pub item_name: String,

    /// 输入图片路径
    pub image_path: PathBuf,

    /// 产物输出目录
    pub output_dir: PathBuf,
}

impl ItemCtx {
    /// 创建新的物品上下文
    pub fn new(index: usize, total: usize, image_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            index,
            total,
            item_name: item_name_of(&image_path),
            image_path,
            output_dir,
        }
    }

    /// 描述文件路径
    pub fn description_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_description.txt", self.item_name))
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[物品 {}/{} {}]",
            self.index + 1,
            self.total,
            self.item_name
        )
    }
}
