//! 通知的严重程度颜色
//!
//! 聊天附件使用三种颜色之一：
//! - good: 成功，或没有已知问题
//! - warning: 不稳定、中止、未构建或未知
//! - danger: 失败

use serde::{Deserialize, Serialize};

use crate::build::BuildResult;

/// 颜色，按严重程度排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Good,
    Warning,
    Danger,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Color {
    /// 转换为字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Good => "good",
            Color::Warning => "warning",
            Color::Danger => "danger",
        }
    }

    /// `SUCCESS` 为 good，`FAILURE` 为 danger，其他（包括没有结果）为 warning
    pub fn of(result: Option<BuildResult>) -> Color {
        match result {
            Some(BuildResult::Success) => Color::Good,
            Some(BuildResult::Failure) => Color::Danger,
            _ => Color::Warning,
        }
    }
}

/// 检查颜色是否达到渠道的 `min_color` 阈值
pub fn color_meets_threshold(color: Color, min_color: Color) -> bool {
    color >= min_color
}
