//! 通知值与发送渠道 trait 定义

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::color::Color;

/// 一条待发送的通知，直接交给传输层
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 聊天文本（已转义）
    pub text: String,
    /// 严重程度颜色
    pub color: Color,
}

impl Notification {
    /// 创建通知
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    /// 创建 good 颜色的通知
    pub fn good(text: impl Into<String>) -> Self {
        Self::new(text, Color::Good)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.color, self.text)
    }
}

/// 单个渠道的发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 被跳过（渠道过滤或 dry-run）
    Skipped(String),
    /// 发送失败
    Failed(String),
}

/// 通知渠道 trait
pub trait NotificationChannel: Send + Sync {
    /// 渠道名称（用于日志和配置）
    fn name(&self) -> &str;

    /// 检查是否应该发送此通知
    fn should_send(&self, notification: &Notification) -> bool;

    /// 同步发送通知
    fn send(&self, notification: &Notification) -> Result<SendResult>;
}
