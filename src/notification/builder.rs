//! 通知系统构建器 - 根据应用配置注册渠道

use super::channels::SlackChannel;
use super::dispatcher::NotificationDispatcher;
use crate::config::{AppConfig, SlackConfig};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// 通知系统构建器
pub struct NotificationBuilder {
    slack: Option<SlackConfig>,
    dry_run: bool,
}

impl NotificationBuilder {
    /// 创建空构建器（无渠道）
    pub fn new() -> Self {
        Self {
            slack: None,
            dry_run: false,
        }
    }

    /// 从应用配置创建
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new().slack(config.slack.clone())
    }

    /// 设置 Slack 配置
    pub fn slack(mut self, slack: Option<SlackConfig>) -> Self {
        self.slack = slack;
        self
    }

    /// 设置 dry-run 模式
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 构建分发器，注册所有配置完整的渠道
    pub fn build(self) -> Result<NotificationDispatcher> {
        let mut dispatcher = NotificationDispatcher::new().with_dry_run(self.dry_run);

        match self.slack {
            Some(slack) if !slack.webhook_url.is_empty() => {
                info!(channel = "slack", target = ?slack.channel, "Detected Slack webhook");
                dispatcher.register_channel(Arc::new(SlackChannel::new(slack)?));
            }
            _ => warn!("No Slack webhook configured, notifications will not be delivered"),
        }

        Ok(dispatcher)
    }
}

impl Default for NotificationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
