//! 通知分发器 - 把一条构建通知分发到所有已配置的渠道

use super::channel::{Notification, NotificationChannel, SendResult};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单个渠道的发送记录
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// 渠道名称
    pub channel: String,
    /// 发送结果
    pub result: SendResult,
}

impl Delivery {
    fn new(channel: &str, result: SendResult) -> Self {
        Self {
            channel: channel.to_string(),
            result,
        }
    }
}

/// 通知分发器 - 持有已注册的渠道，按注册顺序发送
#[derive(Default)]
pub struct NotificationDispatcher {
    /// 所有注册的渠道
    channels: Vec<Arc<dyn NotificationChannel>>,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl NotificationDispatcher {
    /// 创建新的分发器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 dry-run 模式：只记录日志，不实际发送
    pub fn with_dry_run(self, dry_run: bool) -> Self {
        Self { dry_run, ..self }
    }

    /// 注册渠道
    pub fn register_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        info!(channel = channel.name(), "Channel registered");
        self.channels.push(channel);
    }

    /// 发送到所有渠道
    ///
    /// 单个渠道的传输错误记为 `Failed`，不影响其余渠道。
    pub fn send(&self, notification: &Notification) -> Result<Vec<Delivery>> {
        let deliveries = self
            .channels
            .iter()
            .map(|channel| self.deliver(channel.as_ref(), notification))
            .collect();
        Ok(deliveries)
    }

    /// 渠道过滤 -> dry-run -> 实际发送
    fn deliver(&self, channel: &dyn NotificationChannel, notification: &Notification) -> Delivery {
        let name = channel.name();

        if !channel.should_send(notification) {
            debug!(channel = name, color = %notification.color, "Filtered by channel");
            let reason = format!("{} filtered", notification.color);
            return Delivery::new(name, SendResult::Skipped(reason));
        }

        if self.dry_run {
            info!(
                channel = name,
                color = %notification.color,
                "[DRY-RUN] Would post build notification"
            );
            return Delivery::new(name, SendResult::Skipped("dry-run".to_string()));
        }

        let result = channel.send(notification).unwrap_or_else(|e| {
            warn!(channel = name, error = %e, "Build notification not delivered");
            SendResult::Failed(e.to_string())
        });
        Delivery::new(name, result)
    }

    /// 已注册渠道数量
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// 已注册渠道名称
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }
}
