//! 应用配置
//!
//! 从 `~/.config/build-notify/config.json`（或指定路径）加载。
//! 文件不存在时使用默认值；Slack webhook 也可以来自
//! `BUILD_NOTIFY_SLACK_WEBHOOK_URL` / `BUILD_NOTIFY_SLACK_CHANNEL`。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::notification::color::Color;
use crate::policy::Policy;

pub const ENV_WEBHOOK_URL: &str = "BUILD_NOTIFY_SLACK_WEBHOOK_URL";
pub const ENV_CHANNEL: &str = "BUILD_NOTIFY_SLACK_CHANNEL";

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub policy: Policy,
    pub slack: Option<SlackConfig>,
}

/// Slack webhook 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub webhook_url: String,
    /// 覆盖 webhook 的默认频道
    pub channel: Option<String>,
    pub username: Option<String>,
    pub timeout_secs: u64,
    /// 该渠道仍会发送的最低颜色
    pub min_color: Color,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            channel: None,
            username: None,
            timeout_secs: 30,
            min_color: Color::Good,
        }
    }
}

impl AppConfig {
    /// 默认路径，没有 home 目录时为 `None`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/build-notify/config.json"))
    }

    /// 从 `path`（或默认路径）加载并应用环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(&p)?,
            Some(p) => {
                debug!(path = %p.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(
            std::env::var(ENV_WEBHOOK_URL).ok(),
            std::env::var(ENV_CHANNEL).ok(),
        );
        Ok(config)
    }

    /// 从文件加载，格式错误时报错
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn apply_env_overrides(&mut self, webhook_url: Option<String>, channel: Option<String>) {
        if let Some(url) = webhook_url.filter(|u| !u.is_empty()) {
            debug!("Using Slack webhook from {}", ENV_WEBHOOK_URL);
            self.slack.get_or_insert_with(SlackConfig::default).webhook_url = url;
        }
        if let Some(channel) = channel.filter(|c| !c.is_empty()) {
            if let Some(slack) = self.slack.as_mut() {
                slack.channel = Some(channel);
            }
        }
    }
}
