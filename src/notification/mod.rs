//! 通知层 - 构建通知的决策、组装和发送
//!
//! # 流程
//! 1. `DecisionEngine::decide` 为生命周期阶段决定发送/抑制以及 `Color`
//! 2. `MessageComposer::render` 生成转义后的聊天文本
//! 3. `NotificationDispatcher` 把 `Notification` 交给每个已注册的渠道
//!
//! # 使用示例
//! ```ignore
//! use build_notify::notification::{BuildPhase, DecisionEngine, NotificationBuilder};
//!
//! let engine = DecisionEngine::new(config.policy.clone());
//! if let Some(notification) = engine.evaluate(BuildPhase::Complete, &build) {
//!     NotificationBuilder::from_config(&config).build()?.send(&notification)?;
//! }
//! ```

pub mod builder;
pub mod channel;
pub mod channels;
pub mod color;
pub mod composer;
pub mod decision;
pub mod dispatcher;
pub mod escape;
pub mod expander;
pub mod time_span;

pub use builder::NotificationBuilder;
pub use channel::{Notification, NotificationChannel, SendResult};
pub use color::{color_meets_threshold, Color};
pub use composer::{msg, MessageComposer};
pub use decision::{
    completion_triggers, more_test_failures_than_previous_build, Decision, DecisionEngine,
};
pub use dispatcher::{Delivery, NotificationDispatcher};
pub use escape::escape;
pub use expander::{BuildTokenExpander, NoopExpander, TokenExpander};

use serde::{Deserialize, Serialize};

/// 触发评估的构建生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    /// 构建已调度并开始
    Start,
    /// 构建收尾中：结果和测试已知，构建后步骤仍在运行
    Finalize,
    /// 构建完全结束
    Complete,
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildPhase::Start => "start",
            BuildPhase::Finalize => "finalize",
            BuildPhase::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}
