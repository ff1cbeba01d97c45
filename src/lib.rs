//! Build Notify - 为 CI 构建决策、着色并格式化聊天通知

pub mod build;
pub mod config;
pub mod notification;
pub mod policy;

pub use build::{
    Build, BuildResult, BuildSnapshotBuilder, Cause, CauseKind, Commit, FailedTest, TestResults,
};
pub use config::{AppConfig, SlackConfig};
pub use notification::{
    BuildPhase, Color, Decision, DecisionEngine, Delivery, MessageComposer, Notification,
    NotificationBuilder, NotificationDispatcher, SendResult, TokenExpander,
};
pub use policy::{CommitInfoChoice, CustomMessages, Policy};
