//! 通知策略 - 哪些构建状态变化需要通知，以及消息包含哪些内容

use serde::{Deserialize, Serialize};

use crate::build::BuildResult;

/// 用户配置的通知开关
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub notify_aborted: bool,
    pub notify_failure: bool,
    pub notify_repeated_failure: bool,
    pub notify_not_built: bool,
    pub notify_back_to_normal: bool,
    pub notify_success: bool,
    pub notify_unstable: bool,
    pub notify_regression: bool,
    pub include_test_summary: bool,
    pub include_failed_tests: bool,
    pub include_custom_message: bool,
    pub commit_info_choice: CommitInfoChoice,
    pub custom_messages: CustomMessages,
}

/// 通知中列出的提交信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitInfoChoice {
    #[default]
    None,
    Authors,
    Description,
    AuthorsAndDescription,
}

impl CommitInfoChoice {
    /// 是否显示作者
    pub fn show_author(&self) -> bool {
        matches!(
            self,
            CommitInfoChoice::Authors | CommitInfoChoice::AuthorsAndDescription
        )
    }

    /// 是否显示提交标题
    pub fn show_title(&self) -> bool {
        matches!(
            self,
            CommitInfoChoice::Description | CommitInfoChoice::AuthorsAndDescription
        )
    }

    /// 是否需要提交列表
    pub fn show_anything(&self) -> bool {
        self.show_author() || self.show_title()
    }
}

/// 自定义消息模板：一个通用模板，以及每种结果各一个
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomMessages {
    pub default: Option<String>,
    pub success: Option<String>,
    pub aborted: Option<String>,
    pub not_built: Option<String>,
    pub unstable: Option<String>,
    pub failure: Option<String>,
}

impl CustomMessages {
    /// `result` 对应的模板，未设置或为空时回退到通用模板
    pub fn template_for(&self, result: Option<BuildResult>) -> &str {
        let specific = match result {
            Some(BuildResult::Success) => self.success.as_deref(),
            Some(BuildResult::Aborted) => self.aborted.as_deref(),
            Some(BuildResult::NotBuilt) => self.not_built.as_deref(),
            Some(BuildResult::Unstable) => self.unstable.as_deref(),
            Some(BuildResult::Failure) => self.failure.as_deref(),
            Some(BuildResult::Unknown) | None => None,
        };
        specific
            .filter(|s| !s.is_empty())
            .or(self.default.as_deref())
            .unwrap_or("")
    }
}
