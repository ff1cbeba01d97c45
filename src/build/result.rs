//! 构建结果及其严重程度排序

use serde::{Deserialize, Serialize};

/// CI 系统报告的构建结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    Unknown,
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl BuildResult {
    pub const ALL: [BuildResult; 6] = [
        BuildResult::Success,
        BuildResult::Unstable,
        BuildResult::Failure,
        BuildResult::NotBuilt,
        BuildResult::Aborted,
        BuildResult::Unknown,
    ];

    /// CI 系统使用的大写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
            BuildResult::Unknown => "UNKNOWN",
        }
    }

    /// 在 `SUCCESS < UNSTABLE < FAILURE` 上的等级
    ///
    /// `NOT_BUILT`、`ABORTED`、`UNKNOWN` 不在这个等级上。
    pub fn severity(&self) -> Option<u8> {
        match self {
            BuildResult::Success => Some(0),
            BuildResult::Unstable => Some(1),
            BuildResult::Failure => Some(2),
            BuildResult::NotBuilt | BuildResult::Aborted | BuildResult::Unknown => None,
        }
    }

    /// 两个结果都在等级上且 `self` 更严重时为 true
    pub fn is_worse_than(&self, other: BuildResult) -> bool {
        match (self.severity(), other.severity()) {
            (Some(current), Some(previous)) => current > previous,
            _ => false,
        }
    }
}
