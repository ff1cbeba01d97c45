//! 只读构建快照
//!
//! `Build` 包含通知器需要知道的一次 CI 构建的全部信息：
//! 标识、结果、与之前构建的关系、触发原因、变更集、触发它的上游构建以及测试报告。
//! CI 侧适配器在每个事件中填充一次，通知器从不直接查询 CI 系统。

pub mod result;
pub mod test_results;

pub use result::BuildResult;
pub use test_results::{FailedTest, TestResults};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 查找提交时最多跟随的上游层数
pub const MAX_UPSTREAM_DEPTH: usize = 8;

/// 单次构建的快照
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub project_display_name: String,
    pub display_name: String,
    pub url: String,
    /// 构建完成前为 `None`
    #[serde(default)]
    pub result: Option<BuildResult>,
    #[serde(default)]
    pub human_duration: String,
    #[serde(default)]
    pub end_time_in_millis: i64,
    #[serde(default)]
    pub history: BuildHistory,
    #[serde(default)]
    pub causes: Vec<Cause>,
    /// SCM 变更集尚未计算时为 `None`
    #[serde(default)]
    pub change_set: Option<ChangeSet>,
    /// 上游原因指向的、仍然存在的上游构建
    #[serde(default)]
    pub upstream: Option<Box<Build>>,
    #[serde(default)]
    pub test_results: Option<TestResults>,
}

/// CI 系统对同一项目之前构建的了解
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildHistory {
    /// 最近一次已完成的前序构建，跳过中止的
    #[serde(default)]
    pub previous: Option<PreviousBuild>,
    #[serde(default)]
    pub has_previous_success: bool,
    #[serde(default)]
    pub has_completed_build_since_previous_success: bool,
    #[serde(default)]
    pub has_failed_since_previous_success: bool,
    /// 上次成功之后第一次构建的结束时间；历史被清理时缺失
    #[serde(default)]
    pub end_time_of_initial_failure_in_millis: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousBuild {
    pub result: BuildResult,
    #[serde(default)]
    pub test_results: Option<TestResults>,
}

/// 构建的触发原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cause {
    pub kind: CauseKind,
    pub short_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CauseKind {
    /// 源码轮询或 push hook
    Scm,
    Upstream { project: String, build: u32 },
    User,
    Timer,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub entries: Vec<Commit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub affected_files: u64,
}

impl Commit {
    /// 创建提交记录
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            message: message.into(),
            affected_files: 0,
        }
    }

    pub fn with_affected_files(mut self, affected_files: u64) -> Self {
        self.affected_files = affected_files;
        self
    }

    /// 提交信息的第一行
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim_end()
    }
}

impl Build {
    /// 构建是否已有结果
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// 是否附带测试报告
    pub fn has_test_results(&self) -> bool {
        self.test_results.is_some()
    }

    /// 是否存在已完成且未中止的前序构建
    pub fn has_at_least_one_previous_non_aborted_and_completed_build(&self) -> bool {
        self.history.previous.is_some()
    }

    /// 最近一次非中止前序构建的结果，没有时为 `SUCCESS`
    pub fn previous_non_aborted_result(&self) -> BuildResult {
        self.history
            .previous
            .as_ref()
            .map(|p| p.result)
            .unwrap_or(BuildResult::Success)
    }

    /// 前序构建的测试报告
    pub fn previous_test_results(&self) -> Option<&TestResults> {
        self.history.previous.as_ref()?.test_results.as_ref()
    }

    pub fn has_previous_success(&self) -> bool {
        self.history.has_previous_success
    }

    pub fn has_completed_build_since_previous_success(&self) -> bool {
        self.history.has_completed_build_since_previous_success
    }

    pub fn has_failed_since_previous_success(&self) -> bool {
        self.history.has_failed_since_previous_success
    }

    /// 上次成功之后第一次构建的结束时间（毫秒）
    pub fn end_time_of_initial_failure_in_millis(&self) -> Option<i64> {
        self.history.end_time_of_initial_failure_in_millis
    }

    /// 至少有一个原因，且都不是 SCM 触发
    pub fn has_non_scm_trigger_cause_action(&self) -> bool {
        !self.causes.is_empty() && !self.causes.iter().any(|c| c.kind == CauseKind::Scm)
    }

    pub fn cause_short_description(&self) -> &str {
        self.causes
            .first()
            .map(|c| c.short_description.as_str())
            .unwrap_or("")
    }

    /// 变更集是否尚未计算
    pub fn does_not_have_change_set_computed(&self) -> bool {
        self.change_set.is_none()
    }

    pub fn does_not_have_change_set_entries(&self) -> bool {
        self.change_set_entries().is_empty()
    }

    /// 变更集中的提交，未计算时为空
    pub fn change_set_entries(&self) -> &[Commit] {
        self.change_set
            .as_ref()
            .map(|c| c.entries.as_slice())
            .unwrap_or(&[])
    }

    /// 去重并排序的作者名
    pub fn change_set_authors(&self) -> BTreeSet<&str> {
        self.change_set_entries()
            .iter()
            .map(|c| c.author.as_str())
            .collect()
    }

    pub fn total_affected_files_in_change_set(&self) -> u64 {
        self.change_set_entries().iter().map(|c| c.affected_files).sum()
    }

    /// 是否没有上游触发原因
    pub fn does_not_have_upstream_cause(&self) -> bool {
        !self
            .causes
            .iter()
            .any(|c| matches!(c.kind, CauseKind::Upstream { .. }))
    }

    pub fn upstream_exists(&self) -> bool {
        self.upstream.is_some()
    }

    /// 已解析的上游构建
    pub fn upstream(&self) -> Option<&Build> {
        self.upstream.as_deref()
    }

    /// 校验适配器交出快照前必须满足的约束
    pub fn validate(&self) -> Result<()> {
        let mut current = self;
        for depth in 0..=MAX_UPSTREAM_DEPTH {
            if let Some(previous) = &current.history.previous {
                if previous.result == BuildResult::Aborted {
                    bail!(
                        "{} {}: previous non-aborted build is recorded as ABORTED",
                        current.project_display_name,
                        current.display_name
                    );
                }
            }
            match current.upstream() {
                Some(upstream) if depth == MAX_UPSTREAM_DEPTH => {
                    bail!(
                        "upstream chain of {} {} is deeper than {} builds (next: {})",
                        self.project_display_name,
                        self.display_name,
                        MAX_UPSTREAM_DEPTH,
                        upstream.project_display_name
                    );
                }
                Some(upstream) => current = upstream,
                None => break,
            }
        }
        Ok(())
    }
}

/// 快照构建器，供适配器和测试使用
#[derive(Debug, Default)]
pub struct BuildSnapshotBuilder {
    build: Build,
}

impl BuildSnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_display_name(mut self, name: impl Into<String>) -> Self {
        self.build.project_display_name = name.into();
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.build.display_name = name.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.build.url = url.into();
        self
    }

    pub fn result(mut self, result: BuildResult) -> Self {
        self.build.result = Some(result);
        self
    }

    pub fn human_duration(mut self, duration: impl Into<String>) -> Self {
        self.build.human_duration = duration.into();
        self
    }

    pub fn end_time_in_millis(mut self, millis: i64) -> Self {
        self.build.end_time_in_millis = millis;
        self
    }

    pub fn previous(mut self, result: BuildResult) -> Self {
        self.build.history.previous = Some(PreviousBuild {
            result,
            test_results: None,
        });
        self
    }

    pub fn previous_with_tests(mut self, result: BuildResult, tests: TestResults) -> Self {
        self.build.history.previous = Some(PreviousBuild {
            result,
            test_results: Some(tests),
        });
        self
    }

    /// 存在上次成功，且之后至少有一次失败构建
    pub fn failing_since_success(mut self, end_time_of_initial_failure: Option<i64>) -> Self {
        self.build.history.has_previous_success = true;
        self.build.history.has_completed_build_since_previous_success = true;
        self.build.history.has_failed_since_previous_success = true;
        self.build.history.end_time_of_initial_failure_in_millis = end_time_of_initial_failure;
        self
    }

    pub fn has_previous_success(mut self, value: bool) -> Self {
        self.build.history.has_previous_success = value;
        self
    }

    pub fn cause(mut self, kind: CauseKind, short_description: impl Into<String>) -> Self {
        self.build.causes.push(Cause {
            kind,
            short_description: short_description.into(),
        });
        self
    }

    pub fn change_set(mut self, entries: Vec<Commit>) -> Self {
        self.build.change_set = Some(ChangeSet { entries });
        self
    }

    pub fn upstream(mut self, upstream: Build) -> Self {
        self.build.upstream = Some(Box::new(upstream));
        self
    }

    pub fn test_results(mut self, tests: TestResults) -> Self {
        self.build.test_results = Some(tests);
        self
    }

    pub fn build(self) -> Build {
        self.build
    }
}
