//! 消息组装 - 把构建信息转换为聊天文本
//!
//! 消息内部顺序固定：
//! 头部 -> 阶段正文 -> 打开链接 -> 测试汇总 -> 失败测试 -> 自定义消息。
//! 来自 CI 系统的文本都经过 `escape`；链接标记、测试计数和展开后的自定义消息原样追加。

use std::collections::HashSet;
use tracing::{debug, warn};

use super::escape::escape;
use super::expander::TokenExpander;
use super::time_span::format_time_span;
use super::BuildPhase;
use crate::build::{Build, BuildResult, MAX_UPSTREAM_DEPTH};
use crate::policy::{CustomMessages, Policy};

/// 固定文案
pub mod msg {
    pub const BACK_TO_NORMAL: &str = "Back to normal";
    pub const STILL_FAILING: &str = "Still Failing";
    pub const SUCCESS: &str = "Success";
    pub const FAILURE: &str = "Failure";
    pub const ABORTED: &str = "Aborted";
    pub const NOT_BUILT: &str = "Not built";
    pub const UNSTABLE: &str = "Unstable";
    pub const REGRESSION: &str = "Regression";
    pub const UNKNOWN: &str = "Unknown";

    pub const NO_TESTS: &str = "No Tests found.";
    pub const NO_CHANGES: &str = "No Changes.";
    pub const CHANGES: &str = "Changes:";
    pub const OPEN: &str = "Open";
}

/// 按策略为构建渲染通知文本
pub struct MessageComposer<'a> {
    policy: &'a Policy,
    expander: &'a dyn TokenExpander,
}

impl<'a> MessageComposer<'a> {
    /// 创建组装器
    pub fn new(policy: &'a Policy, expander: &'a dyn TokenExpander) -> Self {
        Self { policy, expander }
    }

    /// 生成 `phase` 对应的完整文本
    pub fn render(&self, build: &Build, phase: BuildPhase) -> String {
        match phase {
            BuildPhase::Start => self.start_message(build),
            BuildPhase::Finalize | BuildPhase::Complete => self.outcome_message(build),
        }
    }

    /// 开始消息：优先触发原因，其次变更摘要，最后通用状态
    pub fn start_message(&self, build: &Build) -> String {
        let include_custom_message = self.policy.include_custom_message;

        if build.has_non_scm_trigger_cause_action() {
            let mut message = self.message_for(build);
            message.append(build.cause_short_description());
            message.append_open_link();
            if include_custom_message {
                message.append_custom_message(build.result);
            }
            return message.finish();
        }

        if let Some(changes) = self.changes_message(build) {
            return changes;
        }

        self.status_message(build, false, false, include_custom_message)
    }

    /// "Started by changes from ..." 文本，没有可用变更集时返回 `None`
    pub fn changes_message(&self, build: &Build) -> Option<String> {
        if build.does_not_have_change_set_computed() {
            debug!(
                project = %build.project_display_name,
                build = %build.display_name,
                "No change set computed"
            );
            return None;
        }
        if build.does_not_have_change_set_entries() {
            debug!(
                project = %build.project_display_name,
                build = %build.display_name,
                "Empty change set"
            );
            return None;
        }

        let authors: Vec<&str> = build.change_set_authors().into_iter().collect();
        let mut message = self.message_for(build);
        message.append("Started by changes from ");
        message.append(&authors.join(", "));
        message.append(&format!(
            " ({} file(s) changed)",
            build.total_affected_files_in_change_set()
        ));
        message.append_open_link();
        if self.policy.include_custom_message {
            message.append_custom_message(build.result);
        }
        Some(message.finish())
    }

    /// 状态消息加上策略开启的所有段落，以及提交列表
    pub fn outcome_message(&self, build: &Build) -> String {
        let mut text = self.status_message(
            build,
            self.policy.include_test_summary,
            self.policy.include_failed_tests,
            self.policy.include_custom_message,
        );
        if self.policy.commit_info_choice.show_anything() {
            text.push('\n');
            text.push_str(&self.commit_list(build));
        }
        text
    }

    /// 状态短语、耗时和链接，可选测试汇总、失败测试和自定义消息
    pub fn status_message(
        &self,
        build: &Build,
        include_test_summary: bool,
        include_failed_tests: bool,
        include_custom_message: bool,
    ) -> String {
        let phrase = self.status_phrase(build);
        let mut message = self.message_for(build);
        message.append(phrase);
        let duration = if phrase == msg::BACK_TO_NORMAL {
            back_to_normal_duration(build)
        } else {
            Some(build.human_duration.clone())
        };
        message.append_duration(duration.as_deref());
        message.append_open_link();
        if include_test_summary {
            message.append_test_summary();
        }
        if include_failed_tests {
            message.append_failed_tests();
        }
        if include_custom_message {
            message.append_custom_message(build.result);
        }
        message.finish()
    }

    /// 状态短语，按优先级依次判断
    pub fn status_phrase(&self, build: &Build) -> &'static str {
        let Some(result) = build.result else {
            return msg::UNKNOWN;
        };
        if !build.has_at_least_one_previous_non_aborted_and_completed_build() {
            return msg::UNKNOWN;
        }
        let previous = build.previous_non_aborted_result();
        let previous_broken = matches!(previous, BuildResult::Failure | BuildResult::Unstable);

        match result {
            BuildResult::Success
                if previous_broken
                    && build.has_previous_success()
                    && self.policy.notify_back_to_normal =>
            {
                msg::BACK_TO_NORMAL
            }
            BuildResult::Failure if previous == BuildResult::Failure => msg::STILL_FAILING,
            BuildResult::Success => msg::SUCCESS,
            BuildResult::Failure => msg::FAILURE,
            BuildResult::Aborted => msg::ABORTED,
            BuildResult::NotBuilt => msg::NOT_BUILT,
            BuildResult::Unstable => msg::UNSTABLE,
            _ if result.is_worse_than(previous) => msg::REGRESSION,
            _ => msg::UNKNOWN,
        }
    }

    /// 构建的提交列表；本构建没有提交时取上游构建的
    ///
    /// 列表以提交所属构建的头部开头（`项目 - 构建 Changes:`）。
    pub fn commit_list(&self, build: &Build) -> String {
        self.commit_list_at(build, 0)
    }

    fn commit_list_at(&self, build: &Build, depth: usize) -> String {
        if build.does_not_have_change_set_entries() {
            if !build.does_not_have_upstream_cause() {
                match build.upstream() {
                    Some(upstream) if depth < MAX_UPSTREAM_DEPTH => {
                        return self.commit_list_at(upstream, depth + 1);
                    }
                    Some(_) => {
                        warn!(
                            project = %build.project_display_name,
                            depth,
                            "Upstream chain too deep, not following further"
                        );
                    }
                    None => {
                        debug!(
                            project = %build.project_display_name,
                            "Upstream build no longer exists"
                        );
                    }
                }
            }
            return msg::NO_CHANGES.to_string();
        }

        let choice = self.policy.commit_info_choice;
        let mut seen = HashSet::new();
        let mut message = self.message_for(build);
        message.append(msg::CHANGES);
        for entry in build.change_set_entries() {
            let mut parts = Vec::with_capacity(2);
            if choice.show_title() {
                parts.push(entry.title().to_string());
            }
            if choice.show_author() {
                parts.push(format!("[{}]", entry.author));
            }
            let line = parts.join(" ");
            if seen.insert(line.clone()) {
                message.append("\n\t- ");
                message.append(&line);
            }
        }
        message.finish()
    }

    fn message_for<'b>(&'b self, build: &'b Build) -> MessageBuilder<'b> {
        MessageBuilder::new(build, self.expander, &self.policy.custom_messages)
    }
}

/// 从第一次失败构建结束到本次构建结束的时长
///
/// 历史被清理或时间戳相减溢出时返回 `None`，调用方省略耗时。
fn back_to_normal_duration(build: &Build) -> Option<String> {
    if !(build.has_previous_success()
        && build.has_completed_build_since_previous_success()
        && build.has_failed_since_previous_success())
    {
        return None;
    }
    let initial_failure = build.end_time_of_initial_failure_in_millis()?;
    let Some(span) = build.end_time_in_millis.checked_sub(initial_failure) else {
        warn!(
            project = %build.project_display_name,
            build = %build.display_name,
            end_time = build.end_time_in_millis,
            initial_failure,
            "Back-to-normal span out of range, omitting duration"
        );
        return None;
    };
    Some(format_time_span(span))
}

/// 单个构建的增量消息文本
struct MessageBuilder<'a> {
    message: String,
    build: &'a Build,
    expander: &'a dyn TokenExpander,
    custom_messages: &'a CustomMessages,
}

impl<'a> MessageBuilder<'a> {
    fn new(
        build: &'a Build,
        expander: &'a dyn TokenExpander,
        custom_messages: &'a CustomMessages,
    ) -> Self {
        let mut builder = Self {
            message: String::new(),
            build,
            expander,
            custom_messages,
        };
        builder.start_message();
        builder
    }

    /// 头部：`项目 - 构建 `
    fn start_message(&mut self) {
        self.message.push_str(&escape(&self.build.project_display_name));
        self.message.push_str(" - ");
        self.message.push_str(&escape(&self.build.display_name));
        self.message.push(' ');
    }

    /// 转义后追加
    fn append(&mut self, text: &str) {
        self.message.push_str(&escape(text));
    }

    fn append_open_link(&mut self) {
        self.message
            .push_str(&format!(" (<{}|{}>)", self.build.url, msg::OPEN));
    }

    /// `None` 时整段省略
    fn append_duration(&mut self, duration: Option<&str>) {
        if let Some(duration) = duration {
            self.message.push_str(" after ");
            self.message.push_str(duration);
        }
    }

    fn append_test_summary(&mut self) {
        match &self.build.test_results {
            Some(tests) => {
                self.message.push_str(&format!(
                    "\nTest Status:\n\tPassed: {}, Failed: {}, Skipped: {}",
                    tests.passed(),
                    tests.failed,
                    tests.skipped
                ));
            }
            None => {
                self.message.push('\n');
                self.message.push_str(msg::NO_TESTS);
            }
        }
    }

    fn append_failed_tests(&mut self) {
        let Some(tests) = &self.build.test_results else {
            return;
        };
        self.message
            .push_str(&format!("\n{} Failed Tests:\n", tests.failed));
        for test in &tests.failed_tests {
            self.message.push_str(&format!(
                "\t{} after {}\n",
                escape(test.class_and_method()),
                test.human_duration
            ));
        }
    }

    /// 展开失败时记录警告并追加空段
    fn append_custom_message(&mut self, result: Option<BuildResult>) {
        let template = self.custom_messages.template_for(result);
        let expanded = match self.expander.expand(template, self.build) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    project = %self.build.project_display_name,
                    build = %self.build.display_name,
                    template,
                    error = %e,
                    "Failed to expand tokens in custom message"
                );
                String::new()
            }
        };
        self.message.push('\n');
        self.message.push_str(&expanded);
    }

    fn finish(self) -> String {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildSnapshotBuilder, CauseKind, Commit, FailedTest, TestResults};
    use crate::notification::expander::{BuildTokenExpander, NoopExpander};
    use crate::policy::CommitInfoChoice;

    fn base() -> BuildSnapshotBuilder {
        BuildSnapshotBuilder::new()
            .project_display_name("proj")
            .display_name("#5")
            .url("http://ci/proj/5")
            .human_duration("2 min 3 sec")
    }

    fn completed(result: BuildResult, previous: BuildResult) -> Build {
        base().result(result).previous(previous).build()
    }

    #[test]
    fn test_status_phrase_priority() {
        let policy = Policy {
            notify_back_to_normal: true,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);

        let back = base()
            .result(BuildResult::Success)
            .previous(BuildResult::Unstable)
            .has_previous_success(true)
            .build();
        assert_eq!(composer.status_phrase(&back), msg::BACK_TO_NORMAL);

        let cases = [
            (BuildResult::Failure, BuildResult::Failure, msg::STILL_FAILING),
            (BuildResult::Failure, BuildResult::Success, msg::FAILURE),
            (BuildResult::Aborted, BuildResult::Success, msg::ABORTED),
            (BuildResult::NotBuilt, BuildResult::Success, msg::NOT_BUILT),
            (BuildResult::Unstable, BuildResult::Success, msg::UNSTABLE),
            (BuildResult::Unknown, BuildResult::Success, msg::UNKNOWN),
        ];
        for (result, previous, phrase) in cases {
            assert_eq!(composer.status_phrase(&completed(result, previous)), phrase);
        }
    }

    #[test]
    fn test_back_to_normal_needs_previous_success_and_toggle() {
        let policy = Policy::default();
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = base()
            .result(BuildResult::Success)
            .previous(BuildResult::Failure)
            .has_previous_success(true)
            .build();
        assert_eq!(composer.status_phrase(&build), msg::SUCCESS);

        let policy = Policy {
            notify_back_to_normal: true,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let never_succeeded = completed(BuildResult::Success, BuildResult::Failure);
        assert_eq!(composer.status_phrase(&never_succeeded), msg::SUCCESS);
    }

    #[test]
    fn test_status_phrase_unknown_without_result_or_history() {
        let policy = Policy::default();
        let composer = MessageComposer::new(&policy, &NoopExpander);

        let no_result = base().previous(BuildResult::Success).build();
        assert_eq!(composer.status_phrase(&no_result), msg::UNKNOWN);

        let no_history = base().result(BuildResult::Success).build();
        assert_eq!(composer.status_phrase(&no_history), msg::UNKNOWN);
    }

    #[test]
    fn test_status_message_layout() {
        let policy = Policy::default();
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = completed(BuildResult::Failure, BuildResult::Success);
        assert_eq!(
            composer.status_message(&build, false, false, false),
            "proj - #5 Failure after 2 min 3 sec (<http://ci/proj/5|Open>)"
        );
    }

    #[test]
    fn test_back_to_normal_duration_spans_the_outage() {
        let policy = Policy {
            notify_back_to_normal: true,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = base()
            .result(BuildResult::Success)
            .previous(BuildResult::Failure)
            .failing_since_success(Some(1_000))
            .end_time_in_millis(1_000 + 65 * 60_000)
            .build();
        assert_eq!(
            composer.status_message(&build, false, false, false),
            "proj - #5 Back to normal after 1 hr 5 min (<http://ci/proj/5|Open>)"
        );
    }

    #[test]
    fn test_back_to_normal_duration_omitted_when_history_pruned() {
        let policy = Policy {
            notify_back_to_normal: true,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = base()
            .result(BuildResult::Success)
            .previous(BuildResult::Failure)
            .failing_since_success(None)
            .build();
        assert_eq!(
            composer.status_message(&build, false, false, false),
            "proj - #5 Back to normal (<http://ci/proj/5|Open>)"
        );
    }

    #[test]
    fn test_back_to_normal_duration_omitted_on_timestamp_overflow() {
        let policy = Policy {
            notify_back_to_normal: true,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);

        let far_past = base()
            .result(BuildResult::Success)
            .previous(BuildResult::Failure)
            .failing_since_success(Some(i64::MIN))
            .end_time_in_millis(1)
            .build();
        assert_eq!(
            composer.status_message(&far_past, false, false, false),
            "proj - #5 Back to normal (<http://ci/proj/5|Open>)"
        );

        let far_future = base()
            .result(BuildResult::Success)
            .previous(BuildResult::Failure)
            .failing_since_success(Some(-1))
            .end_time_in_millis(i64::MAX)
            .build();
        assert_eq!(
            composer.status_message(&far_future, false, false, false),
            "proj - #5 Back to normal (<http://ci/proj/5|Open>)"
        );
    }

    #[test]
    fn test_test_summary_and_failed_tests() {
        let policy = Policy::default();
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = base()
            .result(BuildResult::Unstable)
            .previous(BuildResult::Success)
            .test_results(TestResults::new(
                10,
                2,
                1,
                vec![
                    FailedTest::new("a", "com.acme.FooTest.bar", "0.1 sec"),
                    FailedTest::new("b", "smoke", "2 sec"),
                ],
            ))
            .build();
        assert_eq!(
            composer.status_message(&build, true, true, false),
            "proj - #5 Unstable after 2 min 3 sec (<http://ci/proj/5|Open>)\n\
             Test Status:\n\tPassed: 7, Failed: 2, Skipped: 1\n\
             2 Failed Tests:\n\tFooTest.bar after 0.1 sec\n\tsmoke after 2 sec\n"
        );
    }

    #[test]
    fn test_no_tests_found() {
        let policy = Policy::default();
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = completed(BuildResult::Success, BuildResult::Success);
        let text = composer.status_message(&build, true, true, false);
        assert!(text.ends_with("\nNo Tests found."));
        assert!(!text.contains("Failed Tests"));
    }

    #[test]
    fn test_custom_message_uses_result_template() {
        let policy = Policy {
            custom_messages: CustomMessages {
                default: Some("generic".to_string()),
                failure: Some("fix $BUILD_URL".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &BuildTokenExpander);
        let build = completed(BuildResult::Failure, BuildResult::Success);
        let text = composer.status_message(&build, false, false, true);
        assert!(text.ends_with("\nfix http://ci/proj/5"), "{}", text);
    }

    #[test]
    fn test_failed_expansion_yields_empty_segment() {
        let policy = Policy {
            custom_messages: CustomMessages {
                default: Some("broken ${BUILD_URL".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &BuildTokenExpander);
        let build = completed(BuildResult::Success, BuildResult::Success);
        assert_eq!(
            composer.status_message(&build, false, false, true),
            "proj - #5 Success after 2 min 3 sec (<http://ci/proj/5|Open>)\n"
        );
    }

    #[test]
    fn test_header_is_escaped() {
        let policy = Policy::default();
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = BuildSnapshotBuilder::new()
            .project_display_name("R&D <core>")
            .display_name("#1")
            .url("http://ci/1")
            .cause(CauseKind::User, "Started by <a href=\"http://ci/user/ann\">ann</a>")
            .build();
        assert_eq!(
            composer.start_message(&build),
            "R&amp;D &lt;core&gt; - #1 Started by <http://ci/user/ann|ann> (<http://ci/1|Open>)"
        );
    }

    #[test]
    fn test_commit_list_dedups_and_keeps_order() {
        let policy = Policy {
            commit_info_choice: CommitInfoChoice::AuthorsAndDescription,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = base()
            .change_set(vec![
                Commit::new("ann", "Fix <parser>\n\ndetails"),
                Commit::new("bob", "Add docs"),
                Commit::new("ann", "Fix <parser>\n\nother details"),
            ])
            .build();
        assert_eq!(
            composer.commit_list(&build),
            "proj - #5 Changes:\n\t- Fix &lt;parser&gt; [ann]\n\t- Add docs [bob]"
        );
    }

    #[test]
    fn test_commit_list_authors_only() {
        let policy = Policy {
            commit_info_choice: CommitInfoChoice::Authors,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = base()
            .change_set(vec![Commit::new("ann", "one"), Commit::new("ann", "two")])
            .build();
        assert_eq!(composer.commit_list(&build), "proj - #5 Changes:\n\t- [ann]");
    }

    #[test]
    fn test_commit_list_carries_upstream_header() {
        let policy = Policy {
            commit_info_choice: CommitInfoChoice::Description,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let upstream = BuildSnapshotBuilder::new()
            .project_display_name("lib")
            .display_name("#3")
            .change_set(vec![Commit::new("ann", "Bump lib")])
            .build();
        let build = base()
            .cause(
                CauseKind::Upstream {
                    project: "lib".to_string(),
                    build: 3,
                },
                "Started by upstream project lib",
            )
            .upstream(upstream)
            .build();
        assert_eq!(composer.commit_list(&build), "lib - #3 Changes:\n\t- Bump lib");
    }

    #[test]
    fn test_outcome_message_puts_header_before_changes() {
        let policy = Policy {
            notify_success: true,
            commit_info_choice: CommitInfoChoice::Description,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let build = BuildSnapshotBuilder::new()
            .project_display_name("Project")
            .display_name("Build 4")
            .url("u")
            .human_duration("1 sec")
            .result(BuildResult::Success)
            .previous(BuildResult::Success)
            .change_set(vec![Commit::new("ann", "fix")])
            .build();
        assert_eq!(
            composer.outcome_message(&build),
            "Project - Build 4 Success after 1 sec (<u|Open>)\n\
             Project - Build 4 Changes:\n\t- fix"
        );
    }

    #[test]
    fn test_commit_list_no_changes() {
        let policy = Policy {
            commit_info_choice: CommitInfoChoice::Description,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        assert_eq!(composer.commit_list(&base().build()), msg::NO_CHANGES);

        let dangling = base()
            .cause(
                CauseKind::Upstream {
                    project: "gone".to_string(),
                    build: 1,
                },
                "Started by upstream project gone",
            )
            .build();
        assert_eq!(composer.commit_list(&dangling), msg::NO_CHANGES);
    }

    #[test]
    fn test_commit_list_upstream_depth_is_bounded() {
        let policy = Policy {
            commit_info_choice: CommitInfoChoice::Description,
            ..Default::default()
        };
        let composer = MessageComposer::new(&policy, &NoopExpander);
        let upstream_cause = CauseKind::Upstream {
            project: "up".to_string(),
            build: 1,
        };
        let mut build = base().change_set(vec![Commit::new("ann", "deep")]).build();
        for _ in 0..=MAX_UPSTREAM_DEPTH {
            build = base()
                .cause(upstream_cause.clone(), "upstream")
                .upstream(build)
                .build();
        }
        assert_eq!(composer.commit_list(&build), msg::NO_CHANGES);
    }
}
