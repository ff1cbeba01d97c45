//! 决策引擎 - 判断生命周期事件是否需要通知，以及使用哪种颜色
//!
//! 每次调用都是构建快照和策略的纯函数。
//! 状态迁移按 `(当前结果, 上一次非中止结果)` 判断：
//!
//! | 阶段     | 何时发送                                               | 颜色       |
//! |----------|--------------------------------------------------------|------------|
//! | start    | 总是发送                                               | 上一次结果 |
//! | finalize | 有上一次构建、开启回归通知，且结果变差或失败测试变化   | 当前结果   |
//! | complete | 有上一次构建，且命中完成表（见 `completion_triggers`） | 当前结果   |

use tracing::debug;

use super::channel::Notification;
use super::color::Color;
use super::composer::MessageComposer;
use super::expander::{BuildTokenExpander, TokenExpander};
use super::BuildPhase;
use crate::build::{Build, BuildResult};
use crate::policy::Policy;

/// 发送或抑制，在生成文本之前决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Emit(Color),
    Suppress,
}

impl Decision {
    /// 是否发送
    pub fn is_emit(&self) -> bool {
        matches!(self, Decision::Emit(_))
    }
}

/// 按一份策略决策并渲染通知
pub struct DecisionEngine {
    policy: Policy,
    expander: Box<dyn TokenExpander>,
}

impl DecisionEngine {
    /// 创建决策引擎，默认使用内置的构建变量展开器
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            expander: Box::new(BuildTokenExpander),
        }
    }

    /// 替换自定义消息的变量展开器
    pub fn with_expander(mut self, expander: Box<dyn TokenExpander>) -> Self {
        self.expander = expander;
        self
    }

    /// 当前策略
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// 基于当前策略的消息组装器
    pub fn composer(&self) -> MessageComposer<'_> {
        MessageComposer::new(&self.policy, self.expander.as_ref())
    }

    /// 对 `phase` 做决策，需要发送时组装通知
    pub fn evaluate(&self, phase: BuildPhase, build: &Build) -> Option<Notification> {
        match self.decide(phase, build) {
            Decision::Emit(color) => Some(Notification::new(
                self.composer().render(build, phase),
                color,
            )),
            Decision::Suppress => {
                debug!(
                    project = %build.project_display_name,
                    build = %build.display_name,
                    phase = %phase,
                    "Notification suppressed"
                );
                None
            }
        }
    }

    /// 构建开始：总是返回通知
    pub fn on_start(&self, build: &Build) -> Notification {
        let color = start_color(build);
        Notification::new(self.composer().start_message(build), color)
    }

    /// 构建收尾：只在回归时通知
    pub fn on_finalize(&self, build: &Build) -> Option<Notification> {
        self.evaluate(BuildPhase::Finalize, build)
    }

    /// 构建完成：按完成表通知
    pub fn on_complete(&self, build: &Build) -> Option<Notification> {
        self.evaluate(BuildPhase::Complete, build)
    }

    /// 只做决策，不生成文本
    pub fn decide(&self, phase: BuildPhase, build: &Build) -> Decision {
        match phase {
            BuildPhase::Start => Decision::Emit(start_color(build)),
            BuildPhase::Finalize => self.decide_finalize(build),
            BuildPhase::Complete => self.decide_complete(build),
        }
    }

    fn decide_finalize(&self, build: &Build) -> Decision {
        if !build.has_at_least_one_previous_non_aborted_and_completed_build() {
            return Decision::Suppress;
        }
        if !self.policy.notify_regression {
            return Decision::Suppress;
        }
        let previous = build.previous_non_aborted_result();
        let worse = build
            .result
            .is_some_and(|result| result.is_worse_than(previous));

        if worse || more_test_failures_than_previous_build(build) {
            Decision::Emit(Color::of(build.result))
        } else {
            Decision::Suppress
        }
    }

    fn decide_complete(&self, build: &Build) -> Decision {
        // 项目的第一次构建不发完成通知
        if !build.has_at_least_one_previous_non_aborted_and_completed_build() {
            return Decision::Suppress;
        }
        let Some(result) = build.result else {
            return Decision::Suppress;
        };
        if completion_triggers(result, build.previous_non_aborted_result(), &self.policy) {
            Decision::Emit(Color::of(Some(result)))
        } else {
            Decision::Suppress
        }
    }
}

/// 开始通知的颜色沿用上一次结果；项目的第一次构建为 good
fn start_color(build: &Build) -> Color {
    if build.has_at_least_one_previous_non_aborted_and_completed_build() {
        Color::of(Some(build.previous_non_aborted_result()))
    } else {
        Color::Good
    }
}

/// 完成表：各行取或，每行由各自的开关控制
pub fn completion_triggers(result: BuildResult, previous: BuildResult, policy: &Policy) -> bool {
    let previous_broken = matches!(previous, BuildResult::Failure | BuildResult::Unstable);

    (result == BuildResult::Aborted && policy.notify_aborted)
        || (result == BuildResult::Failure
            && previous != BuildResult::Failure
            && policy.notify_failure)
        || (result == BuildResult::Failure
            && previous == BuildResult::Failure
            && policy.notify_repeated_failure)
        || (result == BuildResult::NotBuilt && policy.notify_not_built)
        || (result == BuildResult::Success
            && previous_broken
            && policy.notify_back_to_normal)
        || (result == BuildResult::Success && policy.notify_success)
        || (result == BuildResult::Unstable && policy.notify_unstable)
}

/// 失败测试比上一次多，或者失败的测试集合不同
pub fn more_test_failures_than_previous_build(build: &Build) -> bool {
    let (Some(current), Some(previous)) = (&build.test_results, build.previous_test_results())
    else {
        return false;
    };
    if current.failed > previous.failed {
        return true;
    }
    current.failed_test_ids() != previous.failed_test_ids()
}
