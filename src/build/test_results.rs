//! 构建附带的测试报告

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 测试计数汇总和失败用例列表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResults {
    pub total: u32,
    pub failed: u32,
    pub skipped: u32,
    #[serde(default)]
    pub failed_tests: Vec<FailedTest>,
}

/// 单个失败用例
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTest {
    /// 用于回归比较的稳定标识
    pub id: String,
    /// 全限定名，例如 `com.acme.billing.InvoiceTest.rejectsNegative`
    pub display_name: String,
    pub human_duration: String,
}

impl TestResults {
    /// 创建测试报告
    pub fn new(total: u32, failed: u32, skipped: u32, failed_tests: Vec<FailedTest>) -> Self {
        Self {
            total,
            failed,
            skipped,
            failed_tests,
        }
    }

    /// `total - failed - skipped`，最小为 0
    pub fn passed(&self) -> u32 {
        self.total
            .saturating_sub(self.failed)
            .saturating_sub(self.skipped)
    }

    /// 失败用例的标识集合
    pub fn failed_test_ids(&self) -> HashSet<&str> {
        self.failed_tests.iter().map(|t| t.id.as_str()).collect()
    }
}

impl FailedTest {
    /// 创建失败用例
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        human_duration: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            human_duration: human_duration.into(),
        }
    }

    /// 显示名按点分隔的最后两段 (`Class.method`)
    pub fn class_and_method(&self) -> &str {
        let name = self.display_name.as_str();
        if name.matches('.').count() <= 1 {
            return name;
        }
        let Some(method_dot) = name.rfind('.') else {
            return name;
        };
        match name[..method_dot].rfind('.') {
            Some(class_dot) => &name[class_dot + 1..],
            None => name,
        }
    }
}
