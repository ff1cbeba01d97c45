//! 自定义消息的变量展开
//!
//! 自定义消息可以引用构建变量（`$BUILD_URL`、`${PROJECT_NAME}`）。
//! 展开器是一个协作者：宿主 CI 系统可以实现 `TokenExpander` 接入自己的宏引擎。

use anyhow::{bail, Result};
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::build::Build;

/// `${NAME}` 或 `$NAME`
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]*)\}|\$([A-Za-z0-9_]+)").expect("valid token pattern")
});

/// 没有闭合的 `${`
static UNTERMINATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*$").expect("valid unterminated token pattern"));

/// 为指定构建展开模板中的变量
pub trait TokenExpander: Send + Sync {
    fn expand(&self, template: &str, build: &Build) -> Result<String>;
}

/// 原样返回模板
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExpander;

impl TokenExpander for NoopExpander {
    fn expand(&self, template: &str, _build: &Build) -> Result<String> {
        Ok(template.to_string())
    }
}

/// 展开内置构建变量，未知变量保持原样
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildTokenExpander;

impl BuildTokenExpander {
    /// 变量名对应的值，未知变量返回 `None`
    fn lookup(name: &str, build: &Build) -> Option<String> {
        let value = match name {
            "PROJECT_NAME" => build.project_display_name.clone(),
            "BUILD_DISPLAY_NAME" => build.display_name.clone(),
            "BUILD_URL" => build.url.clone(),
            "BUILD_RESULT" => build
                .result
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
            "BUILD_DURATION" => build.human_duration.clone(),
            _ => return None,
        };
        Some(value)
    }
}

impl TokenExpander for BuildTokenExpander {
    fn expand(&self, template: &str, build: &Build) -> Result<String> {
        if let Some(m) = UNTERMINATED.find(template) {
            bail!("unterminated token in custom message: {}", m.as_str());
        }

        let expanded = TOKEN.replace_all(template, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            Self::lookup(name, build).unwrap_or_else(|| caps[0].to_string())
        });
        Ok(expanded.into_owned())
    }
}
