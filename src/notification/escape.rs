//! 聊天文本转义
//!
//! 来自 CI 系统的文本可能带有 HTML 链接 (`<a href="URL">label</a>`)，
//! 需要输出为聊天链接 (`<URL|label>`)，其余的 `&`、`<`、`>` 全部转义。
//!
//! 分两步进行，链接自身的尖括号不会被转义：
//! 1. `protect` 扫描一次，把文本切成普通片段和受保护片段（转换后的链接、单独的 `{` / `%`）
//! 2. `substitute` 只转义普通片段，受保护片段原样拼回

use regex::Regex;
use std::sync::LazyLock;

/// 完整的链接标签，或单独的 `{` / `%`
static ANCHOR_OR_BRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a([^>]+)>(.+?)</a>|([{%])").expect("valid anchor pattern"));

/// 链接属性列表中的 href
static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s*href\s*=\s*("[^"]*"|'[^']*'|[^'">\s]+)"#).expect("valid href pattern")
});

/// 切分后的文本片段
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece<'a> {
    Literal(&'a str),
    Protected(String),
}

/// 转义聊天文本，并把链接转换为 `<URL|label>`
pub fn escape(raw: &str) -> String {
    substitute(&protect(raw))
}

/// `&`、`<`、`>` 转为实体
pub fn escape_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn protect(raw: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    // 尚未输出部分的起点；没有 href 的链接留在其中
    let mut pending = 0;

    for caps in ANCHOR_OR_BRACE.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let replacement = if let Some(brace) = caps.get(3) {
            Some(brace.as_str().to_string())
        } else {
            let attributes = caps.get(1).map_or("", |m| m.as_str());
            let label = caps.get(2).map_or("", |m| m.as_str());
            HREF.captures(attributes)
                .and_then(|h| h.get(1))
                .map(|url| format!("<{}|{}>", strip_quotes(url.as_str()), label))
        };

        if let Some(replacement) = replacement {
            if pending < whole.start() {
                pieces.push(Piece::Literal(&raw[pending..whole.start()]));
            }
            pieces.push(Piece::Protected(replacement));
            pending = whole.end();
        }
    }

    if pending < raw.len() {
        pieces.push(Piece::Literal(&raw[pending..]));
    }
    pieces
}

fn substitute(pieces: &[Piece<'_>]) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Literal(text) => out.push_str(&escape_characters(text)),
            Piece::Protected(text) => out.push_str(text),
        }
    }
    out
}

fn strip_quotes(url: &str) -> String {
    url.chars().filter(|c| *c != '"' && *c != '\'').collect()
}
