//! 模板解析 - 业务能力层
//!
//! 用属性表填充 `{name}` 占位符。两级策略：
//! 1. 解析并填充配置的模板
//! 2. 模板无效时退回 `"{year} {type} {denomination}"` 默认组合
//!
//! 解析失败只在本模块内部处理，永远不会抛给调用方。

use std::sync::LazyLock;

use phf::phf_map;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::models::attributes::ItemAttributes;

/// 常用占位符的默认值
pub static PLACEHOLDER_DEFAULTS: phf::Map<&'static str, &'static str> = phf_map! {
    "year" => "1921",
    "type" => "Silver Coin",
    "denomination" => "Dollar",
    "condition" => "Fine",
    "mint_mark" => "",
};

/// 模板无效时使用的默认组合
pub const FALLBACK_TEMPLATE: &str = "{year} {type} {denomination}";

const ELLIPSIS: &str = "...";

static WHITESPACE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// 模板解析错误（仅内部使用）
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TemplateError {
    #[error("位置 {0} 处的 '{{' 没有闭合")]
    Unclosed(usize),
    #[error("位置 {0} 处出现单独的 '}}'")]
    UnmatchedClose(usize),
    #[error("无效的占位符: {{{0}}}")]
    InvalidPlaceholder(String),
}

/// 模板片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(String),
}

/// 解析模板
///
/// `{{` / `}}` 为转义的花括号；占位符名称必须是标识符。
pub(crate) fn parse_template(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                chars.next();
                literal.push('}');
            }
            '}' => return Err(TemplateError::UnmatchedClose(pos)),
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(TemplateError::Unclosed(pos));
                }
                if !is_identifier(&name) {
                    return Err(TemplateError::InvalidPlaceholder(name));
                }
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(name));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// 查找占位符的值：属性表 → 默认值 → 空字符串
fn lookup<'a>(attrs: &'a ItemAttributes, name: &str) -> &'a str {
    attrs
        .get(name)
        .unwrap_or_else(|| PLACEHOLDER_DEFAULTS.get(name).copied().unwrap_or(""))
}

fn fill(template: &str, attrs: &ItemAttributes) -> Result<String, TemplateError> {
    let segments = parse_template(template)?;
    let mut out = String::with_capacity(template.len());
    for segment in &segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(name) => out.push_str(lookup(attrs, name)),
        }
    }
    Ok(out)
}

fn fill_fallback(attrs: &ItemAttributes) -> String {
    format!(
        "{} {} {}",
        lookup(attrs, "year"),
        lookup(attrs, "type"),
        lookup(attrs, "denomination")
    )
}

/// 合并连续空白并去掉首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    match WHITESPACE.as_ref() {
        Some(re) => re.replace_all(text, " ").trim().to_string(),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// 超长时截断为 `max_length - 3` 个字符并追加 `"..."`
///
/// 结果长度（按字符计）永远不超过 `max_length`。
pub fn truncate_with_ellipsis(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    if max_length < ELLIPSIS.len() {
        return ELLIPSIS.chars().take(max_length).collect();
    }
    let mut out: String = text.chars().take(max_length - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// 用属性表填充模板
pub fn resolve(template: &str, attrs: &ItemAttributes, max_length: usize) -> String {
    let filled = match fill(template, attrs) {
        Ok(text) => text,
        Err(e) => {
            debug!("模板 {:?} 无效 ({}), 使用默认组合", template, e);
            fill_fallback(attrs)
        }
    };
    truncate_with_ellipsis(&collapse_whitespace(&filled), max_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin() -> ItemAttributes {
        [
            ("year", "1921"),
            ("type", "Silver Coin"),
            ("denomination", "Dollar"),
            ("condition", "Fine"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_basic_scenario() {
        let title = resolve("{year} {type} {denomination} {condition}", &coin(), 80);
        assert_eq!(title, "1921 Silver Coin Dollar Fine");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let attrs = ItemAttributes::new();
        let title = resolve("{year} {type} {denomination} {condition} {mint_mark}", &attrs, 80);
        assert_eq!(title, "1921 Silver Coin Dollar Fine");

        let title = resolve("{series} {year}", &attrs, 80);
        assert_eq!(title, "1921");
    }

    #[test]
    fn test_unknown_keys_are_usable() {
        let mut attrs = coin();
        attrs.insert("series", "Morgan");
        let title = resolve("{year} {series} {denomination}", &attrs, 80);
        assert_eq!(title, "1921 Morgan Dollar");
    }

    #[test]
    fn test_malformed_template_falls_back() {
        let mut attrs = coin();
        attrs.insert("year", "1899");
        for template in ["{year", "year}", "{}", "{0} {1}", "{year:>6}", "{a.b}"] {
            assert_eq!(resolve(template, &attrs, 80), "1899 Silver Coin Dollar", "{template}");
        }
    }

    #[test]
    fn test_escaped_braces() {
        let title = resolve("{{{year}}} {type}", &coin(), 80);
        assert_eq!(title, "{1921} Silver Coin");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let title = resolve("  {year}   {mint_mark}  {type}\t\n", &coin(), 80);
        assert_eq!(title, "1921 Silver Coin");
    }

    #[test]
    fn test_truncation() {
        let title = resolve("{year} {type} {denomination} {condition}", &coin(), 10);
        assert_eq!(title, "1921 Si...");
        assert_eq!(title.chars().count(), 10);
    }

    #[test]
    fn test_tiny_max_length() {
        assert_eq!(truncate_with_ellipsis("abcdef", 2), "..");
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "...");
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }

    #[test]
    fn test_length_bound_holds_for_all_inputs() {
        let mut long = coin();
        long.insert("type", "Silver Coin ".repeat(20));
        long.insert("note", "ü".repeat(50));
        let templates = [
            "{year} {type} {denomination} {condition}",
            "{note}{note}",
            "{type",
            "Vintage {year} {type} {denomination}",
            "",
        ];

        for template in templates {
            for attrs in [coin(), long.clone(), ItemAttributes::new()] {
                for max_length in 1..=120 {
                    let title = resolve(template, &attrs, max_length);
                    let len = title.chars().count();
                    assert!(len <= max_length, "{template:?} @ {max_length}: {title:?}");
                    assert!(!title.contains('{'));
                    let untruncated = resolve(template, &attrs, usize::MAX);
                    if untruncated.chars().count() > max_length && max_length >= 3 {
                        assert!(title.ends_with("..."));
                    }
                }
            }
        }
    }

    #[test]
    fn test_parse_segments() {
        let segments = parse_template("Vintage {year}!").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Literal("Vintage ".to_string()),
                Segment::Placeholder("year".to_string()),
                Segment::Literal("!".to_string()),
            ]
        );
        assert_eq!(parse_template("{year").unwrap_err(), TemplateError::Unclosed(0));
        assert_eq!(
            parse_template("a } b").unwrap_err(),
            TemplateError::UnmatchedClose(2)
        );
    }
}
