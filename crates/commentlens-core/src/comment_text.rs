//! 注释正文提取：去掉定界符与行首装饰，得到可供翻译的纯文本
use regex::Regex;
use std::sync::OnceLock;

use crate::postprocess::strip_blank_lines;
use crate::types::{Span, SpanKind};

/// 块注释/文档注释行首的 `*` 装饰
fn gutter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 字面量模式，编译不会失败
    RE.get_or_init(|| Regex::new(r"^[ \t]*\*+[ \t]?").expect("static regex"))
}

/// 注释的纯文本正文
/// - 行注释：去掉重复的起始字符（如 `///`）并修剪两端空白
/// - 块/文档注释：逐行去掉 `*` 装饰，丢弃空行后修剪两端空白
pub fn body(span: &Span) -> String {
    let raw = span.body();
    match span.kind {
        SpanKind::LineComment => raw.trim_start_matches(|c: char| span.open.contains(c)).trim().to_string(),
        SpanKind::BlockComment | SpanKind::DocComment => {
            let lines: Vec<String> = raw
                .split('\n')
                .map(|l| gutter().replace(l.trim_end_matches('\r'), "").trim_end().to_string())
                .collect();
            strip_blank_lines(&lines.join("\n")).trim().to_string()
        }
        SpanKind::ExecutableCode => raw.to_string(),
    }
}

/// 正文是否只有空白与换行
pub fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::scanner::Scanner;

    fn first_comment(src: &str) -> Span {
        Scanner::new(RuleSet::c_style(), true)
            .segment(src)
            .unwrap()
            .into_iter()
            .find(|s| s.kind.is_comment())
            .unwrap()
    }

    #[test]
    fn javadoc_gutter_is_removed() {
        let span = first_comment("/**\n * Reads a file.\n *\n * @param path the path\n */");
        assert_eq!(body(&span), "Reads a file.\n@param path the path");
    }

    #[test]
    fn line_comment_body_is_trimmed() {
        assert_eq!(body(&first_comment("x; //   hello  \n")), "hello");
        assert_eq!(body(&first_comment("/// docs")), "docs");
    }

    #[test]
    fn block_comment_on_one_line() {
        assert_eq!(body(&first_comment("a /* b */")), "b");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank(" \r\n\t"));
        assert!(!is_blank(" x "));
        assert!(is_blank(&body(&first_comment("//\n"))));
        assert!(is_blank(&body(&first_comment("/*\n *\n */"))));
    }
}
