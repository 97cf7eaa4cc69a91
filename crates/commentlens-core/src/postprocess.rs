//! 片段后处理：合并相邻行注释、去除空白行、丢弃空片段
use crate::options::SegmentOptions;
use crate::types::{Span, SpanKind};

/// 合并时两段之间插入的分隔符
const COMMENT_SPACER: &str = " ";

/// 片段后处理器
///
/// 依次执行：合并（可关闭）→ 空白行归一化（可关闭）→ 丢弃空片段。
/// 保留片段的相对顺序不变；合并结果占据其最右侧组成片段的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPostProcessor {
    pub merge_line_comments: bool,
    pub strip_blank_lines: bool,
}

impl Default for BlockPostProcessor {
    fn default() -> Self {
        Self::from_options(&SegmentOptions::default())
    }
}

impl BlockPostProcessor {
    pub fn new(merge_line_comments: bool, strip_blank_lines: bool) -> Self {
        Self { merge_line_comments, strip_blank_lines }
    }

    pub fn from_options(opts: &SegmentOptions) -> Self {
        Self::new(opts.merge_line_comments, opts.strip_blank_lines)
    }

    pub fn process(&self, spans: Vec<Span>) -> Vec<Span> {
        let spans = if self.merge_line_comments { merge_line_comments(spans) } else { spans };
        spans
            .into_iter()
            .filter_map(|mut span| {
                if self.strip_blank_lines {
                    span.text = strip_blank_lines(&span.text);
                }
                (!span.text.is_empty()).then_some(span)
            })
            .collect()
    }
}

/// 合并扫描相邻的行注释
pub fn merge_line_comments(spans: Vec<Span>) -> Vec<Span> {
    group_line_comments(spans).into_iter().filter_map(merge_group).collect()
}

/// 按合并规则分组：每组要么是单个片段，要么是一串相邻行注释（连同其间的空白片段）
///
/// 扫描器把结束行注释的换行符留给后续代码片段，因此两条连续行注释之间
/// 要么什么都没有，要么只隔着一个“仅含空白且至多一个换行”的代码片段；
/// 两种情况都视为相邻，中间的空白片段归入同一组。
/// 各组依次拼接即为原片段序列。
pub fn group_line_comments(spans: Vec<Span>) -> Vec<Vec<Span>> {
    let mut out: Vec<Vec<Span>> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.kind != SpanKind::LineComment {
            out.push(vec![span]);
            continue;
        }

        let n = out.len();
        let ends_with_line = |g: &Vec<Span>| g.last().is_some_and(|s| s.kind == SpanKind::LineComment);
        if n >= 1 && ends_with_line(&out[n - 1]) {
            out[n - 1].push(span);
        } else if n >= 2 && out[n - 1].len() == 1 && is_line_gap(&out[n - 1][0]) && ends_with_line(&out[n - 2]) {
            let gap = out.pop().unwrap_or_default();
            out[n - 2].extend(gap);
            out[n - 2].push(span);
        } else {
            out.push(vec![span]);
        }
    }
    out
}

/// 一组合并为一个片段：取最后一条行注释的位置与字段，空白间隙被吸收
fn merge_group(mut group: Vec<Span>) -> Option<Span> {
    if group.len() == 1 {
        return group.pop();
    }
    group
        .into_iter()
        .filter(|s| s.kind == SpanKind::LineComment)
        .reduce(|acc, next| join_line_comments(&acc.text, next))
}

fn join_line_comments(prev: &str, mut next: Span) -> Span {
    let head = prev.trim_end();
    let tail = next.text.trim_start();
    let mut text = String::with_capacity(head.len() + COMMENT_SPACER.len() + tail.len());
    text.push_str(head);
    text.push_str(COMMENT_SPACER);
    text.push_str(tail);
    next.text = text;
    next
}

/// 仅含空白、且换行不超过一个的代码片段
fn is_line_gap(span: &Span) -> bool {
    if span.kind != SpanKind::ExecutableCode || !span.text.chars().all(char::is_whitespace) {
        return false;
    }
    let breaks = span.text.replace("\r\n", "\n").chars().filter(|c| matches!(c, '\n' | '\r')).count();
    breaks <= 1
}

/// 去掉空行与仅含空白的行，其余行以单个 `\n` 连接，末尾不留换行
pub fn strip_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::scanner::Scanner;

    fn line(text: &str) -> Span {
        Span {
            kind: SpanKind::LineComment,
            text: text.to_string(),
            includes_delimiters: false,
            open: "//".to_string(),
            close: String::new(),
            terminated: true,
        }
    }

    #[test]
    fn strip_blank_lines_examples() {
        assert_eq!(strip_blank_lines("A\nB\n\n"), "A\nB");
        assert_eq!(strip_blank_lines("\n\nA"), "A");
        assert_eq!(strip_blank_lines("  \r\nA\r\n \t \nB"), "A\nB");
        assert_eq!(strip_blank_lines("\n \n"), "");
    }

    #[test]
    fn three_adjacent_line_comments_collapse_into_one() {
        let spans = vec![line(" Tag that is"), Span::code("\n"), line(" enclosed by"), Span::code("\n  "), line(" some strings")];
        let merged = merge_line_comments(spans);
        assert_eq!(merged, vec![line(" Tag that is enclosed by some strings")]);
    }

    #[test]
    fn blank_line_between_comments_prevents_merge() {
        let spans = vec![line(" a"), Span::code("\n\n"), line(" b")];
        assert_eq!(merge_line_comments(spans.clone()), spans);
    }

    #[test]
    fn code_between_comments_prevents_merge() {
        let spans = vec![line(" a"), Span::code("\nx();\n"), line(" b")];
        assert_eq!(merge_line_comments(spans.clone()), spans);
    }

    #[test]
    fn merge_is_idempotent_on_example() {
        let spans = vec![line(" a"), Span::code("\n"), line(" b"), Span::code("\ncode\n"), line(" c")];
        let once = merge_line_comments(spans);
        assert_eq!(merge_line_comments(once.clone()), once);
    }

    #[test]
    fn groups_concatenate_back_to_input_spans() {
        let spans = vec![line(" a"), Span::code("\n"), line(" b"), Span::code("\nx;\n"), line(" c")];
        let groups = group_line_comments(spans.clone());
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], vec![line(" a"), Span::code("\n"), line(" b")]);
        assert_eq!(groups.concat(), spans);
    }

    #[test]
    fn whitespace_only_spans_are_dropped() {
        let spans = vec![Span::code("x"), line("   "), Span::code("\n\n")];
        let out = BlockPostProcessor::new(false, true).process(spans);
        assert_eq!(out, vec![Span::code("x")]);
    }

    #[test]
    fn disabled_processor_only_drops_empty_spans() {
        let spans = vec![line(""), Span::code("\n"), line(" b")];
        let out = BlockPostProcessor::new(false, false).process(spans);
        assert_eq!(out, vec![Span::code("\n"), line(" b")]);
    }

    #[test]
    fn scanned_file_merges_header_comments() {
        let src = "// Imports\n// and more\nimport a;\n";
        let scanner = Scanner::new(RuleSet::c_style(), false);
        let out = BlockPostProcessor::default().process(scanner.segment(src).unwrap());
        assert_eq!(out[0].kind, SpanKind::LineComment);
        assert_eq!(out[0].text, " Imports and more");
        assert_eq!(out[1], Span::code("import a;"));
    }
}
