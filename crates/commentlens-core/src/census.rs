//! 行数统计：代码行、注释行、空行与各类注释条数
use serde::Serialize;

use crate::error::SegmentError;
use crate::postprocess::BlockPostProcessor;
use crate::scanner::Scanner;
use crate::types::{Span, SpanKind};

/// 单个文本的统计结果
///
/// 一行同时含代码与注释时，`code_lines` 与 `comment_lines` 各记一次。
/// 注释条数按合并后的逻辑注释计，连续行注释算一条。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineCensus {
    pub lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub line_comments: usize,
    pub block_comments: usize,
    pub doc_comments: usize,
}

impl LineCensus {
    pub fn add(&mut self, other: &LineCensus) {
        self.lines += other.lines;
        self.code_lines += other.code_lines;
        self.comment_lines += other.comment_lines;
        self.blank_lines += other.blank_lines;
        self.line_comments += other.line_comments;
        self.block_comments += other.block_comments;
        self.doc_comments += other.doc_comments;
    }
}

#[derive(Default)]
struct LineState {
    started: bool,
    code: bool,
    comment: bool,
}

/// 按原始片段序列统计行数（片段需覆盖完整输入）
pub fn count_lines(spans: &[Span], census: &mut LineCensus) {
    let mut cur = LineState::default();
    for span in spans {
        let comment = span.kind.is_comment();
        for ch in span.source_text().chars() {
            match ch {
                '\n' => {
                    finish_line(&cur, census);
                    cur = LineState::default();
                }
                '\r' => cur.started = true,
                c => {
                    cur.started = true;
                    if !c.is_whitespace() {
                        if comment {
                            cur.comment = true;
                        } else {
                            cur.code = true;
                        }
                    }
                }
            }
        }
    }
    if cur.started {
        finish_line(&cur, census);
    }
}

fn finish_line(line: &LineState, census: &mut LineCensus) {
    census.lines += 1;
    if line.code {
        census.code_lines += 1;
    }
    if line.comment {
        census.comment_lines += 1;
    }
    if !line.code && !line.comment {
        census.blank_lines += 1;
    }
}

/// 统计逻辑注释条数（输入为后处理后的片段）
pub fn count_comments(spans: &[Span], census: &mut LineCensus) {
    for span in spans {
        match span.kind {
            SpanKind::LineComment => census.line_comments += 1,
            SpanKind::BlockComment => census.block_comments += 1,
            SpanKind::DocComment => census.doc_comments += 1,
            SpanKind::ExecutableCode => {}
        }
    }
}

/// 扫描并统计一段文本
pub fn count_text(scanner: &Scanner, text: &str) -> Result<LineCensus, SegmentError> {
    let spans = scanner.segment(text)?;
    let mut census = LineCensus::default();
    count_lines(&spans, &mut census);
    let logical = BlockPostProcessor::new(true, false).process(spans);
    count_comments(&logical, &mut census);
    Ok(census)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_file_census() {
        let src = "/**\n * Doc.\n */\nclass A {\n\n  int x; // x\n  // one\n  // two\n}\n";
        let census = count_text(&Scanner::default(), src).unwrap();
        assert_eq!(
            census,
            LineCensus {
                lines: 9,
                code_lines: 3,
                comment_lines: 6,
                blank_lines: 1,
                line_comments: 1,
                block_comments: 0,
                doc_comments: 1,
            }
        );
    }

    #[test]
    fn trailing_line_without_newline_is_counted() {
        let census = count_text(&Scanner::default(), "a\nb").unwrap();
        assert_eq!(census.lines, 2);
        assert_eq!(census.code_lines, 2);
    }

    #[test]
    fn census_ignores_delimiter_setting() {
        let src = "x /* a */\n// b\n";
        let included = count_text(&Scanner::default(), src).unwrap();
        let excluded = count_text(&Scanner::new(crate::rules::RuleSet::c_style(), false), src).unwrap();
        assert_eq!(included, excluded);
    }
}
