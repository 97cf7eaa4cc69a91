//! 单个源文件的注释处理（翻译 / 保留 / 删除）
use anyhow::{bail, Result};

use crate::comment_text::{body, is_blank};
use crate::options::{CommentOp, CommentOps};
use crate::scanner::Scanner;
use crate::translate::{LanguagePair, Translator};
use crate::postprocess::group_line_comments;
use crate::types::{Span, SpanKind};

/// 翻译进度：当前已翻译条数 / 目标总条数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// 单文件处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub text: String,
    /// 扫描到的注释数（含空注释）
    pub comments: usize,
    pub translated: usize,
}

/// 按注释种类执行操作的单文件处理器
///
/// 开启 `merge_line_comments` 时，相邻行注释作为一条逻辑注释整体翻译/删除，
/// 译文以首条的起始标记包裹。
#[derive(Debug, Clone)]
pub struct SourceFileProcessor {
    scanner: Scanner,
    ops: CommentOps,
    langs: LanguagePair,
    merge_line_comments: bool,
}

impl SourceFileProcessor {
    pub fn new(scanner: Scanner, ops: CommentOps, langs: LanguagePair) -> Self {
        Self { scanner, ops, langs, merge_line_comments: false }
    }

    pub fn with_merge(mut self, merge_line_comments: bool) -> Self {
        self.merge_line_comments = merge_line_comments;
        self
    }

    /// 统计需要翻译的注释条数（空注释不计）
    pub fn count_targets(&self, text: &str) -> Result<usize> {
        Ok(self.units(text)?.iter().filter(|u| self.is_target(u)).count())
    }

    /// 处理源文本；每翻译一条注释回调一次进度
    pub fn process(
        &self,
        text: &str,
        translator: Option<&dyn Translator>,
        progress: &mut dyn FnMut(Progress),
    ) -> Result<FileOutcome> {
        if self.ops.any_translate() && translator.is_none() {
            bail!("comment translation requested but no translator is configured");
        }
        let units = self.units(text)?;
        let total = units.iter().filter(|u| self.is_target(u)).count();
        let mut comments = 0usize;
        let mut translated = 0usize;
        let mut out = String::with_capacity(text.len());

        for unit in &units {
            let kind = unit[0].kind;
            if !kind.is_comment() {
                push_source(&mut out, unit);
                continue;
            }
            comments += 1;
            match self.ops.for_kind(kind) {
                CommentOp::PassThrough => push_source(&mut out, unit),
                CommentOp::Remove => {}
                CommentOp::Translate => match translator {
                    Some(tr) if self.is_target(unit) => {
                        out.push_str(&self.translate_unit(tr, unit)?);
                        translated += 1;
                        progress(Progress { current: translated, total });
                    }
                    _ => push_source(&mut out, unit),
                },
            }
        }

        Ok(FileOutcome { text: out, comments, translated })
    }

    /// 文档文件（非源代码）整体处理
    pub fn process_document(&self, text: &str, op: CommentOp, translator: Option<&dyn Translator>) -> Result<String> {
        match op {
            CommentOp::PassThrough => Ok(text.to_string()),
            CommentOp::Remove => Ok(String::new()),
            CommentOp::Translate => match translator {
                Some(tr) if !is_blank(text) => self.langs.run(tr, text),
                Some(_) => Ok(text.to_string()),
                None => bail!("document translation requested but no translator is configured"),
            },
        }
    }

    /// 切分并按需分组；每个单元是一段代码或一条逻辑注释
    fn units(&self, text: &str) -> Result<Vec<Vec<Span>>> {
        let spans = self.scanner.segment(text)?;
        Ok(if self.merge_line_comments {
            group_line_comments(spans)
        } else {
            spans.into_iter().map(|s| vec![s]).collect()
        })
    }

    fn is_target(&self, unit: &[Span]) -> bool {
        self.ops.for_kind(unit[0].kind) == CommentOp::Translate && !is_blank(&unit_body(unit))
    }

    /// 以原定界符包裹译文；行注释的译文压成一行
    fn translate_unit(&self, tr: &dyn Translator, unit: &[Span]) -> Result<String> {
        let (first, last) = (&unit[0], &unit[unit.len() - 1]);
        let translated = self.langs.run(tr, &unit_body(unit))?;
        let translated = match first.kind {
            SpanKind::LineComment => translated.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join(" "),
            _ => translated.trim().to_string(),
        };
        let mut s = String::with_capacity(first.open.len() + translated.len() + last.close.len() + 2);
        s.push_str(&first.open);
        s.push(' ');
        s.push_str(&translated);
        if !last.close.is_empty() {
            s.push(' ');
            s.push_str(&last.close);
        }
        Ok(s)
    }
}

/// 单元内各条注释正文以空格连接（空正文跳过）
fn unit_body(unit: &[Span]) -> String {
    unit.iter()
        .filter(|s| s.kind.is_comment())
        .map(body)
        .filter(|b| !is_blank(b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_source(out: &mut String, unit: &[Span]) {
    for span in unit {
        out.push_str(&span.source_text());
    }
}
