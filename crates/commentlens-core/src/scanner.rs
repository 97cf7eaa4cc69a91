//! 分段扫描器：单遍逐字符状态机，把原始文本切分为代码/注释片段
//!
//! 要点：
//! - 仅做文本层面的定界匹配，不理解语法，字符串字面量内的注释标记同样会被识别。
//! - 代码模式下按规则注册顺序匹配起始标记（锚定 + leftmost-first 多模式自动机）。
//! - 注释模式下只检查当前规则的结束标记；行注释在换行处闭合且不消费换行符。
//! - 输入结束时仍处于注释模式的，照常输出为一个未闭合片段。
use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};

use crate::error::SegmentError;
use crate::options::SegmentOptions;
use crate::rules::{DelimiterRule, RuleEnd, RuleSet};
use crate::types::{Edit, Span, SpanKind};

/// 分段扫描器
///
/// 扫描状态全部位于单次调用的栈上，同一实例可在多线程间共享。
#[derive(Debug, Clone)]
pub struct Scanner {
    rules: RuleSet,
    include_delimiters: bool,
    /// 规则集编译结果；配置错误延迟到扫描调用时返回
    matcher: Result<AhoCorasick, SegmentError>,
}

impl Scanner {
    pub fn new(rules: RuleSet, include_delimiters: bool) -> Self {
        let matcher = build_matcher(&rules);
        Self { rules, include_delimiters, matcher }
    }

    pub fn with_options(rules: RuleSet, opts: &SegmentOptions) -> Self {
        Self::new(rules, opts.include_delimiters)
    }

    /// 切分整段文本，返回按原始顺序排列、无间隙无重叠的片段序列
    pub fn segment(&self, text: &str) -> Result<Vec<Span>, SegmentError> {
        let mut spans = Vec::new();
        self.run(text, |span| {
            spans.push(span);
            Ok::<(), SegmentError>(())
        })?;
        Ok(spans)
    }

    /// 替换协议（窄接口）：变换回调收到注释种类与含定界符的原始文本
    ///
    /// 每个闭合的注释片段最多回调一次，严格自左向右；代码片段从不回调。
    pub fn replace<E, F>(&self, text: &str, mut transform: F) -> Result<String, E>
    where
        E: From<SegmentError>,
        F: FnMut(SpanKind, &str) -> Result<Edit, E>,
    {
        self.replace_spans(text, |span| transform(span.kind, &span.source_text()))
    }

    /// 替换协议（完整片段）：回调可访问正文、实际匹配的定界符与闭合状态
    pub fn replace_spans<E, F>(&self, text: &str, mut transform: F) -> Result<String, E>
    where
        E: From<SegmentError>,
        F: FnMut(&Span) -> Result<Edit, E>,
    {
        let mut out = String::with_capacity(text.len());
        self.run(text, |span| -> Result<(), E> {
            if !span.kind.is_comment() {
                out.push_str(&span.text);
                return Ok(());
            }
            match transform(&span)? {
                Edit::Keep => out.push_str(&span.source_text()),
                Edit::Replace(s) => out.push_str(&s),
                Edit::Delete => {}
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// 删除注释，`keep` 中列出的种类原样保留
    pub fn remove_comments(&self, text: &str, keep: &[SpanKind]) -> Result<String, SegmentError> {
        self.replace(text, |kind, _| {
            Ok(if keep.contains(&kind) { Edit::Keep } else { Edit::Delete })
        })
    }

    /// 状态机主循环；每闭合一个片段即交给 `emit`
    fn run<E, F>(&self, text: &str, mut emit: F) -> Result<(), E>
    where
        E: From<SegmentError>,
        F: FnMut(Span) -> Result<(), E>,
    {
        let matcher = self.matcher.as_ref().map_err(|e| E::from(e.clone()))?;
        if text.is_empty() {
            return Err(SegmentError::InvalidInput.into());
        }

        // 每种片段一个累积缓冲区，按序号索引
        let mut bufs: [String; SpanKind::COUNT] = Default::default();
        let code = SpanKind::ExecutableCode.ordinal();
        let mut active: Option<&DelimiterRule> = None;
        let len = text.len();
        let mut cursor = 0usize;

        while cursor < len {
            let rest = &text[cursor..];
            match active {
                None => {
                    let input = Input::new(text).span(cursor..len).anchored(Anchored::Yes);
                    let hit = matcher
                        .try_find(input)
                        .map_err(|e| E::from(SegmentError::Misconfigured(e.to_string())))?;
                    if let Some(m) = hit {
                        let rule = &self.rules.rules()[m.pattern().as_usize()];
                        let pending = std::mem::take(&mut bufs[code]);
                        if !pending.is_empty() {
                            emit(Span::code(pending))?;
                        }
                        cursor += rule.begin.len();
                        active = Some(rule);
                        continue;
                    }
                }
                Some(rule) => {
                    let slot = rule.kind.ordinal();
                    match &rule.end {
                        RuleEnd::Token(t) if rest.starts_with(t.as_str()) => {
                            cursor += t.len();
                            let body = std::mem::take(&mut bufs[slot]);
                            emit(self.comment_span(rule, body, t, true))?;
                            active = None;
                            continue;
                        }
                        // 换行符留给下一轮，作为后续代码片段的开头
                        RuleEnd::LineEnd if rest.starts_with(['\n', '\r']) => {
                            let body = std::mem::take(&mut bufs[slot]);
                            emit(self.comment_span(rule, body, "", true))?;
                            active = None;
                            continue;
                        }
                        _ => {}
                    }
                }
            }

            let Some(ch) = rest.chars().next() else { break };
            let slot = active.map_or(code, |r| r.kind.ordinal());
            bufs[slot].push(ch);
            cursor += ch.len_utf8();
        }

        match active {
            Some(rule) => {
                let body = std::mem::take(&mut bufs[rule.kind.ordinal()]);
                let terminated = matches!(rule.end, RuleEnd::LineEnd);
                emit(self.comment_span(rule, body, "", terminated))?;
            }
            None => {
                let pending = std::mem::take(&mut bufs[code]);
                if !pending.is_empty() {
                    emit(Span::code(pending))?;
                }
            }
        }
        Ok(())
    }

    fn comment_span(&self, rule: &DelimiterRule, body: String, close: &str, terminated: bool) -> Span {
        let text = if self.include_delimiters {
            let mut s = String::with_capacity(rule.begin.len() + body.len() + close.len());
            s.push_str(&rule.begin);
            s.push_str(&body);
            s.push_str(close);
            s
        } else {
            body
        };
        Span {
            kind: rule.kind,
            text,
            includes_delimiters: self.include_delimiters,
            open: rule.begin.clone(),
            close: close.to_string(),
            terminated,
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(RuleSet::c_style(), true)
    }
}

/// 把起始标记编译为锚定的 leftmost-first 自动机：
/// 同一位置有多个起始标记可匹配时，取注册顺序最靠前者，与逐条尝试等价。
fn build_matcher(rules: &RuleSet) -> Result<AhoCorasick, SegmentError> {
    rules.validate()?;
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .start_kind(StartKind::Anchored)
        .build(rules.rules().iter().map(|r| r.begin.as_str()))
        .map_err(|e| SegmentError::Misconfigured(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(text: &str) -> Vec<(SpanKind, String)> {
        Scanner::new(RuleSet::c_style(), false)
            .segment(text)
            .unwrap()
            .into_iter()
            .map(|s| (s.kind, s.text))
            .collect()
    }

    #[test]
    fn doc_comment_wins_over_block_comment() {
        assert_eq!(bodies("/** x */"), vec![(SpanKind::DocComment, " x ".to_string())]);
    }

    #[test]
    fn block_comment_and_surrounding_code() {
        assert_eq!(
            bodies("a /* b */ c"),
            vec![
                (SpanKind::ExecutableCode, "a ".to_string()),
                (SpanKind::BlockComment, " b ".to_string()),
                (SpanKind::ExecutableCode, " c".to_string()),
            ]
        );
    }

    #[test]
    fn line_comment_leaves_terminator_to_code() {
        assert_eq!(
            bodies("x(); // hi\r\ny();"),
            vec![
                (SpanKind::ExecutableCode, "x(); ".to_string()),
                (SpanKind::LineComment, " hi".to_string()),
                (SpanKind::ExecutableCode, "\r\ny();".to_string()),
            ]
        );
    }

    #[test]
    fn line_comment_closes_at_end_of_input() {
        let spans = Scanner::new(RuleSet::c_style(), false).segment("a // tail").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].kind, SpanKind::LineComment);
        assert_eq!(spans[1].text, " tail");
        assert!(spans[1].terminated);
    }

    #[test]
    fn unterminated_doc_begin_is_one_empty_span() {
        let spans = Scanner::new(RuleSet::c_style(), false).segment("/**").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::DocComment);
        assert_eq!(spans[0].text, "");
        assert!(!spans[0].terminated);
    }

    #[test]
    fn slash_star_star_slash_is_unterminated_doc() {
        // `/**` 吃掉三个字符，剩下的 `/` 不构成 `*/`
        let spans = Scanner::new(RuleSet::c_style(), false).segment("/**/").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, SpanKind::DocComment);
        assert_eq!(spans[0].text, "/");
        assert!(!spans[0].terminated);
    }

    #[test]
    fn line_marker_inside_block_is_content() {
        assert_eq!(bodies("/* a // b */"), vec![(SpanKind::BlockComment, " a // b ".to_string())]);
    }

    #[test]
    fn included_delimiters_round_trip() {
        let src = "/** d */\nint a; // x\n/* b */ end /* open";
        let spans = Scanner::default().segment(src).unwrap();
        let joined: String = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn source_text_restores_excluded_delimiters() {
        let src = "a /* b */ c // d\n";
        let spans = Scanner::new(RuleSet::c_style(), false).segment(src).unwrap();
        let joined: String = spans.iter().map(Span::source_text).collect();
        assert_eq!(joined, src);
    }

    #[test]
    fn multibyte_text_is_scanned_by_char() {
        assert_eq!(
            bodies("变量 // 注释\n"),
            vec![
                (SpanKind::ExecutableCode, "变量 ".to_string()),
                (SpanKind::LineComment, " 注释".to_string()),
                (SpanKind::ExecutableCode, "\n".to_string()),
            ]
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(Scanner::default().segment(""), Err(SegmentError::InvalidInput));
    }

    #[test]
    fn no_rules_is_misconfigured() {
        let scanner = Scanner::new(RuleSet::default(), true);
        assert!(matches!(scanner.segment("code"), Err(SegmentError::Misconfigured(_))));
    }

    #[test]
    fn replace_deletes_line_comment_and_keeps_code() {
        let out = Scanner::default()
            .replace(
                "a(); // drop me\nb();",
                |kind, _| Ok::<_, SegmentError>(if kind == SpanKind::LineComment { Edit::Delete } else { Edit::Keep }),
            )
            .unwrap();
        assert_eq!(out, "a(); \nb();");
    }

    #[test]
    fn replace_passes_raw_text_in_order_and_never_code() {
        let mut seen = Vec::new();
        let out = Scanner::new(RuleSet::c_style(), false)
            .replace("/** a */x/* b */y// c", |kind, raw| {
                seen.push((kind, raw.to_string()));
                Ok::<_, SegmentError>(Edit::Replace(format!("<{}>", kind.name())))
            })
            .unwrap();
        assert_eq!(out, "<doc>x<block>y<line>");
        assert_eq!(
            seen,
            vec![
                (SpanKind::DocComment, "/** a */".to_string()),
                (SpanKind::BlockComment, "/* b */".to_string()),
                (SpanKind::LineComment, "// c".to_string()),
            ]
        );
    }

    #[test]
    fn replace_propagates_transform_error() {
        #[derive(Debug, PartialEq)]
        enum Failure {
            Segment(SegmentError),
            Transform,
        }
        impl From<SegmentError> for Failure {
            fn from(e: SegmentError) -> Self {
                Failure::Segment(e)
            }
        }

        let mut calls = 0;
        let res = Scanner::default().replace("/* a */ /* b */", |_, _| {
            calls += 1;
            Err::<Edit, _>(Failure::Transform)
        });
        assert_eq!(res, Err(Failure::Transform));
        assert_eq!(calls, 1);
        assert_eq!(
            Scanner::default().replace("", |_, _| Ok::<_, Failure>(Edit::Keep)),
            Err(Failure::Segment(SegmentError::InvalidInput))
        );
    }

    #[test]
    fn replace_spans_carries_caller_error_type() {
        let out: Result<String, anyhow::Error> = Scanner::default().replace_spans("x /* a */ // b", |span| {
            anyhow::ensure!(span.terminated, "unterminated");
            Ok(if span.kind == SpanKind::LineComment { Edit::Delete } else { Edit::Keep })
        });
        assert_eq!(out.unwrap(), "x /* a */ ");

        let err = Scanner::default()
            .replace_spans("x /* a", |span| -> anyhow::Result<Edit> {
                anyhow::ensure!(span.terminated, "unterminated {}", span.open);
                Ok(Edit::Keep)
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "unterminated /*");
    }

    #[test]
    fn remove_comments_keeps_listed_kinds() {
        let out = Scanner::default()
            .remove_comments("/** api */\nfn(); /* impl */ // note", &[SpanKind::DocComment])
            .unwrap();
        assert_eq!(out, "/** api */\nfn();  ");
    }

    #[test]
    fn alternate_rule_set_is_honoured() {
        let mut rules = RuleSet::hash();
        rules.push(DelimiterRule::block(SpanKind::BlockComment, "<!--", "-->"));
        let spans = Scanner::new(rules, true).segment("a # b\n<!-- c -->").unwrap();
        let kinds: Vec<_> = spans.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SpanKind::ExecutableCode, SpanKind::LineComment, SpanKind::ExecutableCode, SpanKind::BlockComment]
        );
        assert_eq!(spans[3].text, "<!-- c -->");
    }
}
