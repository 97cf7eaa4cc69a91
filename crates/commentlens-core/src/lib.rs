//! 源代码注释分段核心库
//!
//! 设计要点：
//! - 分段扫描器按纯文本定界规则把源码切分为代码 / 行注释 / 块注释 / 文档注释片段，不解析语法。
//! - 后处理器负责合并相邻行注释、去除空白行、丢弃空片段。
//! - 替换协议在扫描的同时把每个闭合的注释交给回调，用于删除、翻译或改写注释。
//! - 目录遍历、编码读写、翻译服务均位于外围模块，扫描与后处理本身是纯函数式的文本变换。

mod types;
mod error;
mod rules;
mod options;
mod scanner;
mod postprocess;
pub mod comment_text;
mod translate;
mod source_file;
pub mod textio;
pub mod walk;
mod config;
pub mod census;
mod project;

pub use types::{Edit, Span, SpanKind};
pub use error::SegmentError;
pub use rules::{load_rule_set, parse_rule_set, DelimiterRule, RuleEnd, RuleSet};
pub use options::{CommentOp, CommentOps, ProcessOptions, ProcessStats, SegmentOptions};
pub use scanner::Scanner;
pub use postprocess::{group_line_comments, merge_line_comments, strip_blank_lines, BlockPostProcessor};
pub use translate::{LanguagePair, Translator};
pub use source_file::{FileOutcome, Progress, SourceFileProcessor};
pub use config::ProcessConfig;
pub use census::LineCensus;
pub use project::{process_tree, SharedTranslator, TreeProgress};

/// 按选项完成“扫描 + 后处理”
pub fn segment(text: &str, rules: RuleSet, opts: &SegmentOptions) -> Result<Vec<Span>, SegmentError> {
    let spans = Scanner::with_options(rules, opts).segment(text)?;
    Ok(BlockPostProcessor::from_options(opts).process(spans))
}
