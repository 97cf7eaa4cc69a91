//! 分段选项、处理选项与统计信息（模块）
use serde::{Deserialize, Serialize};

use crate::types::SpanKind;

/// 扫描器与后处理器共同识别的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// 注释片段文本是否包含起止标记
    pub include_delimiters: bool,
    /// 合并相邻的行注释
    pub merge_line_comments: bool,
    /// 去除片段内的空白行
    pub strip_blank_lines: bool,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self { include_delimiters: true, merge_line_comments: true, strip_blank_lines: true }
    }
}

impl SegmentOptions {
    /// 原样切分：含定界符、不合并、不归一化，拼接即还原输入
    pub fn raw() -> Self {
        Self { include_delimiters: true, merge_line_comments: false, strip_blank_lines: false }
    }
}

/// 对某类注释（或文档文件）执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOp {
    Translate,
    #[default]
    PassThrough,
    Remove,
}

/// 三类注释各自的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct CommentOps {
    pub line: CommentOp,
    pub block: CommentOp,
    pub doc: CommentOp,
}

impl CommentOps {
    pub fn uniform(op: CommentOp) -> Self {
        Self { line: op, block: op, doc: op }
    }

    pub fn for_kind(&self, kind: SpanKind) -> CommentOp {
        match kind {
            SpanKind::LineComment => self.line,
            SpanKind::BlockComment => self.block,
            SpanKind::DocComment => self.doc,
            SpanKind::ExecutableCode => CommentOp::PassThrough,
        }
    }

    pub fn any_translate(&self) -> bool {
        [self.line, self.block, self.doc].contains(&CommentOp::Translate)
    }
}

/// 目录处理的运行参数
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
    /// 最大文件大小（字节）；超过则作为普通文件处理
    pub max_file_size: Option<u64>,
}

/// 处理统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    pub source_files: usize,
    pub document_files: usize,
    pub copied_files: usize,
    pub failed_files: usize,
    pub comments_total: usize,
    pub comments_translated: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ops_deserialize_from_snake_case() {
        let ops: CommentOps = toml::from_str("line = \"remove\"\ndoc = \"translate\"\n").unwrap();
        assert_eq!(ops.for_kind(SpanKind::LineComment), CommentOp::Remove);
        assert_eq!(ops.for_kind(SpanKind::BlockComment), CommentOp::PassThrough);
        assert_eq!(ops.for_kind(SpanKind::DocComment), CommentOp::Translate);
        assert!(ops.any_translate());
    }

    #[test]
    fn code_is_always_passed_through() {
        let ops = CommentOps::uniform(CommentOp::Remove);
        assert_eq!(ops.for_kind(SpanKind::ExecutableCode), CommentOp::PassThrough);
    }
}
