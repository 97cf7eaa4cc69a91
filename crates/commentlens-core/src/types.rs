//! 公共类型（对外暴露）
use serde::Serialize;

/// 片段类型：任一扫描位置恰好处于其中一种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    ExecutableCode,
    LineComment,
    BlockComment,
    DocComment,
}

impl SpanKind {
    /// 种类总数（用于按序号索引的定长缓冲区）
    pub const COUNT: usize = 4;

    pub fn ordinal(self) -> usize {
        match self {
            SpanKind::ExecutableCode => 0,
            SpanKind::LineComment => 1,
            SpanKind::BlockComment => 2,
            SpanKind::DocComment => 3,
        }
    }

    pub fn is_comment(self) -> bool {
        !matches!(self, SpanKind::ExecutableCode)
    }

    /// 配置文件与命令行中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            SpanKind::ExecutableCode => "code",
            SpanKind::LineComment => "line",
            SpanKind::BlockComment => "block",
            SpanKind::DocComment => "doc",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Some(SpanKind::ExecutableCode),
            "line" => Some(SpanKind::LineComment),
            "block" => Some(SpanKind::BlockComment),
            "doc" => Some(SpanKind::DocComment),
            _ => None,
        }
    }
}

/// 扫描输出的单个片段
///
/// `open` / `close` 记录实际匹配到的起止标记（代码片段两者均为空；
/// 行注释与未闭合注释的 `close` 为空）。无论 `includes_delimiters`
/// 取值如何，`source_text()` 都能还原原始文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub kind: SpanKind,
    pub text: String,
    pub includes_delimiters: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub open: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub close: String,
    /// 注释是否在输入结束前遇到结束标记（行注释遇到换行亦视为闭合）
    pub terminated: bool,
}

impl Span {
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            kind: SpanKind::ExecutableCode,
            text: text.into(),
            includes_delimiters: false,
            open: String::new(),
            close: String::new(),
            terminated: true,
        }
    }

    /// 去掉起止标记后的正文
    pub fn body(&self) -> &str {
        if !self.includes_delimiters {
            return &self.text;
        }
        let s = self.text.strip_prefix(self.open.as_str()).unwrap_or(&self.text);
        s.strip_suffix(self.close.as_str()).unwrap_or(s)
    }

    /// 还原该片段在源文本中的原样内容（含起止标记）
    pub fn source_text(&self) -> String {
        if self.includes_delimiters {
            self.text.clone()
        } else {
            let mut s = String::with_capacity(self.open.len() + self.text.len() + self.close.len());
            s.push_str(&self.open);
            s.push_str(&self.text);
            s.push_str(&self.close);
            s
        }
    }
}

/// 替换协议中变换回调的返回值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// 原样保留（含起止标记）
    Keep,
    /// 以给定文本替换整个注释
    Replace(String),
    /// 从输出中删除该注释
    Delete,
}

impl From<Option<String>> for Edit {
    fn from(v: Option<String>) -> Self {
        match v {
            Some(s) => Edit::Replace(s),
            None => Edit::Delete,
        }
    }
}
