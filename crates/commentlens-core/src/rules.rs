//! 注释定界规则与规则文件加载（TOML）
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::error::SegmentError;
use crate::types::SpanKind;

/// 规则的结束条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEnd {
    /// 字面量结束标记，匹配后被消费
    Token(String),
    /// 行结束符或输入结束；换行符本身不被消费，归入后续代码片段
    LineEnd,
}

/// 单条定界规则 `(kind, begin, end)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterRule {
    pub kind: SpanKind,
    pub begin: String,
    pub end: RuleEnd,
}

impl DelimiterRule {
    pub fn block(kind: SpanKind, begin: &str, end: &str) -> Self {
        Self { kind, begin: begin.to_string(), end: RuleEnd::Token(end.to_string()) }
    }

    pub fn line(begin: &str) -> Self {
        Self { kind: SpanKind::LineComment, begin: begin.to_string(), end: RuleEnd::LineEnd }
    }
}

/// 有序规则集：按注册顺序尝试起始标记，先匹配者胜出
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    rules: Vec<DelimiterRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<DelimiterRule>) -> Self {
        Self { rules }
    }

    /// C 系语法：`/** */` 先于 `/* */` 先于 `//`
    ///
    /// `/**` 在文本上覆盖了 `/*` 的前缀，若先试块注释，所有文档注释都会被误判。
    pub fn c_style() -> Self {
        Self::new(vec![
            DelimiterRule::block(SpanKind::DocComment, "/**", "*/"),
            DelimiterRule::block(SpanKind::BlockComment, "/*", "*/"),
            DelimiterRule::line("//"),
        ])
    }

    /// `#` 行注释（shell、TOML、Python 等）
    pub fn hash() -> Self {
        Self::new(vec![DelimiterRule::line("#")])
    }

    /// 按名称取内置规则集
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "c_style" | "c" => Some(Self::c_style()),
            "hash" => Some(Self::hash()),
            _ => None,
        }
    }

    /// 追加一条规则（优先级最低）
    pub fn push(&mut self, rule: DelimiterRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[DelimiterRule] {
        &self.rules
    }

    /// 校验规则集：至少一条规则，且没有空标记（空起始标记会让扫描原地打转）
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.rules.is_empty() {
            return Err(SegmentError::Misconfigured("no delimiter rules registered".into()));
        }
        for (i, r) in self.rules.iter().enumerate() {
            if !r.kind.is_comment() {
                return Err(SegmentError::Misconfigured(format!("rule #{i} maps to executable code")));
            }
            if r.begin.is_empty() {
                return Err(SegmentError::Misconfigured(format!("rule #{i} has an empty begin token")));
            }
            if let RuleEnd::Token(t) = &r.end {
                if t.is_empty() {
                    return Err(SegmentError::Misconfigured(format!("rule #{i} has an empty end token")));
                }
            }
        }
        Ok(())
    }
}

/// 规则文件中的单条规则
#[derive(Debug, Clone, Deserialize)]
struct RuleEntry {
    pub kind: String,
    pub begin: String,
    /// 省略表示行结束
    #[serde(default)]
    pub end: Option<String>,
}

/// 顶层规则文件结构
#[derive(Debug, Clone, Deserialize)]
struct RuleFile {
    /// 以内置规则集为基础，文件中的规则追加在其后
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// 解析 TOML 文本为规则集
pub fn parse_rule_set(txt: &str) -> Result<RuleSet> {
    let parsed: RuleFile = toml::from_str(txt)?;
    let mut set = match parsed.preset.as_deref() {
        Some(name) => RuleSet::preset(name).with_context(|| format!("unknown rule preset `{name}`"))?,
        None => RuleSet::default(),
    };

    for e in parsed.rules {
        let kind = match SpanKind::from_name(&e.kind) {
            Some(k) if k.is_comment() => k,
            _ => anyhow::bail!("unknown comment kind `{}`", e.kind),
        };
        let end = match e.end {
            Some(t) => RuleEnd::Token(t),
            None => RuleEnd::LineEnd,
        };
        set.push(DelimiterRule { kind, begin: e.begin, end });
    }

    set.validate()?;
    Ok(set)
}

/// 从 TOML 规则文件加载规则集
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("read rules file {}", path.display()))?;
    parse_rule_set(&txt).with_context(|| format!("parse rules file {}", path.display()))
}
