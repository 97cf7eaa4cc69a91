//! 处理配置（TOML）
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::options::{CommentOp, CommentOps, SegmentOptions};
use crate::rules::{load_rule_set, RuleSet};
use crate::translate::LanguagePair;

/// 目录处理配置；所有字段均有默认值
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// 源代码文件扩展名
    pub source_extensions: Vec<String>,
    /// 文档文件扩展名（整体处理，不做注释切分）
    pub document_extensions: Vec<String>,
    /// 读写文本使用的编码标签
    pub charset: String,
    /// 各类注释的操作
    pub comments: CommentOps,
    /// 文档文件的操作；pass_through 的文档按普通文件复制
    pub documents: CommentOp,
    /// None 表示自动检测
    pub from_lang: Option<String>,
    pub to_lang: String,
    /// 是否复制其余文件到输出目录
    pub copy_all_files: bool,
    /// 内置规则集名称
    pub preset: String,
    /// 规则文件（TOML）；设置后取代 `preset`，相对路径以配置文件所在目录为基准
    pub rules: Option<PathBuf>,
    /// 切分选项；`merge_line_comments` 决定相邻行注释是否作为一条处理
    pub segment: SegmentOptions,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            source_extensions: vec!["java".to_string()],
            document_extensions: Vec::new(),
            charset: "utf-8".to_string(),
            comments: CommentOps::default(),
            documents: CommentOp::PassThrough,
            from_lang: None,
            to_lang: "en".to_string(),
            copy_all_files: true,
            preset: "c_style".to_string(),
            rules: None,
            segment: SegmentOptions::default(),
        }
    }
}

impl ProcessConfig {
    pub fn parse(txt: &str) -> Result<Self> {
        Ok(toml::from_str(txt)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let mut cfg = Self::parse(&txt).with_context(|| format!("parse config {}", path.display()))?;
        if let (Some(rules), Some(base)) = (cfg.rules.as_ref(), path.parent()) {
            if rules.is_relative() {
                cfg.rules = Some(base.join(rules));
            }
        }
        Ok(cfg)
    }

    /// 解析出生效的规则集
    pub fn rule_set(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => load_rule_set(path),
            None => RuleSet::preset(&self.preset).with_context(|| format!("unknown rule preset `{}`", self.preset)),
        }
    }

    pub fn langs(&self) -> LanguagePair {
        LanguagePair { from: self.from_lang.clone(), to: self.to_lang.clone() }
    }

    /// 是否有任何操作需要翻译服务
    pub fn needs_translator(&self) -> bool {
        self.comments.any_translate() || self.documents == CommentOp::Translate
    }
}
