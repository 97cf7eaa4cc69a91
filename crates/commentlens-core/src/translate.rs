//! 翻译服务接口（远程服务本身不在本库范围内）
use anyhow::Result;

/// 文本翻译器
///
/// `from` 为 None 表示由服务自动检测源语言。实现需自行持有凭据、代理等配置。
pub trait Translator {
    fn translate(&self, text: &str, from: Option<&str>, to: &str) -> Result<String>;
}

impl<F> Translator for F
where
    F: Fn(&str, Option<&str>, &str) -> Result<String>,
{
    fn translate(&self, text: &str, from: Option<&str>, to: &str) -> Result<String> {
        self(text, from, to)
    }
}

/// 源/目标语言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub from: Option<String>,
    pub to: String,
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self { from: None, to: "en".to_string() }
    }
}

impl LanguagePair {
    pub fn run(&self, translator: &dyn Translator, text: &str) -> Result<String> {
        translator.translate(text, self.from.as_deref(), &self.to)
    }
}
