//! 分段错误类型
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    /// 输入为空：调用方借此区分“尚未加载”与“已扫描的空文件”
    #[error("input text is empty")]
    InvalidInput,
    #[error("delimiter rules misconfigured: {0}")]
    Misconfigured(String),
}
