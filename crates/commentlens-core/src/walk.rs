//! 目录遍历与按扩展名分类
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// 遍历结果（各列表内按路径排序，保证处理顺序可复现）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSet {
    pub sources: Vec<PathBuf>,
    pub documents: Vec<PathBuf>,
    pub others: Vec<PathBuf>,
}

/// 扩展名匹配：忽略大小写，配置中可带或不带前导 `.`
pub fn has_extension(path: &Path, exts: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else { return false };
    exts.iter().any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// 递归遍历 `root`，把文件分为源代码 / 文档 / 其他三类
/// 同时命中两类扩展名时按源代码处理
pub fn collect_files(root: &Path, source_exts: &[String], doc_exts: &[String]) -> Result<FileSet> {
    if !root.is_dir() {
        anyhow::bail!("input directory {} does not exist", root.display());
    }
    let mut set = FileSet::default();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if has_extension(&path, source_exts) {
            set.sources.push(path);
        } else if has_extension(&path, doc_exts) {
            set.documents.push(path);
        } else {
            set.others.push(path);
        }
    }
    Ok(set)
}
