//! 目录树处理主流程与并行调度
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ProcessConfig;
use crate::options::{CommentOp, ProcessOptions, ProcessStats};
use crate::scanner::Scanner;
use crate::source_file::SourceFileProcessor;
use crate::textio::{read_text, write_text};
use crate::translate::Translator;
use crate::walk::{collect_files, FileSet};

/// 整个目录的翻译进度
#[derive(Debug, Clone, Copy)]
pub struct TreeProgress<'a> {
    pub current: usize,
    pub total: usize,
    pub path: &'a Path,
}

/// 可跨线程共享的翻译器
pub type SharedTranslator<'a> = &'a (dyn Translator + Sync);

/// 处理 `src_dir` 下的全部文件，结果写入镜像结构的 `dest_dir`
///
/// 流程：
/// 1. 统计全部源文件的待翻译条数（文档文件按每个 1 条计）
/// 2. 逐个处理源文件并写出
/// 3. 处理文档文件
/// 4. 按配置复制其余文件
///
/// 单个文件失败只记录告警并计入统计，不中断整体流程。
pub fn process_tree(
    src_dir: &Path,
    dest_dir: &Path,
    cfg: &ProcessConfig,
    opts: &ProcessOptions,
    translator: Option<SharedTranslator<'_>>,
    progress: &mut dyn FnMut(TreeProgress<'_>),
) -> Result<ProcessStats> {
    if cfg.needs_translator() && translator.is_none() {
        anyhow::bail!("configuration requests translation but no translator is available");
    }
    let rules = cfg.rule_set()?;
    let processor = SourceFileProcessor::new(Scanner::with_options(rules, &cfg.segment), cfg.comments, cfg.langs())
        .with_merge(cfg.segment.merge_line_comments);

    let files = plan_files(src_dir, dest_dir, cfg, opts)?;
    info!(
        sources = files.sources.len(),
        documents = files.documents.len(),
        others = files.others.len(),
        "collected files"
    );

    let mut stats = ProcessStats::default();

    // STEP 1. 统计总条数
    let mut total = 0usize;
    for path in &files.sources {
        match read_text(path, &cfg.charset).and_then(|t| count_or_zero(&processor, &t)) {
            Ok(n) => total += n,
            Err(err) => debug!(path = %path.display(), %err, "count failed"),
        }
    }
    total += files.documents.len();

    // STEP 2. 源文件
    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    let done = if threads > 1 && files.sources.len() > 1 {
        process_sources_parallel(&files.sources, src_dir, dest_dir, cfg, &processor, translator, threads, total, &mut stats, progress)?
    } else {
        process_sources_serial(&files.sources, src_dir, dest_dir, cfg, &processor, translator, total, &mut stats, progress)
    };

    // STEP 3. 文档文件
    let mut current = done;
    for path in &files.documents {
        current += 1;
        progress(TreeProgress { current, total, path });
        let res = read_text(path, &cfg.charset)
            .and_then(|t| processor.process_document(&t, cfg.documents, translator.map(|t| t as &dyn Translator)))
            .and_then(|out| write_text(&mirror_path(src_dir, dest_dir, path)?, &out, &cfg.charset));
        match res {
            Ok(()) => stats.document_files += 1,
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "document failed");
                stats.failed_files += 1;
            }
        }
    }

    // STEP 4. 其余文件
    if cfg.copy_all_files {
        for path in &files.others {
            match copy_through(src_dir, dest_dir, path) {
                Ok(()) => stats.copied_files += 1,
                Err(err) => {
                    warn!(path = %path.display(), error = %format!("{err:#}"), "copy failed");
                    stats.failed_files += 1;
                }
            }
        }
    }

    info!(
        source_files = stats.source_files,
        document_files = stats.document_files,
        copied_files = stats.copied_files,
        failed_files = stats.failed_files,
        comments_translated = stats.comments_translated,
        "processing finished"
    );
    Ok(stats)
}

/// 遍历并按配置调整分类：过大的源文件与 pass_through 文档转为普通文件
fn plan_files(src_dir: &Path, dest_dir: &Path, cfg: &ProcessConfig, opts: &ProcessOptions) -> Result<FileSet> {
    let exclude = dest_dir.canonicalize().ok();
    let src = src_dir.canonicalize().with_context(|| format!("resolve {}", src_dir.display()))?;
    // 输出目录位于输入目录内时跳过之；其余情况不需要排除
    let exclude = exclude.filter(|d| d.starts_with(&src) && d != &src);
    let mut files = collect_files(src_dir, &cfg.source_extensions, &cfg.document_extensions)?;
    if let Some(ex) = exclude {
        let keep = |p: &PathBuf| p.canonicalize().map_or(true, |c| !c.starts_with(&ex));
        files.sources.retain(|p| keep(p));
        files.documents.retain(|p| keep(p));
        files.others.retain(|p| keep(p));
    }

    if let Some(max) = opts.max_file_size {
        let (small, large): (Vec<_>, Vec<_>) = files
            .sources
            .into_iter()
            .partition(|p| std::fs::metadata(p).map_or(true, |m| m.len() <= max));
        files.sources = small;
        files.others.extend(large);
    }
    if cfg.documents == CommentOp::PassThrough {
        files.others.append(&mut files.documents);
    }
    files.others.sort();
    Ok(files)
}

fn count_or_zero(processor: &SourceFileProcessor, text: &str) -> Result<usize> {
    if text.is_empty() {
        return Ok(0);
    }
    processor.count_targets(text)
}

/// 单个源文件：读取 → 处理 → 写出；空文件原样写出
fn process_one(
    path: &Path,
    src_dir: &Path,
    dest_dir: &Path,
    cfg: &ProcessConfig,
    processor: &SourceFileProcessor,
    translator: Option<&dyn Translator>,
    progress: &mut dyn FnMut(usize),
) -> Result<FileSummary> {
    let text = read_text(path, &cfg.charset)?;
    let out_path = mirror_path(src_dir, dest_dir, path)?;
    if text.is_empty() {
        write_text(&out_path, &text, &cfg.charset)?;
        return Ok(FileSummary::default());
    }
    let outcome = processor.process(&text, translator, &mut |p| progress(p.current))?;
    write_text(&out_path, &outcome.text, &cfg.charset)?;
    debug!(path = %path.display(), comments = outcome.comments, translated = outcome.translated, "file processed");
    Ok(FileSummary { comments: outcome.comments, translated: outcome.translated })
}

#[derive(Debug, Default, Clone, Copy)]
struct FileSummary {
    comments: usize,
    translated: usize,
}

fn record(stats: &mut ProcessStats, path: &Path, res: &Result<FileSummary>) {
    match res {
        Ok(s) => {
            stats.source_files += 1;
            stats.comments_total += s.comments;
            stats.comments_translated += s.translated;
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "source file failed");
            stats.failed_files += 1;
        }
    }
}

/// 串行路径：每翻译一条注释回调一次进度
#[allow(clippy::too_many_arguments)]
fn process_sources_serial(
    sources: &[PathBuf],
    src_dir: &Path,
    dest_dir: &Path,
    cfg: &ProcessConfig,
    processor: &SourceFileProcessor,
    translator: Option<SharedTranslator<'_>>,
    total: usize,
    stats: &mut ProcessStats,
    progress: &mut dyn FnMut(TreeProgress<'_>),
) -> usize {
    let translator = translator.map(|t| t as &dyn Translator);
    let mut done = 0usize;
    for path in sources {
        let base = done;
        let res = process_one(path, src_dir, dest_dir, cfg, processor, translator, &mut |current| {
            progress(TreeProgress { current: base + current, total, path });
        });
        if let Ok(s) = &res {
            done += s.translated;
        }
        record(stats, path, &res);
    }
    done
}

/// 并行调度：
/// - Rayon 线程池并行处理文件（读、改写、写出均在 worker 内完成）
/// - 当前线程按 idx 重排结果，顺序更新统计并以文件为粒度回调进度
#[allow(clippy::too_many_arguments)]
fn process_sources_parallel(
    sources: &[PathBuf],
    src_dir: &Path,
    dest_dir: &Path,
    cfg: &ProcessConfig,
    processor: &SourceFileProcessor,
    translator: Option<SharedTranslator<'_>>,
    threads: usize,
    total: usize,
    stats: &mut ProcessStats,
    progress: &mut dyn FnMut(TreeProgress<'_>),
) -> Result<usize> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    type Msg = (usize /*idx*/, Result<FileSummary>);
    let (tx, rx) = channel::bounded::<Msg>(256);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().context("build rayon pool")?;

    let mut done = 0usize;
    std::thread::scope(|scope| {
        scope.spawn(move || {
            pool.install(|| {
                sources.par_iter().enumerate().for_each(|(idx, path)| {
                    let tr = translator.map(|t| t as &dyn Translator);
                    let res = process_one(path, src_dir, dest_dir, cfg, processor, tr, &mut |_| {});
                    let _ = tx.send((idx, res));
                });
            });
            // tx 在此被丢弃，接收端随之结束
        });

        let mut next_idx = 0usize;
        let mut buffer: BTreeMap<usize, Result<FileSummary>> = BTreeMap::new();
        while let Ok((idx, res)) = rx.recv() {
            buffer.insert(idx, res);
            while let Some(res) = buffer.remove(&next_idx) {
                let path = &sources[next_idx];
                if let Ok(s) = &res {
                    done += s.translated;
                }
                record(stats, path, &res);
                progress(TreeProgress { current: done, total, path });
                next_idx += 1;
            }
        }
    });
    Ok(done)
}

/// 输入路径在输出目录中的对应位置
fn mirror_path(src_dir: &Path, dest_dir: &Path, path: &Path) -> Result<PathBuf> {
    let rel = path
        .strip_prefix(src_dir)
        .with_context(|| format!("{} is not under {}", path.display(), src_dir.display()))?;
    Ok(dest_dir.join(rel))
}

fn copy_through(src_dir: &Path, dest_dir: &Path, path: &Path) -> Result<()> {
    let to = mirror_path(src_dir, dest_dir, path)?;
    if let Some(dir) = to.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    }
    std::fs::copy(path, &to).with_context(|| format!("copy {} -> {}", path.display(), to.display()))?;
    Ok(())
}
