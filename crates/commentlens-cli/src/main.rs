use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commentlens_core::{
    census, load_rule_set, process_tree, textio, walk, LineCensus, ProcessConfig, ProcessOptions, RuleSet, Scanner,
    SegmentOptions, SpanKind,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "commentlens", version, about = "源代码注释分段、删除与统计工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 各子命令共用的规则参数
#[derive(clap::Args, Debug)]
struct RuleArgs {
    /// 规则文件路径（TOML）；优先于 --preset
    #[arg(long)]
    rules: Option<PathBuf>,

    /// 内置规则集：c_style 或 hash
    #[arg(long, default_value = "c_style")]
    preset: String,

    /// 文本编码
    #[arg(long, default_value = "utf-8")]
    charset: String,
}

impl RuleArgs {
    fn rule_set(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => load_rule_set(path),
            None => RuleSet::preset(&self.preset).with_context(|| format!("unknown rule preset `{}`", self.preset)),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 切分单个文件并以 JSON 数组输出片段
    Segment {
        #[arg(long)]
        input: PathBuf,

        /// 输出文件；缺省写到标准输出
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        rules: RuleArgs,

        /// 片段文本不含起止标记
        #[arg(long)]
        exclude_delimiters: bool,

        /// 合并相邻行注释
        #[arg(long)]
        merge: bool,

        /// 去除片段内空白行
        #[arg(long)]
        strip_blank: bool,
    },

    /// 删除单个文件中的注释
    Strip {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        rules: RuleArgs,

        /// 保留的注释种类（line、block、doc，逗号分隔）
        #[arg(long, value_delimiter = ',')]
        keep: Vec<String>,
    },

    /// 统计目录下源文件的代码行/注释行
    Count {
        #[arg(long)]
        input: PathBuf,

        /// 源文件扩展名（逗号分隔）
        #[arg(long, value_delimiter = ',', default_value = "java")]
        ext: Vec<String>,

        #[command(flatten)]
        rules: RuleArgs,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// 按配置文件处理整个目录
    Process {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// 处理配置（TOML）；缺省使用内置默认值
        #[arg(long)]
        config: Option<PathBuf>,

        /// 线程数（"auto"=CPU 核心数；1 为串行）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 超过该大小（字节）的源文件按普通文件复制
        #[arg(long)]
        max_file_size: Option<u64>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Segment { input, output, rules, exclude_delimiters, merge, strip_blank } => {
            let text = textio::read_text(&input, &rules.charset)?;
            let opts = SegmentOptions { include_delimiters: !exclude_delimiters, merge_line_comments: merge, strip_blank_lines: strip_blank };
            let spans = commentlens_core::segment(&text, rules.rule_set()?, &opts)
                .with_context(|| format!("segment {}", input.display()))?;
            let mut out = open_output(output.as_deref())?;
            serde_json::to_writer_pretty(&mut out, &spans)?;
            writeln!(out)?;
            out.flush().ok();
            info!(?input, spans = spans.len(), "segment finished");
        }

        Commands::Strip { input, output, rules, keep } => {
            let keep = parse_kinds(&keep)?;
            let text = textio::read_text(&input, &rules.charset)?;
            let scanner = Scanner::new(rules.rule_set()?, true);
            let stripped = scanner.remove_comments(&text, &keep).with_context(|| format!("strip {}", input.display()))?;
            textio::write_text(&output, &stripped, &rules.charset)?;
            info!(?input, ?output, "strip finished");
        }

        Commands::Count { input, ext, rules, output } => {
            let report = count_tree(&input, &ext, &rules)?;
            let mut out = open_output(output.as_deref())?;
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
            out.flush().ok();
        }

        Commands::Process { input, output, config, threads, max_file_size } => {
            let cfg = match &config {
                Some(path) => ProcessConfig::load(path)?,
                None => ProcessConfig::default(),
            };
            if cfg.needs_translator() {
                // 命令行不内置翻译服务；翻译需通过库接口注入 Translator
                anyhow::bail!("`translate` operations need a translation service; use the library API to supply one");
            }
            info!(?input, ?output, "starting process");
            let opts = ProcessOptions { threads: parse_threads(&threads), max_file_size };
            let stats = process_tree(&input, &output, &cfg, &opts, None, &mut |p| {
                tracing::debug!(current = p.current, total = p.total, path = %p.path.display(), "progress");
            })
            .context("process tree failed")?;
            if stats.failed_files > 0 {
                error!(failed_files = stats.failed_files, "some files could not be processed");
            }
            info!(source_files = stats.source_files, copied_files = stats.copied_files, "process finished");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 输出到文件或标准输出
fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p).context("create output file")?)),
        None => Box::new(BufWriter::new(std::io::stdout())),
    })
}

fn parse_kinds(names: &[String]) -> Result<Vec<SpanKind>> {
    names
        .iter()
        .map(|n| match SpanKind::from_name(n.trim()) {
            Some(k) if k.is_comment() => Ok(k),
            _ => Err(anyhow::anyhow!("unknown comment kind `{n}`")),
        })
        .collect()
}

/// 逐文件统计，附带合计
fn count_tree(input: &Path, ext: &[String], rules: &RuleArgs) -> Result<serde_json::Value> {
    let scanner = Scanner::new(rules.rule_set()?, true);
    let files = walk::collect_files(input, ext, &[])?;
    let mut total = LineCensus::default();
    let mut per_file = Vec::new();
    for path in &files.sources {
        let text = match textio::read_text(path, &rules.charset) {
            Ok(t) => t,
            Err(err) => {
                error!(path = %path.display(), error = %format!("{err:#}"), "read failed");
                continue;
            }
        };
        // 空文件计为零行
        let file_census = if text.is_empty() { LineCensus::default() } else { census::count_text(&scanner, &text)? };
        total.add(&file_census);
        let rel = path.strip_prefix(input).unwrap_or(path);
        per_file.push(serde_json::json!({ "path": rel.display().to_string(), "census": file_census }));
    }
    Ok(serde_json::json!({ "files": per_file, "total": total }))
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
