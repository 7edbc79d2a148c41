//! CLI binary for edgequake-segment.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SegmentConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_segment::convert::{write_atomic, DEFAULT_DOWNLOAD_TIMEOUT_SECS};
use edgequake_segment::pipeline::input::load_document;
use edgequake_segment::{
    segment_pages, BookPreset, LineError, OutputFormat, PageSelection, ProgressCallback,
    SegmentConfig, SegmentConfigBuilder, SegmentProgressCallback, SegmentationStats,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the selected pages, plus a log
/// line for every dropped line.
struct CliProgressCallback {
    bar: ProgressBar,
    entries: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_segmentation_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Loading pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            entries: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} pages  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Segmenting");
        self.bar.reset_eta();
    }
}

impl SegmentProgressCallback for CliProgressCallback {
    fn on_segmentation_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Segmenting {total_pages} pages…"))
        ));
    }

    fn on_page_complete(&self, _page_num: usize, entries_emitted: usize) {
        let total = self.entries.fetch_add(entries_emitted, Ordering::SeqCst) + entries_emitted;
        self.bar.set_message(format!("{total} entries"));
        self.bar.inc(1);
    }

    fn on_line_error(&self, error: &LineError) {
        self.bar
            .println(format!("  {} {}", red("✗"), dim(&error.to_string())));
    }

    fn on_segmentation_complete(&self, _stats: &SegmentationStats) {
        // The summary is printed by `main` once output is written.
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Segment extracted pages to stdout (JSONL)
  pdfseg book_pages.json

  # Write to a file
  pdfseg book_pages.json -o entries.jsonl

  # Second built-in book, a page range, custom source label
  pdfseg --book market --pages 20-180 --source ta-markets pages.jsonl -o ta.jsonl

  # Tune the filter
  pdfseg --min-len 10 --max-len 300 --keywords 头肩顶,双底,旗形 pages.json

  # Raw pdftotext output (pages split on form feed), joining short lines
  pdfseg --join-lines 40 book.txt -o entries.jsonl

  # Load every rule table from a profile
  pdfseg --profile my_book.toml pages.json

  # Emit extraction prompts instead of entries
  pdfseg --format prompts pages.json > prompts.jsonl

  # Page and line counts only
  pdfseg --inspect-only pages.json

INPUT FORMATS:
  .json    {"source": "...", "pages": [{"page": 1, "lines": ["..."]}]} or a bare page array
  .jsonl   one {"page": N, "lines": [...]} record per line
  other    plain text, pages separated by form feed (\f)

ENVIRONMENT VARIABLES:
  PDFSEG_*   every flag, e.g. PDFSEG_BOOK=market PDFSEG_MIN_LEN=20
  RUST_LOG   overrides the log filter
"#;

/// Segment extracted book pages into structured knowledge entries.
#[derive(Parser, Debug)]
#[command(
    name = "pdfseg",
    version,
    about = "Segment extracted book pages into structured knowledge entries",
    long_about = "Walk page-level text extracted from a technical-analysis book, track chapter \
and section headings, filter boilerplate, classify each paragraph and merge figure captions \
with their explanations. Writes newline-delimited JSON.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Page document path or HTTP/HTTPS URL.
    input: String,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "PDFSEG_OUTPUT")]
    output: Option<PathBuf>,

    /// Built-in keyword tables.
    #[arg(long, env = "PDFSEG_BOOK", value_enum, default_value = "candlestick")]
    book: BookArg,

    /// TOML or JSON profile; replaces the --book preset.
    #[arg(long, env = "PDFSEG_PROFILE")]
    profile: Option<PathBuf>,

    /// Comma-separated domain keywords, replacing the preset list.
    #[arg(long, env = "PDFSEG_KEYWORDS", value_delimiter = ',')]
    keywords: Option<Vec<String>>,

    /// Minimum paragraph length in characters.
    #[arg(long, env = "PDFSEG_MIN_LEN")]
    min_len: Option<usize>,

    /// Maximum paragraph length in characters.
    #[arg(long, env = "PDFSEG_MAX_LEN")]
    max_len: Option<usize>,

    /// Minimum whitespace-separated tokens per paragraph.
    #[arg(long, env = "PDFSEG_MIN_TOKENS")]
    min_tokens: Option<usize>,

    /// Provenance label written on every entry.
    #[arg(long, env = "PDFSEG_SOURCE")]
    source: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7. Default: all, or the profile's.
    #[arg(long, env = "PDFSEG_PAGES")]
    pages: Option<String>,

    /// Join lines into paragraphs of at least N characters.
    #[arg(long, env = "PDFSEG_JOIN_LINES")]
    join_lines: Option<usize>,

    /// Output format.
    #[arg(long, env = "PDFSEG_FORMAT", value_enum, default_value = "jsonl")]
    format: FormatArg,

    /// Print page and line counts only, no segmentation.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSEG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs (shows every rejected line).
    #[arg(short, long, env = "PDFSEG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSEG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds. Default: 120, or the profile's.
    #[arg(long, env = "PDFSEG_DOWNLOAD_TIMEOUT")]
    download_timeout: Option<u64>,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum BookArg {
    Candlestick,
    Market,
}

impl From<BookArg> for BookPreset {
    fn from(v: BookArg) -> Self {
        match v {
            BookArg::Candlestick => BookPreset::Candlestick,
            BookArg::Market => BookPreset::MarketAnalysis,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum FormatArg {
    Jsonl,
    Json,
    Prompts,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Jsonl => OutputFormat::Jsonl,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Prompts => OutputFormat::Prompts,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let timeout = cli
            .download_timeout
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS);
        let document = load_document(&cli.input, timeout)
            .await
            .context("Failed to load input")?;

        println!("File:          {}", cli.input);
        if let Some(ref s) = document.source {
            println!("Source:        {}", s);
        }
        println!("Pages:         {}", document.pages.len());
        println!("Lines:         {}", document.line_count());
        if document.skipped_pages > 0 {
            println!("Skipped:       {}", document.skipped_pages);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn SegmentProgressCallback>)
    } else {
        None
    };

    let mut config = build_config(&cli, progress_cb)?;
    let format: OutputFormat = cli.format.clone().into();

    // ── Load pages ───────────────────────────────────────────────────────
    let document = load_document(&cli.input, config.download_timeout_secs)
        .await
        .context("Failed to load input")?;

    // A label embedded in the document wins over the preset's, not over
    // an explicit --source or profile.
    if cli.source.is_none() && cli.profile.is_none() {
        if let Some(source) = document.source.as_ref().filter(|s| !s.trim().is_empty()) {
            config.source = source.clone();
        }
    }

    // ── Run segmentation ─────────────────────────────────────────────────
    let output = segment_pages(&document.pages, &config).context("Segmentation failed")?;
    let bytes = format.render(&output).context("Failed to serialise output")?;

    if let Some(ref output_path) = cli.output {
        write_atomic(output_path, &bytes)
            .await
            .context("Failed to write output")?;

        if !cli.quiet {
            print_summary(&output.stats);
            eprintln!("   →  {}", bold(&output_path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&bytes)
            .context("Failed to write to stdout")?;

        if !cli.quiet {
            print_summary(&output.stats);
        }
    }

    Ok(())
}

fn print_summary(stats: &SegmentationStats) {
    eprintln!(
        "{}  {} entries ({} standalone, {} merged)  {} pages  {}ms",
        if stats.line_errors == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.entries(),
        stats.standalone_entries,
        stats.merged_entries,
        stats.pages,
        stats.duration_ms,
    );
    eprintln!(
        "   {}",
        dim(&format!(
            "{} lines, {} headings, {} rejected, {} errors, {} captions dropped",
            stats.lines_seen,
            stats.chapter_headings + stats.section_headings,
            stats.invalid_lines,
            stats.line_errors,
            stats.captions_replaced + stats.captions_dangling,
        ))
    );
}

/// Map CLI args to `SegmentConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SegmentConfig> {
    let mut builder: SegmentConfigBuilder = match cli.profile {
        Some(ref path) => SegmentConfig::from_profile_file(path)
            .with_context(|| format!("Failed to load profile {:?}", path))?
            .into(),
        None => SegmentConfig::builder().preset(cli.book.clone().into()),
    };

    if let Some(ref keywords) = cli.keywords {
        builder = builder.keywords(keywords.iter().map(|k| k.trim().to_string()));
    }
    if let Some(n) = cli.min_len {
        builder = builder.min_len(n);
    }
    if let Some(n) = cli.max_len {
        builder = builder.max_len(n);
    }
    if let Some(n) = cli.min_tokens {
        builder = builder.min_tokens(n);
    }
    if let Some(ref source) = cli.source {
        builder = builder.source(source.clone());
    }
    if cli.join_lines.is_some() {
        builder = builder.join_lines(cli.join_lines);
    }

    if let Some(ref pages) = cli.pages {
        builder = builder.pages(parse_pages(pages)?);
    }
    if let Some(secs) = cli.download_timeout {
        builder = builder.download_timeout_secs(secs);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_all_single_range_set() {
        assert_eq!(parse_pages("ALL").unwrap(), PageSelection::All);
        assert_eq!(parse_pages("5").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(parse_pages("1, 3,5").unwrap(), PageSelection::Set(vec![1, 3, 5]));
    }

    #[test]
    fn pages_rejects_zero_and_inverted() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-2").is_err());
        assert!(parse_pages("1,0").is_err());
        assert!(parse_pages("x").is_err());
    }

    #[test]
    fn cli_overrides_preset_bounds() {
        let cli = Cli::parse_from(["pdfseg", "--min-len", "8", "--book", "market", "in.json"]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.min_len, 8);
        assert_eq!(config.max_len, 500);
        assert_eq!(config.source, "金融市场技术分析");
    }

    #[test]
    fn profile_pages_and_timeout_survive_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.toml");
        std::fs::write(
            &path,
            "source = \"wedges\"\ndownload_timeout_secs = 30\n\n[pages]\nRange = [3, 5]\n",
        )
        .unwrap();
        let profile = path.to_str().unwrap();

        let cli = Cli::parse_from(["pdfseg", "--profile", profile, "in.json"]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.pages, PageSelection::Range(3, 5));
        assert_eq!(config.download_timeout_secs, 30);

        let cli = Cli::parse_from([
            "pdfseg",
            "--profile",
            profile,
            "--pages",
            "7",
            "--download-timeout",
            "5",
            "in.json",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.pages, PageSelection::Single(7));
        assert_eq!(config.download_timeout_secs, 5);
    }

    #[test]
    fn completion_clears_bar_and_leaves_summary_to_main() {
        let cb = CliProgressCallback::new_dynamic();
        cb.on_segmentation_start(2);
        cb.on_page_complete(1, 3);
        cb.on_page_complete(2, 1);
        cb.on_segmentation_complete(&SegmentationStats::default());
        assert!(cb.bar.is_finished());
        assert_eq!(cb.entries.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn defaults_without_profile_or_flags() {
        let cli = Cli::parse_from(["pdfseg", "in.json"]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.pages, PageSelection::All);
        assert_eq!(config.download_timeout_secs, DEFAULT_DOWNLOAD_TIMEOUT_SECS);
    }
}
