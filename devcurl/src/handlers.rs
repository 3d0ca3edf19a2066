use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::ArgMatches;
use colored::{ColoredString, Colorize};
use devcurl_core::codegen::{self, Dialect};
use devcurl_core::data::{KeyValueStore, SqliteStore, open_store};
use devcurl_core::har::{Exchange, Har, parse_har_file};
use devcurl_core::headers::{HeaderFilterList, Preset};
use devcurl_core::response::{self, StatusClass};
use devcurl_core::schema::summary_of;
use devcurl_core::settings::HeaderSettings;
use devcurl_scanner::result::PageMap;
use devcurl_scanner::scanner::{ProgressCallback, ScanPhase, ScanReport};
use devcurl_scanner::source::{
    ChainRetriever, HarContentRetriever, HtmlPageInspector, RefetchRetriever,
};
use devcurl_scanner::{CaptureLog, PageMapStore, Scanner};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Open the store named by the global `--db` flag, in memory if it cannot be opened
pub fn open_db(args: &ArgMatches) -> Arc<dyn KeyValueStore> {
    let db = args
        .get_one::<String>("db")
        .map(String::as_str)
        .unwrap_or("~/.config/devcurl/devcurl.db");
    let path = expand_path(db);
    let store = open_store(&path);
    if !store.is_durable() {
        eprintln!(
            "{} Could not open {}, changes will not be saved",
            "⚠".yellow().bold(),
            path.display()
        );
    }
    store
}

// ============================================================================
// HAR helpers
// ============================================================================

pub fn load_har(path: &Path) -> Result<Har> {
    let har = parse_har_file(path).map_err(|e| anyhow!(e))?;
    debug!("Loaded {} entries from {}", har.log.entries.len(), path.display());
    Ok(har)
}

/// Entry by its 1-based number
pub fn select_exchange(har: &Har, number: usize) -> Result<&Exchange> {
    let count = har.log.entries.len();
    if number == 0 || number > count {
        bail!("Entry {} does not exist (capture has {} entries)", number, count);
    }
    Ok(&har.log.entries[number - 1])
}

fn colored_status(status: u16) -> ColoredString {
    let text = if status == 0 {
        "---".to_string()
    } else {
        status.to_string()
    };
    match StatusClass::of(status) {
        StatusClass::Success => text.green(),
        StatusClass::Redirect => text.cyan(),
        StatusClass::ClientError => text.yellow(),
        StatusClass::ServerError => text.red(),
        StatusClass::Other => text.white(),
    }
}

/// One listing row: number, method, status, path, content type and timing
pub fn format_entry_line(number: usize, exchange: &Exchange) -> String {
    let summary = response::summarize(exchange);
    let content_type = if summary.content_type.is_empty() {
        String::new()
    } else {
        format!("  {}", summary.content_type)
    };
    format!(
        "{:>4}  {:<7} {}  {}{}  {}",
        number,
        exchange.method(),
        colored_status(summary.status_code),
        exchange.path_with_query(),
        content_type.bright_black(),
        format!("{} ms", summary.response_time_ms).bright_black()
    )
}

/// Listing of a capture. Without `all`, only programmatic requests are shown;
/// numbering always follows the capture.
pub fn render_listing(har: &Har, all: bool) -> String {
    let mut out = String::new();
    for (idx, exchange) in har.log.entries.iter().enumerate() {
        if all || exchange.is_programmatic() {
            let _ = writeln!(out, "{}", format_entry_line(idx + 1, exchange));
        }
    }
    out
}

pub fn render_code(exchange: &Exchange, dialect: Dialect, excludes: &HeaderFilterList) -> String {
    codegen::emit(dialect, exchange, excludes.as_slice()).text()
}

/// Response view: status line and body, headers instead of the body with
/// `headers`, or only the body with `body_only`
pub fn render_response(exchange: &Exchange, headers: bool, body_only: bool) -> String {
    let detail = response::extract(exchange);
    if body_only {
        return detail.display_body();
    }

    let summary = response::summarize(exchange);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}  {}  {} ms  {} bytes",
        colored_status(summary.status_code),
        summary.status_text,
        summary.content_type,
        summary.response_time_ms,
        summary.size_bytes
    );

    if headers {
        for header in &detail.headers {
            let _ = writeln!(out, "{}: {}", header.name.bright_white(), header.value);
        }
    } else {
        out.push('\n');
        out.push_str(&detail.display_body());
        out.push('\n');
    }
    out
}

// ============================================================================
// Header settings
// ============================================================================

pub fn render_header_list(list: &HeaderFilterList) -> String {
    if list.is_empty() {
        return "No headers filtered (all headers are included)\n".to_string();
    }

    let mut out = String::new();
    for (category, names) in list.grouped() {
        let _ = writeln!(out, "{} ({})", category.label().bright_white().bold(), names.len());
        for name in names {
            let _ = writeln!(out, "  {}", name);
        }
    }
    out
}

// ============================================================================
// Page map
// ============================================================================

/// Elapsed time since a scan, e.g. `5m ago`
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        return format!("{}s ago", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

pub fn render_page_map(map: &PageMap, search: &str, now: DateTime<Utc>) -> String {
    let listing = map.listing(search);
    let mut out = String::new();

    if listing.scanned.is_empty() && listing.unscanned.is_empty() {
        return "No scanned pages\n".to_string();
    }

    for page in &listing.scanned {
        let _ = writeln!(
            out,
            "{} {}  {}",
            "✓".green().bold(),
            page.display_name().bright_white().bold(),
            format!(
                "{} · {} APIs · {}",
                page.framework,
                page.apis.len(),
                time_ago(page.scanned_at, now)
            )
            .bright_black()
        );
        if page.route.as_deref().is_some_and(|route| route != page.url) {
            let _ = writeln!(out, "    {}", page.url.bright_black());
        }
        for api in &page.apis {
            let _ = writeln!(
                out,
                "    {:<7} {} {}",
                api.method,
                colored_status(api.status),
                api.path
            );
            if api.request_schema.is_some() {
                let _ = writeln!(
                    out,
                    "      request:  {}",
                    summary_of(api.request_schema.as_ref())
                );
            }
            if api.response_schema.is_some() {
                let _ = writeln!(
                    out,
                    "      response: {}",
                    summary_of(api.response_schema.as_ref())
                );
            }
        }
    }

    if !listing.unscanned.is_empty() {
        let _ = writeln!(out, "\n{}", "Not yet scanned".yellow().bold());
        for link in &listing.unscanned {
            let _ = writeln!(out, "  {} {}", "○".yellow(), link);
        }
    }
    out
}

/// Where an export ended up
#[derive(Debug, PartialEq)]
pub enum ExportOutcome {
    File(PathBuf),
    /// Writing the file failed; the JSON is returned for printing instead
    Stdout(String),
}

/// Export the page map into `dir`, falling back to the JSON text when the file cannot be written
pub fn export_map(store: &PageMapStore, dir: &Path) -> Result<ExportOutcome> {
    match store.export_to_dir(dir) {
        Ok(path) => Ok(ExportOutcome::File(path)),
        Err(e) => {
            warn!("Export to {} failed: {}", dir.display(), e);
            let json = store
                .export_json()
                .context("Failed to serialize page map")?;
            Ok(ExportOutcome::Stdout(json))
        }
    }
}

// ============================================================================
// Scan
// ============================================================================

fn describe_phase(phase: ScanPhase) -> String {
    match phase {
        ScanPhase::Started => "Reading capture...".to_string(),
        ScanPhase::AwaitingBodies { pending } => format!("Retrieving {} response bodies...", pending),
        ScanPhase::Joined => "Inspecting page...".to_string(),
        ScanPhase::Persisted => "Saved".to_string(),
    }
}

pub struct ScanOptions<'a> {
    pub page: Option<&'a str>,
    pub refetch: bool,
    pub timeout: Duration,
}

/// Scan the page captured in `har` and store the result
pub async fn run_scan(
    har: &Har,
    options: &ScanOptions<'_>,
    store: &PageMapStore,
    progress: Option<ProgressCallback>,
) -> Result<ScanReport> {
    let inspector = HtmlPageInspector::from_har(har, options.page);
    if inspector.is_none() {
        warn!("No page URL found in the capture; pass --page to name the page");
    }
    let capture = CaptureLog::from_har(har, options.page);

    let report = if options.refetch {
        let retriever = ChainRetriever::new(
            HarContentRetriever,
            RefetchRetriever::new(options.timeout).context("Failed to set up refetching")?,
        );
        let mut scanner = Scanner::new(capture, inspector, retriever).with_timeout(options.timeout);
        if let Some(progress) = progress {
            scanner = scanner.with_progress_callback(progress);
        }
        scanner.scan(store).await?
    } else {
        let mut scanner =
            Scanner::new(capture, inspector, HarContentRetriever).with_timeout(options.timeout);
        if let Some(progress) = progress {
            scanner = scanner.with_progress_callback(progress);
        }
        scanner.scan(store).await?
    };

    Ok(report)
}

// ============================================================================
// Command handlers
// ============================================================================

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let target = args
        .get_one::<String>("PATH")
        .or_else(|| args.get_one::<String>("db"))
        .ok_or_else(|| anyhow!("No database path given"))?;
    let db_path = expand_path(target);
    let force = args.get_flag("force");

    if !quiet {
        print_divider();
        println!("{}", "  DEVCURL INITIALIZATION".bright_white().bold());
        print_divider();
    }

    if SqliteStore::exists(&db_path) {
        if !force {
            println!(
                "{} Database already exists at {} (use --force to recreate it)",
                "⚠".yellow().bold(),
                db_path.display().to_string().bright_white()
            );
            return Ok(());
        }
        SqliteStore::drop(&db_path)
            .with_context(|| format!("Failed to remove {}", db_path.display()))?;
        println!("{} Removed existing database", "✓".green().bold());
    }

    SqliteStore::new(&db_path)
        .with_context(|| format!("Failed to create database at {}", db_path.display()))?;
    println!(
        "{} Database: {}",
        "✓".green().bold(),
        db_path.display().to_string().bright_white()
    );
    Ok(())
}

pub fn handle_list(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("HAR")
        .ok_or_else(|| anyhow!("No HAR file given"))?;
    let har = load_har(path)?;
    let listing = render_listing(&har, args.get_flag("all"));

    if listing.is_empty() {
        println!("No API calls in {}", path.display());
    } else {
        print!("{}", listing);
    }
    Ok(())
}

fn entry_number(args: &ArgMatches) -> usize {
    args.get_one::<u64>("index").copied().unwrap_or(1) as usize
}

pub fn handle_generate(args: &ArgMatches, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("HAR")
        .ok_or_else(|| anyhow!("No HAR file given"))?;
    let format = args
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("curl");
    let dialect: Dialect = format.parse().map_err(|e: String| anyhow!(e))?;

    let har = load_har(path)?;
    let exchange = select_exchange(&har, entry_number(args))?;
    let excludes = HeaderSettings::new(store).load()?;

    println!("{}", render_code(exchange, dialect, &excludes));
    Ok(())
}

pub fn handle_response(args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<PathBuf>("HAR")
        .ok_or_else(|| anyhow!("No HAR file given"))?;
    let har = load_har(path)?;
    let exchange = select_exchange(&har, entry_number(args))?;

    print!(
        "{}",
        render_response(exchange, args.get_flag("headers"), args.get_flag("body"))
    );
    Ok(())
}

pub fn handle_headers(args: &ArgMatches, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let settings = HeaderSettings::new(store);

    match args.subcommand() {
        Some(("list", _)) => print!("{}", render_header_list(&settings.load()?)),
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("NAME").map(String::as_str).unwrap_or("");
            if settings.add(name)? {
                println!("{} Filtering {}", "✓".green().bold(), name.trim().to_lowercase());
            } else {
                println!("{} {} is blank or already filtered", "⚠".yellow().bold(), name);
            }
        }
        Some(("remove", sub)) => {
            let name = sub.get_one::<String>("NAME").map(String::as_str).unwrap_or("");
            if settings.remove(name)? {
                println!("{} No longer filtering {}", "✓".green().bold(), name.trim().to_lowercase());
            } else {
                println!("{} {} is not filtered", "⚠".yellow().bold(), name);
            }
        }
        Some(("preset", sub)) => {
            let name = sub.get_one::<String>("PRESET").map(String::as_str).unwrap_or("");
            let preset: Preset = name.parse().map_err(|e: String| anyhow!(e))?;
            let list = settings.apply_preset(preset)?;
            println!(
                "{} Applied {} preset ({} headers filtered)",
                "✓".green().bold(),
                preset.as_str(),
                list.len()
            );
        }
        Some(("reset", _)) => {
            let list = settings.reset()?;
            println!("{} Restored default list ({} headers)", "✓".green().bold(), list.len());
        }
        _ => bail!("Unknown headers command"),
    }
    Ok(())
}

pub async fn handle_scan(args: &ArgMatches, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let path = args
        .get_one::<PathBuf>("HAR")
        .ok_or_else(|| anyhow!("No HAR file given"))?;
    let options = ScanOptions {
        page: args.get_one::<String>("page").map(String::as_str),
        refetch: args.get_flag("refetch"),
        timeout: Duration::from_secs(args.get_one::<u64>("timeout").copied().unwrap_or(10)),
    };

    let har = load_har(path)?;
    let map_store = PageMapStore::new(store);

    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Scanning...");

    let bar = spinner.clone();
    let progress: ProgressCallback = Arc::new(move |phase: ScanPhase| bar.set_message(describe_phase(phase)));

    let result = run_scan(&har, &options, &map_store, Some(progress)).await;
    spinner.finish_and_clear();
    let report = result?;

    let page = &report.page;
    println!(
        "{} Scanned {} ({})",
        "✓".green().bold(),
        page.display_name().bright_white().bold(),
        page.framework
    );
    println!("  API calls: {}", page.apis.len());
    for api in &page.apis {
        println!(
            "    {:<7} {} {}  {}",
            api.method,
            colored_status(api.status),
            api.path,
            summary_of(api.response_schema.as_ref()).bright_black()
        );
    }
    println!("  Links: {}", page.links.len());
    Ok(())
}

pub fn handle_map(args: &ArgMatches, store: Arc<dyn KeyValueStore>) -> Result<()> {
    let map_store = PageMapStore::new(store);

    match args.subcommand() {
        Some(("show", sub)) => {
            let search = sub.get_one::<String>("search").map(String::as_str).unwrap_or("");
            print!("{}", render_page_map(&map_store.load()?, search, Utc::now()));
        }
        Some(("clear", _)) => {
            map_store.clear()?;
            println!("{} Cleared all scanned pages", "✓".green().bold());
        }
        Some(("export", sub)) => {
            let dir = sub
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("."));
            match export_map(&map_store, &dir)? {
                ExportOutcome::File(path) => {
                    println!("{} Exported {}", "✓".green().bold(), path.display())
                }
                ExportOutcome::Stdout(json) => {
                    eprintln!(
                        "{} Could not write to {}, printing instead",
                        "⚠".yellow().bold(),
                        dir.display()
                    );
                    println!("{}", json);
                }
            }
        }
        _ => bail!("Unknown map command"),
    }
    Ok(())
}
