mod echo;
mod output;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{ArgAction, ArgGroup, Parser};
use futures::stream::{self, StreamExt};
use mdscraper_core::{
    FetchConfig, HttpClient, MarkdownDocument, Pipeline, Settings, build_client, fetch_file, fetch_stdin,
    fetch_with_client,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::echo::{
    format_size, print_banner, print_error, print_info, print_preview, print_step, print_success, print_summary,
    print_warning,
};
use crate::output::OutputWriter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_JOBS: usize = 4;

/// Convert web pages to clean Markdown
#[derive(Parser, Debug)]
#[command(name = "mdscraper")]
#[command(version, about = "Convert the main content of web pages to Markdown", long_about = None)]
#[command(group(ArgGroup::new("input").multiple(false)))]
struct Args {
    /// URL of a single page to fetch and convert
    #[arg(long, value_name = "URL", group = "input")]
    url: Option<String>,

    /// Text file with one URL per line
    #[arg(long, value_name = "FILE", group = "input")]
    file: Option<String>,

    /// Seed page whose same-site links are fetched and converted
    #[arg(long, value_name = "URL", group = "input")]
    site: Option<String>,

    /// Local HTML file to convert, or "-" for stdin
    #[arg(long, value_name = "PATH", group = "input")]
    html: Option<String>,

    /// URL the --html input was saved from
    #[arg(long, value_name = "URL", requires = "html")]
    source_url: Option<String>,

    /// Output filename: %TITLE, %URL, a fixed name, or "-" for stdout
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Directory for output files
    #[arg(long, value_name = "DIR")]
    outdir: Option<String>,

    /// Root URL; links below it become relative Markdown links
    #[arg(short, long, value_name = "URL")]
    root_url: Option<String>,

    /// Tag, class, id or CSS selector of the content container
    #[arg(short, long, num_args = 1.., value_name = "HINT")]
    content: Option<Vec<String>>,

    /// Tag to prefer when matching content hints (e.g. "table")
    #[arg(long, value_name = "TAG")]
    content_type: Option<String>,

    /// Remove every image
    #[arg(short = 'i', long)]
    no_images: bool,

    /// Replace every link by its text
    #[arg(long)]
    no_links: bool,

    /// Start the output with a "Source: <url>" line
    #[arg(long)]
    prepend_source_link: bool,

    /// Start the output with the page title as a heading
    #[arg(long)]
    title_heading: bool,

    /// Glob patterns of page names skipped in site mode
    #[arg(short = 'p', long, num_args = 1.., value_name = "PATTERN")]
    exclude_pages: Option<Vec<String>>,

    /// CSS selectors removed from the content
    #[arg(short = 's', long, num_args = 1.., value_name = "SELECTOR")]
    exclude_selectors: Option<Vec<String>>,

    /// Heading levels that get an extra blank line ("all" or e.g. "1,2")
    #[arg(long, value_name = "LEVELS")]
    extra_heading_space: Option<String>,

    /// Pages converted concurrently
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// YAML or JSON settings file; flags take precedence
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Save the merged settings to the output directory and exit
    #[arg(long)]
    save_settings: bool,

    /// Log locator decisions and the content before cleaning
    #[arg(short, long)]
    debug: bool,

    /// Print progress (-v) and a preview of each page (-vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn has_input(&self) -> bool {
        self.url.is_some() || self.file.is_some() || self.site.is_some() || self.html.is_some()
    }

    /// Flags as a settings layer; unset flags stay `None`.
    fn to_settings(&self) -> Settings {
        Settings {
            url: self.url.clone(),
            file: self.file.clone(),
            site: self.site.clone(),
            output: self.output.clone(),
            outdir: self.outdir.clone(),
            root_url: self.root_url.clone(),
            content: self.content.clone(),
            content_type: self.content_type.clone(),
            no_images: self.no_images.then_some(true),
            no_links: self.no_links.then_some(true),
            prepend_source_link: self.prepend_source_link.then_some(true),
            title_heading: self.title_heading.then_some(true),
            exclude_pages: self.exclude_pages.clone(),
            exclude_selectors: self.exclude_selectors.clone(),
            extra_heading_space: self.extra_heading_space.clone(),
            jobs: self.jobs,
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            debug: self.debug.then_some(true),
            verbose: (self.verbose > 0).then_some(self.verbose),
        }
    }
}

/// What a run converts.
#[derive(Debug)]
enum Mode {
    Url(String),
    File(String),
    Site(String),
    Html { path: String, source_url: Option<String> },
}

/// Everything shared by the pages of one run.
struct Run {
    pipeline: Arc<Pipeline>,
    fetch: FetchConfig,
    exclude_pages: Vec<String>,
    jobs: usize,
    verbose: u8,
    writer: OutputWriter,
}

fn init_logging(verbose: u8, debug: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let directives = if debug { format!("{},mdscraper_core=debug", level) } else { level.to_string() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let file_settings = match &args.settings {
        Some(path) => Settings::load(path).with_context(|| format!("Failed to load settings: {}", path.display()))?,
        None => match Settings::default_path().filter(|p| p.exists()) {
            Some(path) => {
                Settings::load(&path).with_context(|| format!("Failed to load settings: {}", path.display()))?
            }
            None => Settings::default(),
        },
    };

    let mut settings = file_settings.merge(args.to_settings());
    // an input given on the command line replaces any input from the file
    if args.has_input() {
        settings.url = args.url.clone();
        settings.file = args.file.clone();
        settings.site = args.site.clone();
    }
    Ok(settings)
}

fn resolve_mode(args: &Args, settings: &Settings) -> anyhow::Result<Mode> {
    if let Some(path) = &args.html {
        return Ok(Mode::Html { path: path.clone(), source_url: args.source_url.clone() });
    }

    let inputs = [
        settings.url.clone().map(Mode::Url),
        settings.file.clone().map(Mode::File),
        settings.site.clone().map(Mode::Site),
    ];
    let mut given = inputs.into_iter().flatten();
    match (given.next(), given.next()) {
        (Some(mode), None) => Ok(mode),
        (Some(_), Some(_)) => bail!("Only one of url, file and site may be set"),
        (None, _) => bail!("No input given: use --url, --file, --site or --html"),
    }
}

/// `<outdir>/mdscraper_<YYYYmmdd_HHMM>.yaml`
fn save_settings(settings: &Settings, outdir: &Path) -> anyhow::Result<PathBuf> {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let format = time::format_description::parse("[year][month][day]_[hour][minute]")
        .context("Invalid timestamp format")?;
    let stamp = now.format(&format).context("Failed to format timestamp")?;

    let path = outdir.join(format!("mdscraper_{}.yaml", stamp));
    settings
        .save_yaml(&path)
        .with_context(|| format!("Failed to save settings: {}", path.display()))?;
    Ok(path)
}

fn parse_url(raw: &str) -> anyhow::Result<Url> {
    Url::parse(raw.trim()).with_context(|| format!("Invalid URL: {}", raw))
}

/// Fetches and converts one page.
async fn convert_page(
    client: &HttpClient, pipeline: &Pipeline, url: &Url, timeout: u64,
) -> anyhow::Result<MarkdownDocument> {
    let page = fetch_with_client(client, url.as_str(), timeout)
        .await
        .context("Failed to fetch page")?;
    let doc = pipeline
        .process_bytes(&page.body, page.charset(), Some(&page.final_url))
        .context("Failed to convert page")?;
    Ok(doc)
}

impl Run {
    fn report(&mut self, label: &str, doc: &MarkdownDocument) -> anyhow::Result<()> {
        for warning in &doc.warnings {
            print_warning(&format!("{}: left link {} unchanged ({})", label, warning.href, warning.reason));
        }

        let written = self.writer.write(&doc.filename, &doc.markdown)?;
        if self.verbose > 0 {
            let target = written
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdout".to_string());
            print_success(&format!(
                "{} → {} ({})",
                label,
                target.bright_white(),
                format_size(doc.markdown.len())
            ));
            eprintln!("  {} {}", "Content:".dimmed(), doc.method.to_string().bright_white());
            if let Some(title) = &doc.title {
                eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
            }
        }
        if self.verbose > 1 {
            print_preview(&doc.markdown);
        }
        Ok(())
    }

    /// Converts `urls` with up to `jobs` pages in flight; writing stays here.
    async fn run_batch(&mut self, urls: Vec<Url>, mut failures: Vec<(String, String)>) -> anyhow::Result<()> {
        let started = Instant::now();
        let total = urls.len();
        let attempted = total + failures.len();
        if self.verbose > 0 {
            print_info(&format!("Found {} URLs to process", total));
        }

        let client = build_client(&self.fetch).context("Failed to build HTTP client")?;
        let timeout = self.fetch.timeout;
        let pipeline = Arc::clone(&self.pipeline);

        let mut results = stream::iter(urls)
            .map(|url| {
                let client = &client;
                let pipeline = &pipeline;
                async move {
                    let result = convert_page(client, pipeline, &url, timeout).await;
                    (url, result)
                }
            })
            .buffer_unordered(self.jobs);

        let mut succeeded = 0;
        let mut done = 0;
        while let Some((url, result)) = results.next().await {
            done += 1;
            if self.verbose > 0 {
                print_step(done, total, url.as_str());
            }
            let outcome = result.and_then(|doc| self.report(url.as_str(), &doc));
            match outcome {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    print_error(&format!("{}: {:#}", url, e));
                    failures.push((url.to_string(), format!("{:#}", e)));
                }
            }
        }

        if self.verbose > 0 || !failures.is_empty() {
            print_summary(succeeded, &failures, started.elapsed());
        }
        if !failures.is_empty() {
            bail!("{} of {} pages failed", failures.len(), attempted);
        }
        Ok(())
    }

    async fn run_url(&mut self, raw: &str) -> anyhow::Result<()> {
        let url = parse_url(raw)?;
        let client = build_client(&self.fetch).context("Failed to build HTTP client")?;
        if self.verbose > 0 {
            print_step(1, 1, &format!("Fetching {}", url.as_str().bright_white().underline()));
        }
        let doc = convert_page(&client, &self.pipeline, &url, self.fetch.timeout)
            .await
            .with_context(|| format!("Failed to process {}", url))?;
        self.report(url.as_str(), &doc)
    }

    async fn run_file(&mut self, path: &str) -> anyhow::Result<()> {
        let raw = fetch_file(path).with_context(|| format!("Failed to read URL list: {}", path))?;
        let content = String::from_utf8_lossy(&raw);

        let mut urls = Vec::new();
        let mut failures = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_url(line) {
                Ok(url) => urls.push(url),
                Err(e) => {
                    print_error(&format!("{:#}", e));
                    failures.push((line.to_string(), format!("{:#}", e)));
                }
            }
        }
        self.run_batch(urls, failures).await
    }

    async fn run_site(&mut self, raw: &str) -> anyhow::Result<()> {
        let seed = parse_url(raw)?;
        let client = build_client(&self.fetch).context("Failed to build HTTP client")?;
        if self.verbose > 0 {
            print_step(1, 1, &format!("Discovering links on {}", seed.as_str().bright_white().underline()));
        }

        let page = fetch_with_client(&client, seed.as_str(), self.fetch.timeout)
            .await
            .with_context(|| format!("Failed to fetch seed page {}", seed))?;
        let links = self
            .pipeline
            .discover_site_links(&page.text(), &page.final_url, &self.exclude_pages)
            .context("Failed to discover site links")?;

        if links.is_empty() {
            print_warning(&format!("No same-site links found on {}", seed));
            return Ok(());
        }
        if self.verbose > 1 {
            for link in links.iter() {
                eprintln!("  {} {}", "Link:".dimmed(), link.as_str().bright_white());
            }
        }
        self.run_batch(links.into_vec(), Vec::new()).await
    }

    fn run_html(&mut self, path: &str, source_url: Option<&str>) -> anyhow::Result<()> {
        let source_url = source_url.map(parse_url).transpose()?;
        let raw = if path == "-" {
            fetch_stdin().context("Failed to read from stdin")?
        } else {
            fetch_file(path).with_context(|| format!("Failed to read file: {}", path))?
        };

        if self.verbose > 0 {
            eprintln!("  {} {}", "Size:".dimmed(), format_size(raw.len()).bright_white());
        }

        // local files carry no header, so the charset comes from <meta> or defaults to UTF-8
        let doc = self
            .pipeline
            .process_bytes(&raw, None, source_url.as_ref())
            .with_context(|| format!("Failed to convert {}", path))?;
        self.report(path, &doc)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;

    let verbose = settings.verbose.unwrap_or(0);
    let debug = settings.debug.unwrap_or(false);
    init_logging(verbose, debug);
    tracing::debug!(?settings, "resolved settings");

    let outdir = PathBuf::from(settings.outdir.clone().unwrap_or_else(|| ".".to_string()));

    if args.save_settings {
        let path = save_settings(&settings, &outdir)?;
        print_success(&format!("Settings saved to {}", path.display().bright_white()));
        return Ok(());
    }

    if verbose > 0 {
        print_banner();
    }

    let mode = resolve_mode(&args, &settings)?;
    let config = settings.extraction_config().context("Invalid settings")?;
    let to_stdout = settings.output.as_deref() == Some("-");
    if to_stdout && !matches!(mode, Mode::Url(_) | Mode::Html { .. }) && verbose > 0 {
        print_info("Writing every page to stdout");
    }

    if !to_stdout {
        fs::create_dir_all(&outdir).with_context(|| format!("Failed to create directory: {}", outdir.display()))?;
    }

    let mut run = Run {
        pipeline: Arc::new(Pipeline::new(config)),
        fetch: settings.fetch_config(),
        exclude_pages: settings.exclude_pages.clone().unwrap_or_default(),
        jobs: settings.jobs.unwrap_or(DEFAULT_JOBS).max(1),
        verbose,
        writer: OutputWriter::new(outdir, to_stdout),
    };

    match mode {
        Mode::Url(url) => run.run_url(&url).await,
        Mode::File(path) => run.run_file(&path).await,
        Mode::Site(url) => run.run_site(&url).await,
        Mode::Html { path, source_url } => run.run_html(&path, source_url.as_deref()),
    }
}
