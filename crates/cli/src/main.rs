mod echo;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use owo_colors::OwoColorize;
use readmark_core::{ExtractConfig, Extractor, OutputFormat};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extract the main content of an HTML document and convert it to clean Markdown
#[derive(Parser, Debug)]
#[command(name = "readmark")]
#[command(author = "Readmark Contributors")]
#[command(version)]
#[command(about = "Extract the main content of HTML documents as Markdown", long_about = None)]
struct Args {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// URL the document was served from (default: the input path)
    #[arg(short = 'u', long, value_name = "URL")]
    source_url: Option<String>,

    /// TOML file with extraction settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum element nesting depth before subtrees are flattened
    #[arg(long, value_name = "NUM")]
    max_depth: Option<usize>,

    /// Include TOML frontmatter (Markdown) or the source field (JSON)
    #[arg(long)]
    frontmatter: bool,

    /// Include reference table with all links
    #[arg(long)]
    references: bool,

    /// Strip images from output
    #[arg(long)]
    no_images: bool,

    /// Render links as plain text
    #[arg(long)]
    no_links: bool,

    /// Fail when the input exceeds a resource limit
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "readmark=debug,readmark_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer).context("Failed to read from stdin")?;
        return Ok(String::from_utf8_lossy(&buffer).into_owned());
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        bail!("Fetching URLs is not supported: save the page locally and pass `--source-url {input}`");
    }

    let bytes = fs::read(input).with_context(|| format!("Failed to read file: {}", input))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn build_config(args: &Args) -> anyhow::Result<ExtractConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ExtractConfig::default(),
    };

    if let Some(depth) = args.max_depth {
        config.limits.max_depth = depth;
    }
    config.markdown.strip_images |= args.no_images;
    config.markdown.strip_links |= args.no_links;
    config.markdown.include_references |= args.references;

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
        echo::print_step(1, 4, &format!("Reading {}", if args.input == "-" { "stdin" } else { args.input.as_str() }));
    }

    let html = read_input(&args.input)?;
    let source = match &args.source_url {
        Some(url) => url.clone(),
        None if args.input == "-" => String::new(),
        None => args.input.clone(),
    };

    if args.verbose {
        echo::print_detail("Size", &echo::format_size(html.len()));
        eprintln!();
        echo::print_step(2, 4, "Loading configuration");
    }

    let config = build_config(&args)?;

    if args.verbose {
        if let Some(path) = &args.config {
            echo::print_detail("Config", &path.display().to_string());
        }
        echo::print_detail("Max depth", &config.limits.max_depth.to_string());
        eprintln!();
        echo::print_step(3, 4, "Extracting main content");
    }

    let extraction = Extractor::with_config(config).run(&html, &source);

    for trip in &extraction.guard_trips {
        echo::print_warning(&format!("Input exceeded a resource limit: {}", trip));
    }
    if args.strict {
        extraction.clone().into_strict().context("Strict mode rejected the input")?;
    }

    if args.verbose {
        echo::print_extraction_details(&extraction);
    }

    if extraction.result.content.is_empty() {
        bail!("No readable content found in {}", if source.is_empty() { "stdin" } else { source.as_str() });
    }

    let mut output = extraction.to_format(args.format, &source, args.frontmatter).context("Failed to render output")?;
    if !output.ends_with('\n') {
        output.push('\n');
    }

    if args.verbose {
        echo::print_step(4, 4, "Writing output");
        echo::print_detail("Format", &format!("{:?}", args.format));
        eprintln!();
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", output),
    }

    Ok(())
}
