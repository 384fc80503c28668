//! transpdf CLI - layout-preserving PDF translation

mod gemini;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use transpdf::{
    default_output_path, Domain, DummyTranslator, FontRegistry, JsonFormat, Metadata,
    Orchestrator, PageSelection, ParseOptions, PdfGenerator, PdfParser, RenderOptions,
    TranslateOptions, Translator,
};

use gemini::GeminiTranslator;

#[derive(Parser)]
#[command(name = "transpdf")]
#[command(version)]
#[command(about = "Translate PDF documents while keeping their layout", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a PDF into a new PDF
    Translate(TranslateArgs),

    /// Print the text elements of a PDF
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print elements as JSON
        #[arg(long)]
        json: bool,

        /// Output compact JSON
        #[arg(long, requires = "json")]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Args)]
struct TranslateArgs {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to <name>_translated.pdf next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Elements per translation batch
    #[arg(long, default_value_t = 3)]
    batch_size: usize,

    /// Translation domain: general, scientific, genetic, medical, legal, technical
    #[arg(long, default_value = "general")]
    domain: String,

    /// Keep going when an element cannot be translated; failed elements
    /// keep their original text
    #[arg(long)]
    continue_on_error: bool,

    /// Draw the original text where no translation is available
    /// (implied by --continue-on-error)
    #[arg(long)]
    partial: bool,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Use a placeholder translator instead of the API
    #[arg(long)]
    dummy: bool,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "MODEL_NAME", default_value = "gemini-1.5-pro")]
    model: String,

    /// Model used when the primary model is not available
    #[arg(long, env = "FALLBACK_MODEL", default_value = "gemini-1.5-flash")]
    fallback_model: String,

    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Request ceiling per minute (0 disables pacing)
    #[arg(long, env = "REQUESTS_PER_MINUTE", default_value_t = 20)]
    requests_per_minute: u32,

    /// First retry delay in seconds
    #[arg(long, env = "BASE_DELAY", default_value_t = 1.0)]
    base_delay: f64,

    /// Timeout of a single API request in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Directory of .ttf/.otf fonts to embed
    #[arg(long, env = "FONT_DIR", default_value = "fonts")]
    font_dir: PathBuf,

    /// Font family used for translated text
    #[arg(long, env = "DEFAULT_FONT", default_value = "Vazirmatn")]
    default_font: String,
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Translate(args) => cmd_translate(args),
        Commands::Extract {
            input,
            output,
            json,
            compact,
            pages,
        } => cmd_extract(&input, output.as_deref(), json, compact, pages.as_deref()),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?),
        None => Ok(PageSelection::All),
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Source metadata marked as a translation.
fn output_metadata(source: &Metadata, input: &Path) -> Metadata {
    let title = match source.title.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(title) => title.to_string(),
        None => input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    Metadata {
        title: Some(format!("{} (translated)", title)),
        creator: Some("transpdf".to_string()),
        producer: Some("transpdf".to_string()),
        ..source.clone()
    }
}

fn build_translator(args: &TranslateArgs) -> Result<Box<dyn Translator>, Box<dyn std::error::Error>> {
    if args.dummy {
        return Ok(Box::new(DummyTranslator));
    }
    let api_key = args
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or("GEMINI_API_KEY is not set (use --dummy to run without the API)")?;
    let translator = GeminiTranslator::new(api_key, &args.model, Duration::from_secs(args.timeout))?
        .with_fallback_model(&args.fallback_model);
    log::info!("Using model {}", translator.model());
    Ok(Box::new(translator))
}

fn cmd_translate(args: TranslateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let domain: Domain = args.domain.parse()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    let mut fonts = FontRegistry::new(&args.default_font);
    let loaded = fonts.load_dir(&args.font_dir)?;
    if loaded == 0 {
        println!(
            "{} no fonts in {}, right-to-left text may not render",
            "Warning:".yellow().bold(),
            args.font_dir.display()
        );
    }

    let translator = build_translator(&args)?;

    println!("{} {}", "Reading".cyan(), args.input.display());
    let pages = page_selection(args.pages.as_deref())?;
    let parse_options = ParseOptions::new().with_pages(pages.clone());
    let parser = PdfParser::open_with_options(&args.input, parse_options)?;
    let info = parser.document_info()?;
    let mut elements = parser.extract_elements()?;
    println!(
        "{} {} text elements on {} pages",
        "Found".cyan(),
        elements.len(),
        info.page_count()
    );

    let options = TranslateOptions::new()
        .with_batch_size(args.batch_size)
        .with_max_retries(args.max_retries)
        .with_base_delay(Duration::from_secs_f64(args.base_delay.max(0.0)))
        .with_requests_per_minute(args.requests_per_minute)
        .with_request_timeout(Duration::from_secs(args.timeout))
        .with_domain(domain)
        .with_continue_on_error(args.continue_on_error);

    let pb = progress_bar(elements.len() as u64);
    pb.set_message(format!("Translating ({})", domain));
    let report = {
        let mut orchestrator = Orchestrator::new(translator.as_ref(), options)
            .with_progress(|done, _| pb.set_position(done as u64));
        orchestrator.translate_elements(&mut elements)
    };
    let report = match report {
        Ok(report) => {
            pb.finish_with_message("Translated");
            report
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };

    let render_options = RenderOptions::new().with_partial(args.partial || args.continue_on_error);
    let generation = PdfGenerator::new(&fonts, render_options)
        .with_metadata(output_metadata(&info.metadata, &args.input))
        .with_pages(pages)
        .generate(&args.input, &elements, &output)?;

    println!("\n{}", "Summary".green().bold());
    println!("  {} translated: {}", "├─".dimmed(), report.translated);
    println!("  {} skipped:    {}", "├─".dimmed(), report.skipped);
    println!("  {} failed:     {}", "├─".dimmed(), report.failed);
    println!("  {} drawn:      {}", "└─".dimmed(), generation.elements_drawn);
    for (index, error) in &report.errors {
        println!("  {} element {}: {}", "!".red(), index, error);
    }
    if report.failed > 0 {
        println!(
            "{} {} elements kept their original text",
            "Note:".yellow(),
            report.failed
        );
    }
    println!("{} {}", "Saved to".green(), output.display());
    Ok(())
}

fn cmd_extract(
    input: &Path,
    output: Option<&Path>,
    json: bool,
    compact: bool,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = ParseOptions::new().with_pages(page_selection(pages)?);
    let elements = transpdf::extract_elements_with_options(input, options)?;

    let text = if json {
        let format = if compact {
            JsonFormat::Compact
        } else {
            JsonFormat::Pretty
        };
        transpdf::render::to_json(&elements, format)?
    } else {
        let mut out = String::new();
        for element in &elements {
            let bbox = element.bbox();
            out.push_str(&format!(
                "[page {} @ {:.0},{:.0} {} {:.1}pt]\n{}\n\n",
                element.page_index + 1,
                bbox.x0,
                bbox.y0,
                element.font_name,
                element.font_size,
                element.text
            ));
        }
        out
    };

    if let Some(path) = output {
        fs::write(path, &text)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", text);
    }
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let parser = PdfParser::open(input)?;
    let info = parser.document_info()?;
    let elements = parser.extract_elements()?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), parser.backend().version());
    println!("{}: {}", "Pages".bold(), info.page_count());
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if parser.backend().is_encrypted() { "Yes" } else { "No" }
    );
    for (key, value) in info.metadata.text_fields() {
        println!("{}: {}", key.bold(), value);
    }
    if let Some(created) = info.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(modified) = info.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (index, page) in info.pages.iter().enumerate() {
        let count = elements.iter().filter(|e| e.page_index == index).count();
        println!(
            "{:>4}: {:.0} x {:.0} pt, rotation {}, {} text elements",
            index + 1,
            page.width,
            page.height,
            page.rotation,
            count
        );
    }
    Ok(())
}
