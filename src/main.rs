use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use xlsxfacts::{
    merge_facts, read_facts_csv, write_facts, DedupKey, ExtractionConfig, ExtractorBuilder,
    OutputFormat, SheetSelector, SignNormalizer, XlsxToFactsError,
};

#[derive(Parser)]
#[command(
    name = "xlsxfacts",
    version,
    about = "Flatten monthly ledger workbooks into (period_end, account, remark_item, amount) facts."
)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract long-format facts from a workbook.
    Extract {
        /// Workbook to read (xlsx, xlsm, xls, ods)
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Only extract the named sheet (repeatable)
        #[arg(long = "sheet")]
        sheets: Vec<String>,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fiscal start year for month-only sheet names (default: inferred from the file name)
        #[arg(long = "fiscal-year")]
        fiscal_year: Option<i32>,
        /// Fail on the first sheet without a header or required columns
        #[arg(long)]
        strict: bool,
        /// Sort records by period_end, account, remark_item
        #[arg(long)]
        sort: bool,
    },
    /// Merge fact CSV files, sorted by period and deduplicated.
    Merge {
        /// Fact CSV files to merge, in priority order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
        /// Fields that identify a duplicate
        #[arg(long, value_enum, default_value_t = Key::Item)]
        key: Key,
    },
    /// Normalize signs (income positive, everything else negative) and print a summary.
    Sign {
        /// Fact CSV file
        input: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
        /// Account name treated as income (repeatable)
        #[arg(long = "income", required = true)]
        income: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Key {
    /// period_end, account, remark_item
    Item,
    /// all four fields
    All,
}

impl From<Key> for DedupKey {
    fn from(key: Key) -> Self {
        match key {
            Key::Item => DedupKey::Item,
            Key::All => DedupKey::All,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            format,
            sheets,
            config,
            fiscal_year,
            strict,
            sort,
        } => extract(
            &input,
            output.as_deref(),
            format.into(),
            sheets,
            config.as_deref(),
            fiscal_year,
            strict,
            sort,
        ),
        Commands::Merge { inputs, output, key } => merge(&inputs, &output, key.into()),
        Commands::Sign {
            input,
            output,
            income,
        } => sign(&input, &output, &income),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn extract(
    input: &Path,
    output: Option<&Path>,
    format: OutputFormat,
    sheets: Vec<String>,
    config: Option<&Path>,
    fiscal_year: Option<i32>,
    strict: bool,
    sort: bool,
) -> Result<(), XlsxToFactsError> {
    let config = match config {
        Some(path) => ExtractionConfig::from_json_reader(File::open(path)?)?,
        None => ExtractionConfig::default(),
    };

    let mut builder = ExtractorBuilder::new().with_config(config);
    if !sheets.is_empty() {
        builder = builder.with_sheet_selector(SheetSelector::Names(sheets));
    }
    if let Some(year) = fiscal_year {
        builder = builder.with_fiscal_start_year(year);
    }
    if strict {
        builder = builder.skip_failed_sheets(false);
    }
    if sort {
        builder = builder.sort_records(true);
    }
    let extractor = builder.build()?;

    let report = extractor.extract_path(input)?;
    for skipped in &report.skipped {
        eprintln!("skipped sheet '{}': {}", skipped.sheet, first_line(&skipped.reason));
    }

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_facts(&report.records, &mut writer, format)?;
            writer.flush()?;
            println!("Wrote {} records to {}", report.records.len(), path.display());
        }
        None => {
            let mut writer = BufWriter::new(io::stdout().lock());
            write_facts(&report.records, &mut writer, format)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn merge(inputs: &[PathBuf], output: &Path, key: DedupKey) -> Result<(), XlsxToFactsError> {
    let mut sets = Vec::with_capacity(inputs.len());
    for path in inputs {
        let records = read_facts_csv(File::open(path)?)?;
        info!(path = %path.display(), records = records.len(), "fact file loaded");
        sets.push(records);
    }
    let total: usize = sets.iter().map(Vec::len).sum();
    let merged = merge_facts(sets, key);

    let mut writer = BufWriter::new(File::create(output)?);
    write_facts(&merged, &mut writer, OutputFormat::Csv)?;
    writer.flush()?;
    println!(
        "Merged {} records into {} ({} duplicates dropped)",
        total,
        output.display(),
        total - merged.len()
    );
    Ok(())
}

fn sign(input: &Path, output: &Path, income: &[String]) -> Result<(), XlsxToFactsError> {
    let records = read_facts_csv(File::open(input)?)?;
    let normalizer = SignNormalizer::new(income);
    let signed = normalizer.apply(&records);

    let mut writer = BufWriter::new(File::create(output)?);
    write_facts(&signed, &mut writer, OutputFormat::Csv)?;
    writer.flush()?;

    let summary = normalizer.summarize(&records);
    println!("Income:  {:>15.0}", summary.income);
    println!("Expense: {:>15.0}", summary.expense);
    println!("Net:     {:>15.0}", summary.net);
    for (month, net) in &summary.monthly {
        println!("  {month}  {net:>15.0}");
    }
    Ok(())
}

/// Skip reasons for missing headers carry a multi-line preview.
fn first_line(reason: &str) -> &str {
    reason.lines().next().unwrap_or(reason)
}
