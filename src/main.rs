//! hspkit: grouped access to tabular alignment-search output
//!
//! Usage: hspkit <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use hspkit::config;
use hspkit::filtering::{HspFilter, IdentityCoverageFilter};
use hspkit::ranking::{BestHspRanking, HitRanking};
use hspkit::reader::RecordReader;
use hspkit::record::Record;
use hspkit::tabular::{HspError, TabularReader, TabularWriter, OUTFMT};
use hspkit::writer::RecordWriter;

#[derive(Parser)]
#[command(name = "hspkit")]
#[command(version)]
#[command(
    about = "Group, rank and filter tabular alignment-search output",
    long_about = None,
    after_help = format!("Input must be produced with -outfmt \"{}\"", OUTFMT)
)]
struct Cli {
    /// Fail when rows for a query or subject are not contiguous, instead of
    /// starting a new record or hit
    #[arg(long, global = true)]
    strict: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-emit records, one row per HSP
    View {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Sort the hits of each query by their best HSP (lowest e-value, then
    /// highest bit score)
    Sort {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Drop HSPs below identity or query coverage thresholds
    Filter {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Minimum percent identity
        #[arg(long, default_value = "0")]
        pident: f64,

        /// Minimum query coverage per HSP
        #[arg(long, default_value = "0")]
        qcovhsp: f64,
    },

    /// Keep only the best hit of each query
    Best {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print query, hit and HSP counts
    Stats {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("hspkit=debug,info")
    } else {
        EnvFilter::new("hspkit=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    config::set_strict_grouping(cli.strict);

    let result = match cli.command {
        Commands::View { input } => run_records(input, |_| true),
        Commands::Sort { input } => run_records(input, |record| {
            BestHspRanking.sort(record);
            true
        }),
        Commands::Filter {
            input,
            pident,
            qcovhsp,
        } => {
            let filter = IdentityCoverageFilter::new(pident, qcovhsp);
            tracing::debug!(?filter, "filtering");
            run_records(input, move |record| {
                filter.filter(record);
                !record.is_empty()
            })
        }
        Commands::Best { input } => run_records(input, |record| {
            if let Some(best) = BestHspRanking.best(record).cloned() {
                let mut only = Record::new(record.qseqid(), record.qlen());
                only.add(best);
                *record = only;
                true
            } else {
                false
            }
        }),
        Commands::Stats { input } => run_stats(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

type InputReader = TabularReader<Box<dyn Read>>;

/// Open the input file, or stdin for `None` and `-`.
fn open_input(input: Option<PathBuf>) -> Result<RecordReader<InputReader>, HspError> {
    let reader: InputReader = match input {
        Some(path) if path.to_string_lossy() != "-" => {
            let file: Box<dyn Read> = Box::new(File::open(&path)?);
            tracing::debug!(path = %path.display(), "reading");
            TabularReader::with_name(file, path.display().to_string())
        }
        _ => {
            let stdin: Box<dyn Read> = Box::new(io::stdin().lock());
            TabularReader::with_name(stdin, "<stdin>")
        }
    };
    RecordReader::new(reader)
}

/// Stream records from input to stdout, passing each through `apply`.
///
/// Records for which `apply` returns false are not written.
fn run_records<F>(input: Option<PathBuf>, mut apply: F) -> Result<(), HspError>
where
    F: FnMut(&mut Record) -> bool,
{
    let mut reader = open_input(input)?;
    let stdout = io::stdout();
    let mut writer = RecordWriter::new(TabularWriter::with_name(stdout.lock(), "<stdout>"))?;

    let mut rows_written = 0;
    for record in reader.by_ref() {
        let mut record = record?;
        if apply(&mut record) {
            rows_written += writer.write(&record)?;
        }
    }
    writer.flush()?;

    tracing::debug!(stats = %reader.stats(), rows_written, "done");
    Ok(())
}

fn run_stats(input: Option<PathBuf>) -> Result<(), HspError> {
    let mut reader = open_input(input)?;

    let mut records = 0usize;
    let mut hits = 0usize;
    let mut hsps = 0usize;
    for record in reader.by_ref() {
        let record = record?;
        records += 1;
        hits += record.count();
        hsps += record.hsp_count();
    }
    tracing::debug!(stats = %reader.stats(), "done");

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "queries\t{}", records)?;
    writeln!(handle, "hits\t{}", hits)?;
    writeln!(handle, "hsps\t{}", hsps)?;
    Ok(())
}
