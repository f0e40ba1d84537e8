//! CLI entry point for the exploration engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lex_explorer::{
    CleaningStrategy, ExplorerConfig, ExplorerError, Request, Response, Session, Table,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

/// CLI-compatible cleaning strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCleaningStrategy {
    /// Remove rows containing any missing value
    DropRows,
    /// Remove columns containing any missing value
    DropColumns,
    /// Fill numeric gaps with the column mean
    Mean,
    /// Fill numeric gaps with the column median
    Median,
    /// Fill every gap with zero
    Zero,
}

impl From<CliCleaningStrategy> for CleaningStrategy {
    fn from(cli: CliCleaningStrategy) -> Self {
        match cli {
            CliCleaningStrategy::DropRows => CleaningStrategy::DropRowsWithNulls,
            CliCleaningStrategy::DropColumns => CleaningStrategy::DropColumnsWithNulls,
            CliCleaningStrategy::Mean => CleaningStrategy::FillWithMean,
            CliCleaningStrategy::Median => CleaningStrategy::FillWithMedian,
            CliCleaningStrategy::Zero => CleaningStrategy::FillWithZero,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Exploratory data analysis for CSV and Excel files",
    long_about = "Profile a table, find outliers, correlate numeric columns, check trends \
                  and clean missing values.\n\n\
                  EXAMPLES:\n  \
                  lex-explorer sales.csv info\n  \
                  lex-explorer sales.csv outliers --column revenue\n  \
                  lex-explorer sales.xlsx clean --strategy median --output out/\n  \
                  lex-explorer sales.csv --json correlate | jq .data"
)]
struct Args {
    /// Path to a .csv or .xlsx file
    input: PathBuf,

    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Print the serialized response as JSON instead of a summary
    ///
    /// Disables logging so stdout only contains JSON.
    #[arg(long, global = true)]
    json: bool,

    /// IQR multiplier for outlier fences and box plot whiskers
    #[arg(long, global = true, default_value = "1.5")]
    iqr_multiplier: f64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shape, column kinds and missing counts
    Info,
    /// First rows of the table
    Preview {
        #[arg(short, long)]
        rows: Option<usize>,
    },
    /// Descriptive statistics of numeric columns
    Describe,
    /// Value frequencies of categorical columns
    Categories,
    /// IQR outliers of one numeric column
    Outliers {
        #[arg(short, long)]
        column: String,
    },
    /// Pearson correlation matrix of numeric columns
    Correlate,
    /// Direction of a numeric column over row order
    Trend {
        #[arg(short, long)]
        column: String,
    },
    /// Equal-width histogram of a numeric column
    Histogram {
        #[arg(short, long)]
        column: String,
        #[arg(short, long)]
        bins: Option<usize>,
    },
    /// Value counts of a categorical column
    Bars {
        #[arg(short, long)]
        column: String,
    },
    /// Paired values of two numeric columns
    Scatter {
        #[arg(short = 'x', long)]
        x: String,
        #[arg(short = 'y', long)]
        y: String,
    },
    /// Box plot summary of a numeric column
    Boxplot {
        #[arg(short, long)]
        column: String,
    },
    /// Handle missing values and write the cleaned CSV
    Clean {
        #[arg(short, long, value_enum)]
        strategy: CliCleaningStrategy,
        /// Directory the cleaned file is written to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

impl Command {
    fn request(&self) -> Request {
        match self {
            Command::Info => Request::Info,
            Command::Preview { rows } => Request::Preview { rows: *rows },
            Command::Describe => Request::Describe,
            Command::Categories => Request::CategoricalBreakdown,
            Command::Outliers { column } => Request::Outliers {
                column: column.clone(),
            },
            Command::Correlate => Request::Correlation,
            Command::Trend { column } => Request::Trend {
                column: column.clone(),
            },
            Command::Histogram { column, bins } => Request::Histogram {
                column: column.clone(),
                bins: *bins,
            },
            Command::Bars { column } => Request::BarCounts {
                column: column.clone(),
            },
            Command::Scatter { x, y } => Request::Scatter {
                x: x.clone(),
                y: y.clone(),
            },
            Command::Boxplot { column } => Request::BoxPlot {
                column: column.clone(),
            },
            Command::Clean { strategy, .. } => Request::Clean {
                strategy: (*strategy).into(),
            },
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries
/// the JSON response.
fn init_logging(level: &str, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.json);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ExplorerError>() {
                Some(engine) => eprintln!("error[{}]: {err:#}", engine.error_code()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = ExplorerConfig::builder()
        .iqr_multiplier(args.iqr_multiplier)
        .build()
        .map_err(ExplorerError::from)?;

    info!("Loading dataset from: {}", args.input.display());
    let session = Session::open(&args.input, config)?;
    let (rows, columns) = session.current().shape();
    info!("Dataset loaded: {rows} rows x {columns} columns");

    let response = session.execute(args.command.request())?;

    if let (Command::Clean { output, .. }, Response::Clean(outcome)) = (&args.command, &response) {
        std::fs::create_dir_all(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        let path = output.join(&outcome.artifact.file_name);
        std::fs::write(&path, &outcome.artifact.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Cleaned data written to: {}", path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    debug!("done");
    Ok(())
}

/// Human-readable output.
///
/// Uses `println!` rather than logging; this is the command's result.
fn print_response(response: &Response) {
    match response {
        Response::Preview(table) => print_table(table),
        Response::Info(info) | Response::Reset(info) => {
            println!("Rows: {}", info.rows);
            println!("Columns: {}", info.columns);
            println!("Numeric: {}", info.numeric_columns.join(", "));
            println!("Categorical: {}", info.categorical_columns.join(", "));
            println!();
            println!("{:<24} {:>8}", "Column", "Missing");
            println!("{}", "-".repeat(33));
            for nulls in &info.null_counts {
                println!("{:<24} {:>8}", truncate_str(&nulls.column, 23), nulls.missing);
            }
        }
        Response::Describe(stats) => {
            println!(
                "{:<20} {:>7} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                "Column", "Count", "Missing", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"
            );
            println!("{}", "-".repeat(110));
            for s in stats {
                println!(
                    "{:<20} {:>7} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    truncate_str(&s.column, 19),
                    s.count,
                    s.missing,
                    fmt_stat(s.mean),
                    fmt_stat(s.std),
                    fmt_stat(s.min),
                    fmt_stat(s.p25),
                    fmt_stat(s.p50),
                    fmt_stat(s.p75),
                    fmt_stat(s.max)
                );
            }
        }
        Response::CategoricalBreakdown(breakdowns) => {
            for breakdown in breakdowns {
                println!("{} ({} values)", breakdown.column, breakdown.total);
                for freq in &breakdown.frequencies {
                    println!("  {:<24} {:>8}", truncate_str(&freq.value, 23), freq.count);
                }
                println!();
            }
        }
        Response::Outliers(report) => {
            println!(
                "{}: Q1={} Q3={} IQR={} bounds=[{}, {}]",
                report.column,
                fmt_stat(report.fences.q1),
                fmt_stat(report.fences.q3),
                fmt_stat(report.fences.iqr),
                fmt_stat(report.lower()),
                fmt_stat(report.upper())
            );
            println!("Outliers: {}", report.count);
            if report.count > 0 {
                println!();
                print_table(&report.rows);
            }
        }
        Response::Correlation(matrix) => {
            print!("{:<16}", "");
            for name in &matrix.columns {
                print!(" {:>10}", truncate_str(name, 10));
            }
            println!();
            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                print!("{:<16}", truncate_str(name, 15));
                for value in row {
                    print!(" {:>10}", fmt_stat(*value));
                }
                println!();
            }
        }
        Response::Trend(trend) => {
            println!("{}: {}", trend.column, trend.verdict);
            match trend.mean_difference {
                Some(mean) => println!(
                    "Mean difference {} over {} steps",
                    fmt_stat(mean),
                    trend.defined_differences
                ),
                None => println!("No consecutive pairs with both values present"),
            }
        }
        Response::Histogram(hist) => {
            let peak = hist.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
            for bin in &hist.bins {
                let bar = "#".repeat(bin.count * 40 / peak);
                println!(
                    "[{:>10}, {:>10}] {:>6} {bar}",
                    fmt_stat(bin.start),
                    fmt_stat(bin.end),
                    bin.count
                );
            }
        }
        Response::BarCounts(chart) => {
            for bar in &chart.bars {
                println!("{:<24} {:>8}", truncate_str(&bar.value, 23), bar.count);
            }
        }
        Response::LineSeries(series) => {
            for point in &series.points {
                match point.value.get() {
                    Some(v) => println!("{:>6} {}", point.row, fmt_stat(v)),
                    None => println!("{:>6} -", point.row),
                }
            }
        }
        Response::Scatter(series) => {
            println!("{:>6} {:>12} {:>12}", "row", series.x, series.y);
            for point in &series.points {
                println!(
                    "{:>6} {:>12} {:>12}",
                    point.row,
                    fmt_stat(point.x),
                    fmt_stat(point.y)
                );
            }
        }
        Response::BoxPlot(summary) => {
            println!("{}", summary.column);
            println!("  min:      {}", fmt_stat(summary.min));
            println!("  q1:       {}", fmt_stat(summary.q1));
            println!("  median:   {}", fmt_stat(summary.median));
            println!("  q3:       {}", fmt_stat(summary.q3));
            println!("  max:      {}", fmt_stat(summary.max));
            println!(
                "  whiskers: [{}, {}]",
                fmt_stat(summary.lower_whisker),
                fmt_stat(summary.upper_whisker)
            );
            println!("  outliers: {}", summary.outliers.len());
        }
        Response::Clean(outcome) => {
            let record = &outcome.record;
            println!("{}", record.strategy);
            println!("  rows removed:    {}", record.rows_removed);
            println!("  columns removed: {}", record.columns_removed);
            println!("  cells filled:    {}", record.cells_filled);
            println!("  shape:           {} x {}", record.rows, record.columns);
            println!(
                "  written:         {} ({} bytes)",
                outcome.artifact.file_name,
                outcome.artifact.len()
            );
            println!();
            print_table(&outcome.preview);
        }
    }
}

fn print_table(table: &Table) {
    let names = table.columns();
    let rows: Vec<Vec<String>> = (0..table.row_count())
        .map(|r| {
            table
                .row(r)
                .into_iter()
                .map(|cell| cell.unwrap_or_else(|| "-".to_string()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .min(24)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<w$}", truncate_str(cell, w)))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(names.clone()));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    for row in &rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}

fn fmt_stat(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.4}")
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
