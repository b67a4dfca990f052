//! Interactive shell for the cleaning session.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datawash::table::write_csv;
use datawash::{
    ImputationStrategy, OutlierTreatment, Session, SessionConfig, TreatmentSelection, WashError,
    WorkingTable,
};
use dotenv::dotenv;
use polars::prelude::DataFrame;
use serde::Serialize;
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Interactive CSV cleaning shell",
    long_about = "Load a CSV file, inspect and impute its missing values, \
                  clean it and export it.\n\n\
                  Imputation is staged: `process` builds a candidate table that only replaces\n\
                  the data after `save`.\n\n\
                  EXAMPLES:\n  \
                  # Start with a file loaded\n  \
                  datawash -i data.csv\n\n  \
                  # Machine-readable output for scripting\n  \
                  printf 'missing\\nquit\\n' | datawash -i data.csv --json"
)]
struct Args {
    /// CSV file to load at startup
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON file with session configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Print every command result as one JSON line
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long)]
    json: bool,
}

/// One line typed into the shell.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Load a CSV file, replacing the current data
    Load { path: PathBuf },
    /// Show the first rows of the data
    Head { rows: Option<usize> },
    /// Show missing values of unprocessed columns
    Missing,
    /// Suggest an imputation strategy per column
    Advise,
    /// Choose strategies, e.g. `select age=mean city=mode`
    Select {
        #[arg(required = true, value_parser = parse_choice)]
        choices: Vec<(String, ImputationStrategy)>,
    },
    /// Apply the current selection to a candidate table
    Process,
    /// Show the first rows of the candidate table
    Preview { rows: Option<usize> },
    /// Commit the candidate table
    Save,
    /// Drop the candidate table
    Discard,
    /// Remove duplicate rows
    Dedup,
    /// Detect outliers in a column, optionally treating them
    Outliers {
        column: String,
        #[arg(value_parser = parse_treatment)]
        treatment: Option<OutlierTreatment>,
    },
    /// One-hot encode categorical columns (all when none given)
    Encode { columns: Vec<String> },
    /// Drop numeric columns with variance at or below the threshold
    Variance { threshold: Option<f64> },
    /// Write the data to CSV
    Export { path: Option<PathBuf> },
    /// Show the action history
    History,
    /// Show the session status
    Status,
    /// List commands
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

fn parse_choice(raw: &str) -> std::result::Result<(String, ImputationStrategy), String> {
    let (column, strategy) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <column>=<strategy>, got '{}'", raw))?;
    Ok((column.trim().to_string(), strategy.parse()?))
}

fn parse_treatment(raw: &str) -> std::result::Result<OutlierTreatment, String> {
    raw.parse()
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Shell state on top of the session: output mode and the pending selection.
struct Shell {
    session: Session,
    selection: Option<TreatmentSelection>,
    json: bool,
}

enum Flow {
    Continue,
    Quit,
}

fn main() -> Result<()> {
    // Load environment variables from .env file before RUST_LOG is read
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    debug!("Session config: {:?}", config);

    let mut shell = Shell {
        session: Session::new(config),
        selection: None,
        json: args.json,
    };

    if let Some(input) = &args.input {
        shell.execute(ShellCommand::Load {
            path: input.clone(),
        });
    }

    shell.run(io::stdin().lock())
}

impl Shell {
    fn run(&mut self, input: impl BufRead) -> Result<()> {
        if !self.json {
            println!("datawash {} - type `help` for commands", env!("CARGO_PKG_VERSION"));
        }
        self.prompt()?;

        for line in input.lines() {
            let line = line.context("Failed to read command")?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                self.prompt()?;
                continue;
            }

            match ShellLine::try_parse_from(tokens) {
                Ok(parsed) => {
                    if let Flow::Quit = self.execute(parsed.command) {
                        return Ok(());
                    }
                }
                Err(e) => self.usage_error(&e.to_string()),
            }
            self.prompt()?;
        }

        info!("Input closed, leaving shell");
        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        if !self.json {
            print!("datawash> ");
            io::stdout().flush()?;
        }
        Ok(())
    }

    fn execute(&mut self, command: ShellCommand) -> Flow {
        let result = match command {
            ShellCommand::Quit => return Flow::Quit,
            ShellCommand::Help => {
                self.help();
                Ok(())
            }
            other => self.dispatch(other),
        };

        if let Err(e) = result {
            self.report_error(&e);
        }
        Flow::Continue
    }

    fn dispatch(&mut self, command: ShellCommand) -> datawash::Result<()> {
        match command {
            ShellCommand::Load { path } => {
                let summary = self.session.upload_path(&path)?;
                self.selection = None;
                self.emit(&summary, || {
                    let columns: Vec<String> = summary
                        .columns
                        .iter()
                        .map(|c| format!("{} ({})", c.name, c.kind))
                        .collect();
                    format!(
                        "Loaded {} rows from {}\nColumns: {}",
                        summary.rows,
                        summary.source,
                        columns.join(", ")
                    )
                });
            }
            ShellCommand::Head { rows } => {
                let head = self.session.head(rows)?;
                self.emit_frame(head)?;
            }
            ShellCommand::Missing => {
                let report = self.session.remaining_missing()?;
                self.emit(&report, || {
                    if report.is_empty() {
                        return "No missing values left to treat".to_string();
                    }
                    let mut text = format!(
                        "{:<24} {:<12} {:>8} {:>9}",
                        "Column", "Kind", "Missing", "Missing %"
                    );
                    for col in &report.columns {
                        text.push_str(&format!(
                            "\n{:<24} {:<12} {:>8} {:>8.1}%",
                            col.name,
                            col.kind.to_string(),
                            col.missing_count,
                            col.missing_percentage
                        ));
                    }
                    text
                });
            }
            ShellCommand::Advise => {
                let advice = self.session.advise()?;
                self.emit(&advice, || {
                    if advice.is_empty() {
                        return "Nothing to advise: no missing values left".to_string();
                    }
                    advice
                        .iter()
                        .map(|a| a.message.clone())
                        .collect::<Vec<_>>()
                        .join("\n")
                });
            }
            ShellCommand::Select { choices } => {
                let selection = self.session.select(&choices)?;
                self.emit(&selection, || {
                    let chosen: Vec<String> = selection
                        .choices()
                        .iter()
                        .map(|(c, s)| format!("{}={}", c, s))
                        .collect();
                    format!("Selected {}; run `process` to preview", chosen.join(" "))
                });
                self.selection = Some(selection);
            }
            ShellCommand::Process => {
                let selection = self.selection.clone().ok_or(WashError::EmptySelection)?;
                let json = self.json;
                let outcome = self.session.process(&selection)?;
                let payload = json!({
                    "applied": outcome.applied,
                    "warnings": outcome.warnings,
                });
                let text = {
                    let mut lines: Vec<String> = outcome
                        .applied
                        .iter()
                        .map(|a| match &a.fill_value {
                            Some(v) => format!(
                                "{}: {} filled with {} ({})",
                                a.column, a.filled, v, a.strategy
                            ),
                            None => format!("{}: left unchanged ({})", a.column, a.strategy),
                        })
                        .collect();
                    lines.extend(outcome.warnings.iter().map(|w| format!("warning: {}", w)));
                    lines.push(
                        "Run `preview` to inspect, `save` to commit or `discard`".to_string(),
                    );
                    lines.join("\n")
                };
                print_output(json, &payload, text);
            }
            ShellCommand::Preview { rows } => {
                let preview = self.session.preview(rows)?;
                self.emit_frame(preview)?;
            }
            ShellCommand::Save => {
                let report = self.session.save()?;
                self.selection = None;
                self.emit(&report, || {
                    format!(
                        "Saved. Processed: {}. {} columns still have missing values",
                        report.newly_processed.join(", "),
                        report.remaining.columns.len()
                    )
                });
            }
            ShellCommand::Discard => {
                let dropped = self.session.discard();
                self.emit(&json!({ "discarded": dropped }), || {
                    if dropped {
                        "Candidate discarded".to_string()
                    } else {
                        "Nothing to discard".to_string()
                    }
                });
            }
            ShellCommand::Dedup => {
                let removed = self.session.remove_duplicates()?;
                self.emit(&json!({ "removed": removed }), || {
                    format!("Removed {} duplicate rows", removed)
                });
            }
            ShellCommand::Outliers { column, treatment } => match treatment {
                None => {
                    let report = self.session.detect_outliers(&column)?;
                    self.emit(&report, || {
                        format!(
                            "{}: Q1={:.3} Q3={:.3} IQR={:.3} bounds=[{:.3}, {:.3}]; {} outliers",
                            report.column,
                            report.fence.q1,
                            report.fence.q3,
                            report.fence.iqr,
                            report.fence.lower,
                            report.fence.upper,
                            report.outlier_count
                        )
                    });
                }
                Some(treatment) => {
                    let summary = self.session.treat_outliers(&column, treatment)?;
                    self.emit(&summary, || {
                        format!(
                            "{}: {} outliers treated ({:?}), {} rows removed",
                            column,
                            summary.report.outlier_count,
                            summary.treatment,
                            summary.rows_removed
                        )
                    });
                }
            },
            ShellCommand::Encode { columns } => {
                let subset = (!columns.is_empty()).then_some(columns.as_slice());
                let summary = self.session.one_hot_encode(subset)?;
                self.emit(&summary, || {
                    if summary.is_empty() {
                        return "No categorical columns to encode".to_string();
                    }
                    summary
                        .encoded
                        .iter()
                        .map(|e| format!("{} -> {}", e.source, e.indicators.join(", ")))
                        .collect::<Vec<_>>()
                        .join("\n")
                });
            }
            ShellCommand::Variance { threshold } => {
                let removed = self.session.drop_low_variance(threshold)?;
                self.emit(&json!({ "removed": removed }), || {
                    if removed.is_empty() {
                        "No low-variance columns found".to_string()
                    } else {
                        format!("Removed: {}", removed.join(", "))
                    }
                });
            }
            ShellCommand::Export { path } => {
                let written = match path {
                    Some(path) => self.session.export_to(path)?,
                    None => self.session.export_default()?,
                };
                self.emit(&json!({ "path": written }), || {
                    format!("Exported to {}", written.display())
                });
            }
            ShellCommand::History => {
                let entries: Vec<_> = self.session.history().collect();
                self.emit(&entries, || {
                    entries
                        .iter()
                        .map(|h| {
                            format!(
                                "{} {:?}: {} ({} x {})",
                                h.timestamp.format("%H:%M:%S"),
                                h.action,
                                h.detail,
                                h.rows_after,
                                h.columns_after
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                });
            }
            ShellCommand::Status => {
                let status = self.session.status();
                self.emit(&status, || {
                    if !status.loaded {
                        return "No data loaded".to_string();
                    }
                    format!(
                        "{} rows x {} columns, stage: {:?}, processed: [{}], \
                         {} columns with missing values",
                        status.rows,
                        status.columns,
                        status.phase,
                        status.processed.join(", "),
                        status.remaining_missing_columns
                    )
                });
            }
            ShellCommand::Help | ShellCommand::Quit => {}
        }
        Ok(())
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) {
        if self.json {
            print_output(true, value, String::new());
        } else {
            print_output(false, value, text());
        }
    }

    fn emit_frame(&self, frame: DataFrame) -> datawash::Result<()> {
        if self.json {
            let mut csv = Vec::new();
            write_csv(&WorkingTable::from_frame(frame), &mut csv)?;
            print_output(true, &json!({ "csv": String::from_utf8_lossy(&csv) }), String::new());
        } else {
            println!("{}", frame);
        }
        Ok(())
    }

    fn report_error(&self, e: &WashError) {
        if !e.is_recoverable() {
            error!("{}", e);
        }
        if self.json {
            println!("{}", json!({ "error": e }));
        } else {
            println!("Error [{}]: {}", e.error_code(), e);
        }
    }

    fn usage_error(&self, message: &str) {
        if self.json {
            println!("{}", json!({ "error": { "code": "USAGE", "message": message.trim() } }));
        } else {
            println!("{}", message.trim_end());
        }
    }

    fn help(&self) {
        let commands = [
            ("load <path>", "Load a CSV file, replacing the current data"),
            ("head [n]", "Show the first rows"),
            ("missing", "Missing values of unprocessed columns"),
            ("advise", "Suggested strategy per column"),
            ("select <col>=<strategy>...", "Strategies: mean median mode knn unknown none"),
            ("process", "Build the candidate table"),
            ("preview [n]", "Show the candidate table"),
            ("save", "Commit the candidate table"),
            ("discard", "Drop the candidate table"),
            ("dedup", "Remove duplicate rows"),
            ("outliers <col> [remove|cap|mean]", "Detect or treat IQR outliers"),
            ("encode [cols...]", "One-hot encode categorical columns"),
            ("variance [threshold]", "Drop low-variance numeric columns"),
            ("export [path]", "Write the data to CSV"),
            ("history", "Show the action history"),
            ("status", "Show the session status"),
            ("quit", "Leave the shell"),
        ];
        if self.json {
            let listing: Vec<_> = commands
                .iter()
                .map(|(usage, about)| json!({ "usage": usage, "about": about }))
                .collect();
            println!("{}", json!({ "commands": listing }));
        } else {
            for (usage, about) in commands {
                println!("  {:<36} {}", usage, about);
            }
        }
    }
}

/// Print a command result, as one JSON line or as text.
fn print_output<T: Serialize>(json: bool, value: &T, text: String) {
    if json {
        match serde_json::to_string(value) {
            Ok(line) => println!("{}", line),
            Err(e) => println!("{}", json!({ "error": WashError::from(e) })),
        }
    } else {
        println!("{}", text);
    }
}
