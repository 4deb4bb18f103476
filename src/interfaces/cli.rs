use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::application::use_cases::document_extraction::DocumentStats;
use crate::application::use_cases::evaluation::{evaluate_test_cases, EvaluationReport};
use crate::application::use_cases::history_stats::{
    aggregate_history, successful_runs, HistorySummary,
};
use crate::application::use_cases::session::SessionContext;
use crate::application::use_cases::test_generation::{GenerationOutcome, GenerationRequest};
use crate::domain::comparison::ComparisonRecord;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMProvider;
use crate::domain::run_metrics::RunMetrics;
use crate::domain::test_case::TestCase;
use crate::interfaces::http::start_server;
use crate::interfaces::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "testcraft", version)]
#[command(about = "Generate test cases from requirement documents and track their quality")]
pub struct Cli {
    /// Directory holding metrics.json and comparisons.json.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a requirement document and ask the model for test cases.
    Generate(GenerateArgs),
    /// Structural quality of a test case batch stored as JSON.
    Evaluate {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Compare a manual batch against a generated one.
    Compare(CompareArgs),
    /// Aggregate statistics over the run history.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Saved comparisons.
    Comparisons {
        #[arg(long)]
        json: bool,
    },
    /// Models available to the configured key.
    Models {
        #[arg(long)]
        provider: Option<LLMProvider>,
    },
    /// Manage API keys in the OS keyring.
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Requirement document (.txt, .pdf, .docx or .doc).
    pub file: PathBuf,
    #[arg(long)]
    pub provider: Option<LLMProvider>,
    #[arg(long)]
    pub model: Option<String>,
    /// Language the test cases are written in.
    #[arg(long)]
    pub language: Option<String>,
    /// Write the generated test cases to this JSON file.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Manual test cases (JSON array) to compare the generated batch against.
    #[arg(long, value_name = "MANUAL.json")]
    pub compare: Option<PathBuf>,
    /// Comparison name, used with --compare.
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub no_save_metrics: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[arg(long)]
    pub manual: PathBuf,
    #[arg(long)]
    pub generated: PathBuf,
    /// Requirement document the batches were written for.
    #[arg(long)]
    pub requirement: Option<PathBuf>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub json: bool,
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    Set { provider: LLMProvider, key: String },
    Delete { provider: LLMProvider },
}

/// Run every command except `serve`, which needs the actix runtime.
pub async fn execute(command: Command, state: &AppState) -> Result<()> {
    match command {
        Command::Generate(args) => generate(args, state).await,
        Command::Evaluate { file, json } => {
            let batch = load_batch(&file)?;
            let report = evaluate_test_cases(&batch);
            if json {
                print_json(&report)?;
            } else {
                print!("{}", render_evaluation(&report));
            }
            Ok(())
        }
        Command::Compare(args) => {
            let manual = load_batch(&args.manual)?;
            let generated = load_batch(&args.generated)?;
            let requirement_text = match &args.requirement {
                Some(path) => std::fs::read_to_string(path)?,
                None => String::new(),
            };
            let record = state.comparison_use_case.compare(
                &manual,
                &generated,
                &requirement_text,
                args.name,
                !args.no_save,
            );
            if args.json {
                print_json(&record)?;
            } else {
                print!("{}", render_comparison(&record));
            }
            Ok(())
        }
        Command::Stats { json } => {
            let history = state.run_history();
            let summary = aggregate_history(&history);
            if json {
                print_json(&summary)?;
            } else {
                print!("{}", render_stats(summary.as_ref(), &history));
            }
            Ok(())
        }
        Command::Comparisons { json } => {
            let records = state.comparison_use_case.history();
            if json {
                print_json(&records)?;
            } else if records.is_empty() {
                println!("No saved comparisons.");
            } else {
                for record in &records {
                    print!("{}", render_comparison(record));
                    println!();
                }
            }
            Ok(())
        }
        Command::Models { provider } => {
            let config = state.llm_config(provider, None);
            for model in state.llm_client.list_models(&config).await? {
                println!("{}", model);
            }
            Ok(())
        }
        Command::Key { command } => match command {
            KeyCommand::Set { provider, key } => {
                state.config_service.save_api_key(provider, &key)?;
                println!("Stored API key for {}.", provider);
                Ok(())
            }
            KeyCommand::Delete { provider } => {
                state.config_service.delete_api_key(provider)?;
                println!("Deleted API key for {}.", provider);
                Ok(())
            }
        },
        Command::Serve { .. } => Err(AppError::Internal(
            "serve must run on the HTTP runtime".to_string(),
        )),
    }
}

/// Block on the HTTP API until it shuts down.
pub fn serve(state: AppState, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let state = std::sync::Arc::new(state);

    actix_web::rt::System::new().block_on(async move {
        let server = start_server(state, &host, port)?;
        server.await?;
        Ok::<(), AppError>(())
    })
}

async fn generate(args: GenerateArgs, state: &AppState) -> Result<()> {
    let bytes = std::fs::read(&args.file)?;
    let file_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| {
            AppError::ValidationError(format!("Not a file path: {}", args.file.display()))
        })?;

    // load before the model call so a bad path does not waste a generation
    let manual = args.compare.as_deref().map(load_batch).transpose()?;

    let request = GenerationRequest {
        file_name,
        bytes,
        config: state.llm_config(args.provider, args.model),
        language: state.language_or_default(args.language),
        save_metrics: state.config.save_metrics && !args.no_save_metrics,
    };
    let outcome = state.test_generation_use_case.execute(request).await?;

    if let Some(path) = &args.output {
        let body = serde_json::to_string_pretty(&outcome.test_cases)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        std::fs::write(path, body)?;
        tracing::info!(path = %path.display(), "Test cases written");
    }

    let comparison = match manual {
        Some(manual) => {
            let mut session = SessionContext::new();
            session.record_generation(
                outcome.test_cases.clone(),
                outcome.requirement_text.clone(),
            );
            Some(state.comparison_use_case.compare_with_session(
                &session,
                &manual,
                args.name,
                true,
            )?)
        }
        None => None,
    };

    if args.json {
        print_json(&serde_json::json!({
            "outcome": outcome,
            "comparison": comparison,
        }))?;
    } else {
        print!("{}", render_outcome(&outcome));
        if let Some(record) = &comparison {
            println!();
            print!("{}", render_comparison(record));
        }
    }
    Ok(())
}

pub fn load_batch(path: &Path) -> Result<Vec<TestCase>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::ValidationError(format!(
            "{} is not a JSON array of test cases: {}",
            path.display(),
            e
        ))
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(|e| AppError::Internal(e.to_string()))?;
    println!("{}", body);
    Ok(())
}

fn seconds(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}s", v))
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_outcome(outcome: &GenerationOutcome) -> String {
    let mut out = String::new();
    let DocumentStats { characters, words } = outcome.document;
    let metrics = &outcome.metrics;

    let _ = writeln!(out, "Document: {} characters, {} words", characters, words);
    let _ = writeln!(
        out,
        "Timings: parsing {}, generation {}, total {}",
        seconds(metrics.parsing_time),
        seconds(metrics.ai_generation_time),
        seconds(metrics.processing_time)
    );
    let _ = writeln!(out);
    out.push_str(&render_evaluation(&outcome.evaluation));
    let _ = writeln!(out);

    for case in &outcome.test_cases {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        let _ = writeln!(out, "[{}] {}", field(&case.id), field(&case.title));
        let _ = writeln!(out, "  Precondition: {}", field(&case.precondition));
        let _ = writeln!(out, "  Steps:");
        for line in field(&case.steps).lines() {
            let _ = writeln!(out, "    {}", line);
        }
        let _ = writeln!(out, "  Expected: {}", field(&case.expected_result));
    }
    out
}

pub fn render_evaluation(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Test cases:          {}", report.total_count);
    let _ = writeln!(
        out,
        "Valid structure:     {} ({:.1}%)",
        report.valid_structure, report.valid_structure_percent
    );
    let _ = writeln!(
        out,
        "With precondition:   {} ({:.1}%)",
        report.has_prerequisites, report.has_prerequisites_percent
    );
    let _ = writeln!(
        out,
        "With steps:          {} ({:.1}%)",
        report.has_steps, report.has_steps_percent
    );
    let _ = writeln!(
        out,
        "With expected:       {} ({:.1}%)",
        report.has_expected_result, report.has_expected_result_percent
    );
    let _ = writeln!(out, "Avg steps length:    {:.2}", report.avg_steps_length);
    let _ = writeln!(out, "Coverage score:      {:.2}", report.coverage_score);
    out
}

pub fn render_comparison(record: &ComparisonRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", record.comparison_name, record.timestamp);
    let _ = writeln!(out, "Requirement length:  {}", record.requirement_length);
    let _ = writeln!(
        out,
        "{:<14}{:>8}{:>10}{:>14}{:>10}{:>10}",
        "", "count", "title", "precondition", "steps", "expected"
    );
    for (label, summary) in [("manual", &record.manual), ("generated", &record.automated)] {
        let lengths = &summary.avg_fields_length;
        let _ = writeln!(
            out,
            "{:<14}{:>8}{:>10.2}{:>14.2}{:>10.2}{:>10.2}",
            label,
            summary.count,
            lengths.title,
            lengths.precondition,
            lengths.steps,
            lengths.expected_result
        );
    }
    let _ = writeln!(
        out,
        "Difference: {:+} cases, ratio {:.2}, change {:+.2}%",
        record.differences.count_difference,
        record.differences.count_ratio,
        record.differences.count_percent_change
    );
    let coverage = &record.coverage_analysis;
    let _ = writeln!(
        out,
        "Coverage estimate: manual {}, generated {}, ratio {:.2}, efficiency gain {:+.2}%",
        coverage.manual_coverage_estimate,
        coverage.automated_coverage_estimate,
        coverage.coverage_ratio,
        coverage.efficiency_gain
    );
    out
}

pub fn render_stats(summary: Option<&HistorySummary>, history: &[RunMetrics]) -> String {
    let Some(summary) = summary else {
        return "No runs recorded yet.\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Runs: {} total, {} successful",
        summary.total_runs, summary.successful_runs
    );
    let _ = writeln!(out, "Avg processing:      {}", seconds(summary.avg_processing_time));
    let _ = writeln!(out, "Avg parsing:         {}", seconds(summary.avg_parsing_time));
    let _ = writeln!(out, "Avg generation:      {}", seconds(summary.avg_ai_generation_time));
    let _ = writeln!(
        out,
        "Avg test cases:      {}",
        summary
            .avg_test_cases
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(out, "Test cases generated: {}", summary.total_test_cases_generated);

    let runs = successful_runs(history);
    if runs.is_empty() {
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<25} {:<6} {:>10} {:>9} {:>9} {:>9} {:>6}  {}",
        "file", "type", "bytes", "parse", "ai", "total", "cases", "model"
    );
    for run in runs {
        let _ = writeln!(
            out,
            "{:<25} {:<6} {:>10} {:>9} {:>9} {:>9} {:>6}  {}",
            truncate(run.file_name.as_deref().unwrap_or("-"), 25),
            run.file_type.as_deref().unwrap_or("-"),
            run.file_size_bytes.unwrap_or(0),
            seconds(run.parsing_time),
            seconds(run.ai_generation_time),
            seconds(run.processing_time),
            run.total_test_cases.unwrap_or(0),
            run.model_name.as_deref().unwrap_or("-")
        );
    }
    out
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let kept: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
