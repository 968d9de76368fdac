pub mod cli;
pub mod config;
pub mod filter;
pub mod input;
pub mod logger;
pub mod record;
pub mod select;

use crate::config::EvaluatorConfig;
use crate::filter::{Evaluator, FilterNode};
pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use filter::{DecodeError, EvalError, FilterError};
pub use record::{FieldEntry, FieldRecord, FieldType};
use colored::Colorize;
use log::info;
use serde_json::{Value, json};

/// Decode a stored filter tree and evaluate it against `record` with the
/// default configuration.
pub fn evaluate(raw: &Value, record: &FieldRecord) -> Result<bool, FilterError> {
    Evaluator::new().evaluate_raw(raw, record)
}

fn write_output_file(
    path: &std::path::Path,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write output file '{}': {}", path.display(), e).into())
}

fn emit(
    text: &str,
    output: Option<&std::path::Path>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !quiet {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }
    if let Some(path) = output {
        write_output_file(path, text)?;
    }
    Ok(())
}

fn format_check_text(filter: &FilterNode) -> String {
    let keys: Vec<_> = filter.field_keys().into_iter().collect();
    format!(
        "{}\n  expression: {}\n  leaves: {}\n  depth: {}\n  fields: {}\n",
        "Filter is valid".green().bold(),
        filter,
        filter.leaf_count(),
        filter.depth(),
        if keys.is_empty() {
            "(none)".to_string()
        } else {
            keys.join(", ")
        }
    )
}

fn format_check_json(filter: &FilterNode) -> String {
    let body = json!({
        "valid": true,
        "leaves": filter.leaf_count(),
        "depth": filter.depth(),
        "fields": filter.field_keys(),
        "filter": filter,
    });
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
}

fn build_evaluator(config: EvaluatorConfig) -> Evaluator {
    Evaluator::new().with_config(config)
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli_parse();
    logger::init_logger(cli.verbose, cli.quiet);

    let evaluator_config = config::load_config(cli.config.as_deref())
        .map_err(|e| format!("Failed to load config: {}", e))?;
    let format = cli.format;
    let output = cli.output.as_deref();
    let quiet = cli.quiet;

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    if let Some(config_path) = &cli.config {
        info!("Config file: {}", config_path.display());
    }
    info!(
        "Local offset: {}s, max depth: {}",
        evaluator_config.local_offset_seconds, evaluator_config.max_depth
    );

    match &cli.command {
        Commands::Check { filter } => {
            let filter = input::read_filter(filter, evaluator_config.max_depth)?;
            let text = match format {
                OutputFormat::Text => format_check_text(&filter),
                OutputFormat::Json => format_check_json(&filter),
            };
            emit(&text, output, quiet)?;
        }
        Commands::Eval { filter, record } => {
            let filter = input::read_filter(filter, evaluator_config.max_depth)?;
            let record = input::read_record(record)?;
            let evaluator = build_evaluator(evaluator_config);

            let matched = evaluator
                .evaluate(&filter, &record)
                .map_err(|e| format!("Filter cannot be evaluated: {}", e))?;

            let text = match format {
                OutputFormat::Text => {
                    if matched {
                        format!("{}\n", "MATCH".green().bold())
                    } else {
                        format!("{}\n", "NO MATCH".yellow().bold())
                    }
                }
                OutputFormat::Json => json!({ "matched": matched }).to_string(),
            };
            emit(&text, output, quiet)?;
        }
        Commands::Select {
            filter,
            records,
            keep_going,
        } => {
            let filter = input::read_filter(filter, evaluator_config.max_depth)?;
            let records = input::read_records(records)?;
            info!("Evaluating {} record(s) against {}", records.len(), filter);
            let evaluator = build_evaluator(evaluator_config);

            let selection = select::select(&evaluator, &filter, &records, *keep_going)
                .map_err(|(index, e)| format!("Record {} cannot be evaluated: {}", index, e))?;

            let text = match format {
                OutputFormat::Text => select::format_selection_text(&selection),
                OutputFormat::Json => select::format_selection_json(&selection),
            };
            emit(&text, output, quiet)?;
        }
    }

    Ok(())
}
