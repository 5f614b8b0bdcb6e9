use anyhow::Context;
use kosli_core::extract_image_start;

use crate::cli::args::{ContainerLogsArgs, OutputFormat};
use crate::cli::helpers::{emit, key_value_lines};
use crate::exit_codes;

pub fn run(args: ContainerLogsArgs, output: OutputFormat) -> anyhow::Result<i32> {
    let logs = std::fs::read_to_string(&args.file).map_err(|source| kosli_core::KosliError::Io {
        path: args.file.display().to_string(),
        source,
    })?;

    let start = extract_image_start(&logs, &args.web_app)
        .with_context(|| format!("reading {}", args.file.display()))?;

    match start {
        Some(start) => {
            let text = key_value_lines(&[
                (
                    "fingerprint",
                    start.fingerprint.clone().unwrap_or_else(|| "-".to_string()),
                ),
                (
                    "started_at",
                    start
                        .started_at
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ]);
            emit(output, &start, &text)?;
        }
        None => {
            let text = format!(
                "site {} is not running the last pulled image yet",
                args.web_app
            );
            emit(output, &serde_json::Value::Null, &text)?;
        }
    }
    Ok(exit_codes::SUCCESS)
}
