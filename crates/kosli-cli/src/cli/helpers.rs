use serde::Serialize;

use super::args::OutputFormat;

/// Print `value` as pretty JSON, or `text` otherwise.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text),
    }
    Ok(())
}

/// `key: value` lines, with keys padded to a common width.
pub fn key_value_lines(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{:width$}  {}", format!("{}:", k), v, width = width + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
