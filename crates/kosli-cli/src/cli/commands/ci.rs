use std::collections::{BTreeMap, BTreeSet};

use kosli_core::ci::{ci_defaults_docs, flags};
use kosli_core::{CiContext, CiPlatform};
use serde_json::json;

use crate::cli::args::{CiArgs, CiSub, OutputFormat};
use crate::cli::helpers::{emit, key_value_lines};
use crate::exit_codes;

pub fn run(args: CiArgs, output: OutputFormat) -> anyhow::Result<i32> {
    let context = CiContext::from_env();

    match args.cmd {
        CiSub::Detect => {
            let platform = context.platform();
            let value = json!({
                "platform": platform,
                "name": platform.to_string(),
                "sentinel": platform.sentinel(),
                "suppressed": context.suppression(),
            });
            emit(output, &value, &platform.to_string())?;
        }
        CiSub::Defaults { flags: requested } => {
            let names = if requested.is_empty() {
                flags(context.platform())
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            } else {
                requested
            };
            let rows: Vec<(&str, String)> = names
                .iter()
                .map(|flag| (flag.as_str(), context.default_value(flag)))
                .collect();
            let defaults: BTreeMap<&str, &String> =
                rows.iter().map(|(flag, value)| (*flag, value)).collect();
            emit(output, &defaults, &key_value_lines(&rows))?;
        }
        CiSub::Docs { flags: requested } => {
            let names: Vec<String> = if requested.is_empty() {
                all_flags()
            } else {
                requested
            };
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            let docs = ci_defaults_docs(CiPlatform::supported(), &names);
            emit(output, &docs, &docs)?;
        }
    }
    Ok(exit_codes::SUCCESS)
}

fn all_flags() -> Vec<String> {
    CiPlatform::supported()
        .iter()
        .flat_map(|platform| flags(*platform))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
