use kosli_core::{
    ArtifactReference, AttestationTypeVersion, FlowReference, SnapshotReference,
};

use crate::cli::args::{OutputFormat, ResolveArgs, ResolveSub};
use crate::cli::helpers::{emit, key_value_lines};
use crate::exit_codes;

pub fn run(args: ResolveArgs, output: OutputFormat) -> anyhow::Result<i32> {
    match args.cmd {
        ResolveSub::Flow { expression } => {
            let flow = FlowReference::parse(&expression)?;
            let position = if flow.is_latest() {
                "latest".to_string()
            } else if let Some(back) = flow.steps_back() {
                format!("{} back from latest", back)
            } else {
                format!("#{}", flow.ordinal)
            };
            let text = key_value_lines(&[
                ("flow", flow.name.clone()),
                ("ordinal", flow.ordinal.to_string()),
                ("position", position),
            ]);
            emit(output, &flow, &text)?;
        }
        ResolveSub::Snapshot { expression } => {
            let snapshot = SnapshotReference::parse(&expression)?;
            let text = key_value_lines(&[
                ("environment", snapshot.environment_name.clone()),
                ("fragment", snapshot.encoded_fragment.clone()),
            ]);
            emit(output, &snapshot, &text)?;
        }
        ResolveSub::Artifact { expression } => {
            let artifact = ArtifactReference::parse(&expression)?;
            let text = key_value_lines(&[
                ("flow", artifact.flow_name.clone()),
                ("identity", artifact.identity.clone()),
                ("separator", artifact.separator.as_char().to_string()),
            ]);
            emit(output, &artifact, &text)?;
        }
        ResolveSub::AttestationType { expression } => {
            let attestation_type = AttestationTypeVersion::parse(&expression)?;
            let text = key_value_lines(&[
                ("type", attestation_type.type_name.clone()),
                ("version", attestation_type.version.clone()),
            ]);
            emit(output, &attestation_type, &text)?;
        }
    }
    Ok(exit_codes::SUCCESS)
}
