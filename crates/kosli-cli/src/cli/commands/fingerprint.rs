use kosli_core::{
    validate_artifact_arg, validate_registry_credentials, ArtifactType, FingerprintConfig,
    FingerprintRequest, Fingerprinter,
};
use serde_json::json;
use tracing::debug;

use crate::cli::args::{FingerprintArgs, OutputFormat};
use crate::cli::helpers::emit;
use crate::exit_codes;

pub async fn run(args: FingerprintArgs, output: OutputFormat) -> anyhow::Result<i32> {
    validate_artifact_arg(
        &args.artifact,
        args.artifact_type.as_deref(),
        args.fingerprint.as_deref(),
        false,
    )?;
    if let Some(artifact_type) = args.artifact_type.as_deref().filter(|t| !t.is_empty()) {
        validate_registry_credentials(
            artifact_type.parse()?,
            args.registry_username.as_deref(),
            args.registry_password.as_deref(),
        )?;
    }

    let artifact = args.artifact.first().cloned().unwrap_or_default();

    if let Some(fingerprint) = args.fingerprint.as_deref().filter(|f| !f.is_empty()) {
        debug!(fingerprint, "using supplied fingerprint");
        let value = json!({ "artifact": artifact, "fingerprint": fingerprint });
        emit(output, &value, fingerprint)?;
        return Ok(exit_codes::SUCCESS);
    }

    // validate_artifact_arg guarantees a type when no fingerprint was given
    let artifact_type: ArtifactType = args.artifact_type.as_deref().unwrap_or_default().parse()?;
    let mut request = FingerprintRequest::new(artifact.clone(), artifact_type)
        .with_excludes(args.exclude.iter().filter(|p| !p.trim().is_empty()).cloned());
    request.registry_username = args.registry_username;
    request.registry_password = args.registry_password;

    let fingerprinter = Fingerprinter::new(&FingerprintConfig::from_env())?;
    let fingerprint = fingerprinter.fingerprint(&request).await?;

    let value = json!({
        "artifact": artifact,
        "artifact_type": artifact_type,
        "fingerprint": fingerprint,
    });
    emit(output, &value, &fingerprint)?;
    Ok(exit_codes::SUCCESS)
}
