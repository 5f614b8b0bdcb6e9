//! Artifact fingerprints.
//!
//! An artifact is identified by the sha256 of its content. How the content is
//! read depends on the declared [`ArtifactType`]:
//!
//! | Type | Source |
//! |------|--------|
//! | `file` | raw bytes of the file |
//! | `dir` | canonical walk of the tree, see [`dir_sha256`] |
//! | `docker` | repo digest reported by the local engine, or the registry when credentials are given |
//! | `oci` | manifest digest from the registry |

mod digest;
mod dir;
mod docker;
mod image_ref;
mod oci;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::FingerprintConfig;
use crate::error::{KosliError, KosliResult};

pub use digest::file_sha256;
pub use dir::dir_sha256;
pub use docker::{docker_image_sha256, DockerCli, ImageEngine};
pub use image_ref::ImageReference;
pub use oci::{OciClient, RegistryCredentials};

/// How an artifact's content is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    File,
    Dir,
    Docker,
    Oci,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 4] = [Self::File, Self::Dir, Self::Docker, Self::Oci];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Dir => "dir",
            Self::Docker => "docker",
            Self::Oci => "oci",
        }
    }

    /// Whether registry credentials mean anything for this type.
    pub fn accepts_registry_credentials(self) -> bool {
        matches!(self, Self::Docker | Self::Oci)
    }
}

impl FromStr for ArtifactType {
    type Err = KosliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| KosliError::UnsupportedArtifactType {
                artifact_type: s.to_string(),
            })
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to fingerprint one artifact.
#[derive(Debug, Clone)]
pub struct FingerprintRequest {
    /// File or directory path, or image name.
    pub artifact_identifier: String,
    pub artifact_type: ArtifactType,
    /// Glob patterns relative to the directory root. Only used for `dir`.
    pub exclude_paths: Vec<String>,
    pub registry_username: Option<String>,
    pub registry_password: Option<String>,
}

impl FingerprintRequest {
    pub fn new(artifact_identifier: impl Into<String>, artifact_type: ArtifactType) -> Self {
        Self {
            artifact_identifier: artifact_identifier.into(),
            artifact_type,
            exclude_paths: Vec::new(),
            registry_username: None,
            registry_password: None,
        }
    }

    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_paths = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_registry_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.registry_username = Some(username.into());
        self.registry_password = Some(password.into());
        self
    }

    /// Credentials when both halves are present and non-empty.
    pub fn credentials(&self) -> Option<RegistryCredentials> {
        match (non_empty(&self.registry_username), non_empty(&self.registry_password)) {
            (Some(username), Some(password)) => Some(RegistryCredentials::new(username, password)),
            _ => None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Check registry credential flags before any hashing starts.
///
/// Credentials are only meaningful for `docker` and `oci`, and must come as a
/// pair. Empty strings count as absent.
pub fn validate_registry_credentials(
    artifact_type: ArtifactType,
    username: Option<&str>,
    password: Option<&str>,
) -> KosliResult<()> {
    let username = username.filter(|v| !v.is_empty());
    let password = password.filter(|v| !v.is_empty());

    if !artifact_type.accepts_registry_credentials() && (username.is_some() || password.is_some())
    {
        return Err(KosliError::CredentialsNotApplicable {
            artifact_type: artifact_type.to_string(),
        });
    }
    if username.is_some() != password.is_some() {
        return Err(KosliError::IncompleteRegistryCredentials {
            artifact_type: artifact_type.to_string(),
            supplied: if username.is_some() { "username" } else { "password" },
        });
    }
    Ok(())
}

/// A user supplied fingerprint must be 64 lowercase hex characters.
pub fn validate_fingerprint(fingerprint: &str) -> KosliResult<()> {
    let valid = fingerprint.len() == 64
        && fingerprint
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if valid {
        Ok(())
    } else {
        Err(KosliError::InvalidFingerprint {
            fingerprint: fingerprint.to_string(),
        })
    }
}

/// Validate the positional artifact argument of commands that report an artifact.
///
/// At most one argument is allowed. A name or path is needed unless a
/// fingerprint is supplied (or always, with `always_require_name`), and one
/// of artifact type or fingerprint must be given.
pub fn validate_artifact_arg(
    args: &[String],
    artifact_type: Option<&str>,
    fingerprint: Option<&str>,
    always_require_name: bool,
) -> KosliResult<()> {
    let artifact_type = artifact_type.filter(|t| !t.is_empty());
    let fingerprint = fingerprint.filter(|f| !f.is_empty());

    if args.len() > 1 {
        let mut lines = vec![
            "only one argument (docker image name or file/dir path) is allowed.".to_string(),
            format!(
                "The {} supplied arguments are: [{}]",
                args.len(),
                args.join(", ")
            ),
        ];
        if args.iter().any(|a| a == " ") {
            lines.push(
                "Arguments with a leading space are probably caused by a lone backslash that has a space after it."
                    .to_string(),
            );
        }
        return Err(KosliError::InvalidArtifactArgs {
            message: lines.join("\n"),
        });
    }

    let name_missing = args.first().map_or(true, |a| a.is_empty());
    if name_missing {
        if always_require_name {
            return Err(invalid_args("docker image name or file/dir path is required"));
        }
        if fingerprint.is_none() {
            return Err(invalid_args(
                "docker image name or file/dir path is required when --fingerprint is not provided",
            ));
        }
    }

    if artifact_type.is_none() && fingerprint.is_none() {
        return Err(invalid_args(
            "either --artifact-type or --fingerprint must be specified",
        ));
    }

    if let Some(fingerprint) = fingerprint {
        validate_fingerprint(fingerprint)?;
    }
    Ok(())
}

/// Validate the artifact argument of attestation commands.
///
/// There the artifact is optional, but a name needs a way to fingerprint it
/// and a type needs a name.
pub fn validate_attestation_artifact_arg(
    args: &[String],
    artifact_type: Option<&str>,
    fingerprint: Option<&str>,
) -> KosliResult<()> {
    let artifact_type = artifact_type.filter(|t| !t.is_empty());
    let fingerprint = fingerprint.filter(|f| !f.is_empty());
    let name = args.first().filter(|a| !a.is_empty());

    if artifact_type.is_some() && name.is_none() {
        return Err(invalid_args(
            "artifact name argument is required when --artifact-type is set",
        ));
    }
    if let (None, None, Some(first)) = (artifact_type, fingerprint, args.first()) {
        let hint = if args.iter().any(|a| a == "true" || a == "false") {
            "\nSee https://docs.kosli.com//faq/#boolean-flags"
        } else {
            ""
        };
        return Err(invalid_args(format!(
            "--artifact-type or --fingerprint must be specified when artifact name ('{}') argument is supplied.{}",
            first, hint
        )));
    }

    if let Some(fingerprint) = fingerprint {
        validate_fingerprint(fingerprint)?;
    }
    Ok(())
}

fn invalid_args(message: impl Into<String>) -> KosliError {
    KosliError::InvalidArtifactArgs {
        message: message.into(),
    }
}

/// Routes a [`FingerprintRequest`] to the hashing strategy for its type.
#[derive(Clone)]
pub struct Fingerprinter {
    engine: Arc<dyn ImageEngine>,
    oci: OciClient,
}

impl fmt::Debug for Fingerprinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprinter")
            .field("oci", &self.oci)
            .finish_non_exhaustive()
    }
}

impl Fingerprinter {
    /// Create a fingerprinter using the `docker` CLI named in `config`.
    pub fn new(config: &FingerprintConfig) -> KosliResult<Self> {
        Ok(Self {
            engine: Arc::new(DockerCli::new(config.docker_bin.clone())),
            oci: OciClient::new(config)?,
        })
    }

    /// Replace the local image engine.
    pub fn with_engine(mut self, engine: impl ImageEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Compute the fingerprint, as 64 lowercase hex characters.
    ///
    /// Credential flags are validated first; `docker` with credentials is
    /// resolved against the registry like `oci`.
    pub async fn fingerprint(&self, request: &FingerprintRequest) -> KosliResult<String> {
        validate_registry_credentials(
            request.artifact_type,
            request.registry_username.as_deref(),
            request.registry_password.as_deref(),
        )?;

        let name = request.artifact_identifier.clone();
        let fingerprint = match request.artifact_type {
            ArtifactType::File => run_blocking(move || file_sha256(&name)).await?,
            ArtifactType::Dir => {
                let excludes = request.exclude_paths.clone();
                run_blocking(move || dir_sha256(&name, &excludes)).await?
            }
            ArtifactType::Oci => {
                self.oci
                    .manifest_digest(&name, request.credentials().as_ref())
                    .await?
            }
            ArtifactType::Docker => match request.credentials() {
                Some(credentials) => self.oci.manifest_digest(&name, Some(&credentials)).await?,
                None => {
                    let engine = Arc::clone(&self.engine);
                    run_blocking(move || docker_image_sha256(engine.as_ref(), &name)).await?
                }
            },
        };

        debug!(
            artifact = %request.artifact_identifier,
            artifact_type = %request.artifact_type,
            fingerprint = %fingerprint,
            "calculated fingerprint"
        );
        Ok(fingerprint)
    }
}

async fn run_blocking<F>(f: F) -> KosliResult<String>
where
    F: FnOnce() -> KosliResult<String> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KosliError::Io {
            path: "fingerprint task".to_string(),
            source: std::io::Error::other(e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    const FP: &str = "9a2b0e1f3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    struct FixedEngine(&'static str);

    impl ImageEngine for FixedEngine {
        fn repo_digests(&self, image: &str) -> KosliResult<Vec<String>> {
            Ok(vec![format!("{}@sha256:{}", image, self.0)])
        }
    }

    #[test]
    fn parses_known_types() {
        for t in ArtifactType::ALL {
            assert_eq!(t.as_str().parse::<ArtifactType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_type_names_the_input() {
        let err = "zip".parse::<ArtifactType>().unwrap_err();
        assert!(matches!(
            &err,
            KosliError::UnsupportedArtifactType { artifact_type } if artifact_type == "zip"
        ));
        assert_eq!(err.to_string(), "zip is not a supported artifact type");
    }

    #[test]
    fn credentials_must_be_paired() {
        assert!(matches!(
            validate_registry_credentials(ArtifactType::Oci, Some("ci"), None),
            Err(KosliError::IncompleteRegistryCredentials { .. })
        ));
        assert!(matches!(
            validate_registry_credentials(ArtifactType::Docker, Some(""), Some("pw")),
            Err(KosliError::IncompleteRegistryCredentials { .. })
        ));
        assert!(validate_registry_credentials(ArtifactType::Oci, Some("ci"), Some("pw")).is_ok());
        assert!(validate_registry_credentials(ArtifactType::Docker, None, None).is_ok());
    }

    #[test]
    fn incomplete_credentials_name_the_supplied_half() {
        let err = validate_registry_credentials(ArtifactType::Docker, None, Some("pw")).unwrap_err();
        match &err {
            KosliError::IncompleteRegistryCredentials {
                artifact_type,
                supplied,
            } => {
                assert_eq!(artifact_type, "docker");
                assert_eq!(*supplied, "password");
            }
            other => panic!("expected IncompleteRegistryCredentials, got {:?}", other),
        }
        assert!(err.to_string().contains("for a docker artifact"));
        assert!(err.to_string().contains("only --registry-password was given"));
    }

    #[test]
    fn credentials_rejected_for_local_types() {
        assert!(matches!(
            validate_registry_credentials(ArtifactType::File, Some("ci"), Some("pw")),
            Err(KosliError::CredentialsNotApplicable { .. })
        ));
        assert!(matches!(
            validate_registry_credentials(ArtifactType::Dir, None, Some("pw")),
            Err(KosliError::CredentialsNotApplicable { .. })
        ));
        assert!(validate_registry_credentials(ArtifactType::Dir, Some(""), None).is_ok());
    }

    #[test]
    fn fingerprint_format() {
        assert!(validate_fingerprint(FP).is_ok());
        assert!(validate_fingerprint(&FP.to_uppercase()).is_err());
        assert!(validate_fingerprint(&FP[1..]).is_err());
        assert!(validate_fingerprint("").is_err());
    }

    #[test]
    fn artifact_arg_rules() {
        assert!(validate_artifact_arg(&args(&["app.tgz"]), Some("file"), None, false).is_ok());
        assert!(validate_artifact_arg(&[], None, Some(FP), false).is_ok());

        let err = validate_artifact_arg(&args(&["a", " "]), Some("file"), None, false).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("only one argument"));
        assert!(message.contains("The 2 supplied arguments are: [a,  ]"));
        assert!(message.contains("lone backslash"));

        assert_eq!(
            validate_artifact_arg(&[], None, Some(FP), true)
                .unwrap_err()
                .to_string(),
            "docker image name or file/dir path is required"
        );
        assert!(validate_artifact_arg(&args(&[""]), Some("file"), None, false)
            .unwrap_err()
            .to_string()
            .contains("when --fingerprint is not provided"));
        assert_eq!(
            validate_artifact_arg(&args(&["app"]), None, None, false)
                .unwrap_err()
                .to_string(),
            "either --artifact-type or --fingerprint must be specified"
        );
        assert!(matches!(
            validate_artifact_arg(&args(&["app"]), None, Some("abc"), false),
            Err(KosliError::InvalidFingerprint { .. })
        ));
    }

    #[test]
    fn attestation_artifact_arg_rules() {
        assert!(validate_attestation_artifact_arg(&[], None, None).is_ok());
        assert!(validate_attestation_artifact_arg(&args(&["app"]), Some("docker"), None).is_ok());
        assert!(validate_attestation_artifact_arg(&[], None, Some(FP)).is_ok());

        assert!(validate_attestation_artifact_arg(&[], Some("file"), None)
            .unwrap_err()
            .to_string()
            .contains("artifact name argument is required"));

        let err = validate_attestation_artifact_arg(&args(&["true"]), None, None).unwrap_err();
        assert!(err.to_string().contains("('true')"));
        assert!(err.to_string().contains("boolean-flags"));
    }

    #[tokio::test]
    async fn dispatches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.txt");
        std::fs::write(&path, b"hello world").unwrap();

        let fingerprinter = Fingerprinter::new(&FingerprintConfig::default()).unwrap();
        let request = FingerprintRequest::new(path.display().to_string(), ArtifactType::File);
        assert_eq!(
            fingerprinter.fingerprint(&request).await.unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn dispatches_docker_to_local_engine() {
        let fingerprinter = Fingerprinter::new(&FingerprintConfig::default())
            .unwrap()
            .with_engine(FixedEngine(FP));
        let request = FingerprintRequest::new("acme/app:1.0", ArtifactType::Docker);
        assert_eq!(fingerprinter.fingerprint(&request).await.unwrap(), FP);
    }

    #[tokio::test]
    async fn credentials_checked_before_hashing() {
        let fingerprinter = Fingerprinter::new(&FingerprintConfig::default()).unwrap();
        let request = FingerprintRequest::new("/definitely/not/here", ArtifactType::File)
            .with_registry_credentials("ci", "pw");
        assert!(matches!(
            fingerprinter.fingerprint(&request).await,
            Err(KosliError::CredentialsNotApplicable { .. })
        ));

        let mut request = FingerprintRequest::new("acme/app", ArtifactType::Oci);
        request.registry_username = Some("ci".to_string());
        assert!(matches!(
            fingerprinter.fingerprint(&request).await,
            Err(KosliError::IncompleteRegistryCredentials { .. })
        ));
    }
}
