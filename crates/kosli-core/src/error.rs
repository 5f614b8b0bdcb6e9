//! Error types for expression parsing and fingerprinting.

/// Errors raised while resolving references or computing fingerprints.
///
/// Every variant is terminal: nothing in this crate retries.
#[derive(Debug, thiserror::Error)]
pub enum KosliError {
    /// More than one mutually exclusive separator was found.
    #[error("invalid expression: {expression}. Only one of {separators} can be present")]
    AmbiguousSeparator {
        expression: String,
        separators: String,
    },

    /// The name part before the separator is empty.
    #[error("invalid expression: {expression}. {what} name is missing")]
    MissingName {
        expression: String,
        what: &'static str,
    },

    /// An artifact expression carries no identity after its flow name.
    #[error("invalid expression: {expression}. Artifact identity is missing")]
    MissingIdentity { expression: String },

    /// The count after `~` or `#` is not an unsigned integer.
    #[error("invalid expression: {expression}. '{value}' is not an integer")]
    NonIntegerOrdinal { expression: String, value: String },

    /// The count after `~` or `#` does not fit a signed 64-bit ordinal.
    #[error("invalid expression: {expression}. '{value}' is too large")]
    OrdinalOutOfRange { expression: String, value: String },

    /// The artifact type is not one of file, dir, docker or oci.
    #[error("{artifact_type} is not a supported artifact type")]
    UnsupportedArtifactType { artifact_type: String },

    /// Only one of registry username/password was supplied.
    #[error(
        "--registry-username and --registry-password must both be set for a {artifact_type} artifact (only --registry-{supplied} was given)"
    )]
    IncompleteRegistryCredentials {
        artifact_type: String,
        supplied: &'static str,
    },

    /// Registry credentials were supplied for a file or dir artifact.
    #[error(
        "--registry-username and --registry-password are only applicable when --artifact-type is 'docker' or 'oci' (got '{artifact_type}')"
    )]
    CredentialsNotApplicable { artifact_type: String },

    /// An attestation type expression lacks the `@v` infix.
    #[error("invalid expression: {expression}. Version number should be given as '@v<version>'")]
    MissingVersionMarker { expression: String },

    /// An attestation type expression has nothing after `@v`.
    #[error("invalid expression: {expression}. Attestation type version is missing after '@v'")]
    MissingAttestationVersion { expression: String },

    /// A user supplied fingerprint is not a sha256 hex digest.
    #[error("{fingerprint} is not a valid SHA256 fingerprint. It should match the pattern ^([a-f0-9]{{64}})$")]
    InvalidFingerprint { fingerprint: String },

    /// The artifact positional arguments do not fit the command.
    #[error("{message}")]
    InvalidArtifactArgs { message: String },

    /// An image reference could not be parsed.
    #[error("invalid image reference: {reference} - {reason}")]
    InvalidImageReference { reference: String, reason: String },

    /// Reading a file or walking a directory failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The local container engine could not resolve an image digest.
    #[error("{message}")]
    ImageEngine { message: String },

    /// The registry answered with an unexpected status or payload.
    #[error("registry error for {reference}: {message}")]
    Registry { reference: String, message: String },

    /// Transport failure talking to a registry.
    #[error("network error: {message}")]
    Network { message: String },

    /// Container logs contained a malformed timestamp.
    #[error("failed to parse container logs: {message}")]
    ContainerLogs { message: String },
}

impl KosliError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User input
            Self::AmbiguousSeparator { .. }
            | Self::MissingName { .. }
            | Self::MissingIdentity { .. }
            | Self::NonIntegerOrdinal { .. }
            | Self::OrdinalOutOfRange { .. }
            | Self::MissingVersionMarker { .. }
            | Self::MissingAttestationVersion { .. }
            | Self::InvalidFingerprint { .. }
            | Self::InvalidArtifactArgs { .. }
            | Self::InvalidImageReference { .. } => 1,

            // Flag combinations
            Self::UnsupportedArtifactType { .. }
            | Self::IncompleteRegistryCredentials { .. }
            | Self::CredentialsNotApplicable { .. } => 2,

            // Local I/O
            Self::Io { .. } | Self::ImageEngine { .. } | Self::ContainerLogs { .. } => 3,

            // Remote
            Self::Registry { .. } | Self::Network { .. } => 4,
        }
    }

    /// Whether the error came from bad user input rather than the environment.
    pub fn is_usage_error(&self) -> bool {
        matches!(self.exit_code(), 1 | 2)
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<reqwest::Error> for KosliError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for kosli-core operations.
pub type KosliResult<T> = Result<T, KosliError>;
