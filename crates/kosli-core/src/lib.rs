//! Core of the Kosli command line: reference expressions, artifact
//! fingerprints and CI context defaults.
//!
//! - Reference expressions address a flow, snapshot, artifact or attestation
//!   type version with compact shorthand such as `prod~2` or `backend@v3`.
//! - Fingerprints are sha256 digests of files, directory trees and container
//!   images.
//! - CI context detects the build platform and fills in flag defaults from its
//!   environment variables.
//!
//! # Quick Start
//!
//! ```
//! use kosli_core::{ArtifactReference, FlowReference, SnapshotReference};
//!
//! let flow = FlowReference::parse("backend~3").unwrap();
//! assert_eq!(flow.ordinal, -4);
//!
//! let snapshot = SnapshotReference::parse("prod#12").unwrap();
//! assert_eq!(snapshot.to_string(), "prod/%2312");
//!
//! let artifact = ArtifactReference::parse("backend:3f2a1c9").unwrap();
//! assert_eq!(artifact.identity, "3f2a1c9");
//! ```
//!
//! # Fingerprints
//!
//! ```no_run
//! use kosli_core::{ArtifactType, FingerprintConfig, FingerprintRequest, Fingerprinter};
//!
//! # async fn example() -> kosli_core::KosliResult<()> {
//! let fingerprinter = Fingerprinter::new(&FingerprintConfig::from_env())?;
//! let request = FingerprintRequest::new("dist/", ArtifactType::Dir).with_excludes(["*.log"]);
//! println!("{}", fingerprinter.fingerprint(&request).await?);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `KOSLI_REGISTRY_TIMEOUT` | Registry request timeout in seconds (default: 30) |
//! | `KOSLI_DOCKER_BIN` | Container engine binary (default: `docker`) |
//! | `DOCS` | When set, CI defaults are empty (help text generation) |
//! | `KOSLI_TESTS` | When set, CI defaults are empty (test runs) |

pub mod ci;
pub mod config;
pub mod container_logs;
pub mod env;
pub mod error;
pub mod expression;
pub mod fingerprint;

// Re-export main types
pub use ci::{CiContext, CiPlatform, Suppression};
pub use config::FingerprintConfig;
pub use container_logs::{extract_image_start, ImageStart};
pub use env::{expand_env, expand_with, EnvSource, ProcessEnv};
pub use error::{KosliError, KosliResult};
pub use expression::{
    split_on_separator, ArtifactReference, ArtifactSeparator, AttestationTypeVersion,
    FlowReference, SeparatorSplit, SnapshotReference, LATEST_FRAGMENT, LATEST_ORDINAL,
};
pub use fingerprint::{
    dir_sha256, docker_image_sha256, file_sha256, validate_artifact_arg,
    validate_attestation_artifact_arg, validate_fingerprint, validate_registry_credentials,
    ArtifactType, DockerCli, FingerprintRequest, Fingerprinter, ImageEngine, ImageReference,
    OciClient, RegistryCredentials,
};
