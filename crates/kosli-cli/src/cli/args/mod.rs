use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod common;
pub use common::*;

#[derive(Parser)]
#[command(
    name = "kosli",
    version,
    about = "Resolve Kosli reference expressions, fingerprint artifacts and read CI defaults"
)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text, env = "KOSLI_OUTPUT")]
    pub output: OutputFormat,

    /// Print debug logs to stderr
    #[arg(long, global = true, env = "KOSLI_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Calculate the SHA256 fingerprint of an artifact
    Fingerprint(FingerprintArgs),
    /// Parse a reference expression
    Resolve(ResolveArgs),
    /// Detect the CI platform and show flag defaults
    Ci(CiArgs),
    /// Read the running image digest from app service container logs
    ContainerLogs(ContainerLogsArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FingerprintArgs {
    /// Docker image name or file/dir path
    pub artifact: Vec<String>,

    /// The type of the artifact: file, dir, docker or oci
    #[arg(long, short = 't')]
    pub artifact_type: Option<String>,

    /// Paths to exclude when fingerprinting a directory. Can take glob patterns
    #[arg(long = "exclude", short = 'x', value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Username for the registry holding the image
    #[arg(long, env = "KOSLI_REGISTRY_USERNAME")]
    pub registry_username: Option<String>,

    /// Password for the registry holding the image
    #[arg(long, env = "KOSLI_REGISTRY_PASSWORD", hide_env_values = true)]
    pub registry_password: Option<String>,

    /// A precomputed SHA256 fingerprint, validated and echoed back
    #[arg(long, short = 'F')]
    pub fingerprint: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ResolveArgs {
    #[command(subcommand)]
    pub cmd: ResolveSub,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ResolveSub {
    /// FLOW, FLOW~N (N back from latest) or FLOW#N (absolute)
    Flow { expression: String },
    /// ENV, ENV~N, ENV#N or ENV@TIMESTAMP
    Snapshot { expression: String },
    /// FLOW@FINGERPRINT or FLOW:COMMIT
    Artifact { expression: String },
    /// TYPE@vN
    AttestationType { expression: String },
}

#[derive(clap::Args, Debug, Clone)]
pub struct CiArgs {
    #[command(subcommand)]
    pub cmd: CiSub,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CiSub {
    /// Print the detected CI platform
    Detect,
    /// Print the default value of flags on the detected platform
    Defaults {
        /// Flags to show (default: every flag with a template)
        #[arg(long = "flag", short = 'f')]
        flags: Vec<String>,
    },
    /// Print the help text describing CI defaults
    Docs {
        /// Flags to document (default: every flag with a template)
        #[arg(long = "flag", short = 'f')]
        flags: Vec<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ContainerLogsArgs {
    /// File holding the container logs
    pub file: PathBuf,

    /// Name of the web app whose start line to look for
    #[arg(long)]
    pub web_app: String,
}
