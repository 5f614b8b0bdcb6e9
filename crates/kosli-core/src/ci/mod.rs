//! CI platform detection and CI-derived flag defaults.
//!
//! When kosli runs inside a supported CI system, flags such as `--git-commit`,
//! `--build-url` and `--commit-url` default to values built from the CI's own
//! environment variables.
//!
//! | Platform | Sentinel variable |
//! |----------|-------------------|
//! | Bitbucket | `BITBUCKET_BUILD_NUMBER` |
//! | GitHub | `GITHUB_RUN_NUMBER` |
//! | TeamCity | `TEAMCITY_VERSION` |
//! | GitLab | `GITLAB_CI` |
//! | Azure DevOps | `TF_BUILD` |
//! | CircleCI | `CIRCLECI` |
//! | CodeBuild | `CODEBUILD_CI` |
//! | Jenkins | `JENKINS_URL` |
//!
//! Sentinels are checked in that order and the first one set wins.
//!
//! Setting `DOCS` or `KOSLI_TESTS` turns every default into the empty string,
//! so generated docs never contain live values and tests can exercise the
//! "flag omitted" path while running in a real CI.

pub mod repo_url;
mod templates;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::env::{expand_with, EnvSource, ProcessEnv};

pub use templates::{ci_defaults_docs, flags, template};

/// Environment variable that marks documentation generation.
pub const DOCS_ENV: &str = "DOCS";
/// Environment variable that marks the test suite.
pub const TESTS_ENV: &str = "KOSLI_TESTS";

/// Flag whose default needs host-specific correction on some platforms.
const COMMIT_URL_FLAG: &str = "commit-url";

/// A CI system kosli knows how to read defaults from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CiPlatform {
    Bitbucket,
    GitHub,
    TeamCity,
    GitLab,
    AzureDevOps,
    CircleCI,
    CodeBuild,
    Jenkins,
    Unknown,
}

impl CiPlatform {
    /// Detection order; the first platform whose sentinel is set wins.
    pub const DETECTION_ORDER: [CiPlatform; 8] = [
        CiPlatform::Bitbucket,
        CiPlatform::GitHub,
        CiPlatform::TeamCity,
        CiPlatform::GitLab,
        CiPlatform::AzureDevOps,
        CiPlatform::CircleCI,
        CiPlatform::CodeBuild,
        CiPlatform::Jenkins,
    ];

    /// Platforms advertised in help text as supporting defaults.
    pub fn supported() -> &'static [CiPlatform] {
        &Self::DETECTION_ORDER[..7]
    }

    /// The environment variable whose presence identifies this platform.
    pub fn sentinel(self) -> Option<&'static str> {
        match self {
            Self::Bitbucket => Some("BITBUCKET_BUILD_NUMBER"),
            Self::GitHub => Some("GITHUB_RUN_NUMBER"),
            Self::TeamCity => Some("TEAMCITY_VERSION"),
            Self::GitLab => Some("GITLAB_CI"),
            Self::AzureDevOps => Some("TF_BUILD"),
            Self::CircleCI => Some("CIRCLECI"),
            Self::CodeBuild => Some("CODEBUILD_CI"),
            Self::Jenkins => Some("JENKINS_URL"),
            Self::Unknown => None,
        }
    }

    /// Detect the platform from the process environment.
    pub fn detect() -> Self {
        Self::detect_with(&ProcessEnv)
    }

    /// Detect the platform from an arbitrary environment.
    pub fn detect_with<E: EnvSource + ?Sized>(env: &E) -> Self {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|platform| platform.sentinel().is_some_and(|var| env.is_set(var)))
            .unwrap_or(Self::Unknown)
    }

    /// Platforms whose `commit-url` template is built from a clone remote.
    fn derives_commit_url_from_remote(self) -> bool {
        matches!(self, Self::CircleCI | Self::CodeBuild | Self::Jenkins)
    }
}

impl fmt::Display for CiPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bitbucket => "Bitbucket",
            Self::GitHub => "Github",
            Self::TeamCity => "Teamcity",
            Self::GitLab => "Gitlab",
            Self::AzureDevOps => "Azure Devops",
            Self::CircleCI => "CircleCI",
            Self::CodeBuild => "Code Build",
            Self::Jenkins => "Jenkins",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Why defaults are currently switched off, if they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Suppression {
    Docs,
    Tests,
}

/// Detected platform plus the environment defaults are expanded against.
#[derive(Debug, Clone)]
pub struct CiContext<E = ProcessEnv> {
    platform: CiPlatform,
    suppression: Option<Suppression>,
    env: E,
}

impl CiContext<ProcessEnv> {
    /// Context for the live process environment.
    pub fn from_env() -> Self {
        Self::with_env(ProcessEnv)
    }
}

impl<E: EnvSource> CiContext<E> {
    /// Context for an arbitrary environment.
    pub fn with_env(env: E) -> Self {
        let platform = CiPlatform::detect_with(&env);
        let suppression = if env.is_set(DOCS_ENV) {
            Some(Suppression::Docs)
        } else if env.is_set(TESTS_ENV) {
            Some(Suppression::Tests)
        } else {
            None
        };
        debug!(ci = %platform, suppression = ?suppression, "detected CI context");
        Self {
            platform,
            suppression,
            env,
        }
    }

    pub fn platform(&self) -> CiPlatform {
        self.platform
    }

    pub fn suppression(&self) -> Option<Suppression> {
        self.suppression
    }

    /// Default for `flag` on the detected platform, or `""` when there is none.
    ///
    /// Never fails: an unknown platform, an unmapped flag and a suppressed
    /// context all yield the empty string.
    pub fn default_value(&self, flag: &str) -> String {
        self.default_value_for(self.platform, flag)
    }

    /// Default for `flag` as if running on `platform`.
    pub fn default_value_for(&self, platform: CiPlatform, flag: &str) -> String {
        if self.suppression.is_some() {
            return String::new();
        }
        let Some(template) = template(platform, flag) else {
            return String::new();
        };

        let expanded = expand_with(template, &self.env);

        if platform.derives_commit_url_from_remote() && flag == COMMIT_URL_FLAG {
            let repo_url = repo_url::canonical_repo_url(&expanded);
            return repo_url::pluralize_bitbucket_commit(&repo_url);
        }
        expanded
    }

    /// `git-commit` default, falling back to `HEAD` when `return_head` is set.
    pub fn default_value_for_commit(&self, return_head: bool) -> String {
        let value = self.default_value("git-commit");
        if value.is_empty() && return_head {
            "HEAD".to_string()
        } else {
            value
        }
    }
}

/// Default for `flag` on `platform` against the process environment.
pub fn default_value(platform: CiPlatform, flag: &str) -> String {
    CiContext::from_env().default_value_for(platform, flag)
}
