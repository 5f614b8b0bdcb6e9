//! Container image reference parsing.
//!
//! Supports the usual shorthand forms:
//! - `alpine` → `docker.io/library/alpine:latest`
//! - `acme/app:1.2` → `docker.io/acme/app:1.2`
//! - `ghcr.io/acme/app` → `ghcr.io/acme/app:latest`
//! - `localhost:5000/app@sha256:abc...` → pinned by digest

use std::fmt;

use crate::error::{KosliError, KosliResult};

const DEFAULT_REGISTRY: &str = "docker.io";
const DOCKER_HUB_HOST: &str = "registry-1.docker.io";
const DEFAULT_TAG: &str = "latest";

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, with port when one was given.
    pub registry: String,
    /// Repository path inside the registry.
    pub repository: String,
    /// Tag, `latest` when neither a tag nor a digest was given.
    pub tag: Option<String>,
    /// Pinned `sha256:` digest.
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use kosli_core::ImageReference;
    ///
    /// let image = ImageReference::parse("alpine").unwrap();
    /// assert_eq!(image.registry, "docker.io");
    /// assert_eq!(image.repository, "library/alpine");
    /// assert_eq!(image.tag.as_deref(), Some("latest"));
    ///
    /// let image = ImageReference::parse("ghcr.io/acme/app:1.2").unwrap();
    /// assert_eq!(image.registry, "ghcr.io");
    /// assert_eq!(image.repository, "acme/app");
    /// ```
    pub fn parse(reference: &str) -> KosliResult<Self> {
        let reference = reference.trim();
        let invalid = |reason: &str| KosliError::InvalidImageReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(invalid("empty reference"));
        }

        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => {
                let hex = digest
                    .strip_prefix("sha256:")
                    .ok_or_else(|| invalid("digest must start with 'sha256:'"))?;
                if !is_sha256_hex(hex) {
                    return Err(invalid("digest must be 64 hex characters"));
                }
                (name, Some(digest.to_ascii_lowercase()))
            }
            None => (reference, None),
        };

        let last_slash = name.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match name[last_slash..].rfind(':') {
            Some(colon) => {
                let split = last_slash + colon;
                let tag = &name[split + 1..];
                if tag.is_empty() {
                    return Err(invalid("tag is empty"));
                }
                (&name[..split], Some(tag.to_string()))
            }
            None => (name, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if looks_like_registry(first) => {
                (first.to_string(), rest.to_string())
            }
            _ => (DEFAULT_REGISTRY.to_string(), name.to_string()),
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(invalid("repository name is missing"));
        }
        if repository.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(invalid("repository name must be lowercase"));
        }

        let repository = if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            format!("library/{}", repository)
        } else {
            repository
        };

        let tag = match (&tag, &digest) {
            (None, None) => Some(DEFAULT_TAG.to_string()),
            _ => tag,
        };

        Ok(Self {
            registry,
            repository,
            tag,
            digest,
        })
    }

    /// Host to send registry API requests to.
    pub fn api_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            DOCKER_HUB_HOST
        } else {
            &self.registry
        }
    }

    /// Loopback registries are addressed over plain http.
    pub fn scheme(&self) -> &'static str {
        let host = self.registry.as_str();
        let host = match host.strip_prefix('[') {
            Some(rest) => rest.split(']').next().unwrap_or(rest),
            None => host.split(':').next().unwrap_or(host),
        };
        if matches!(host, "localhost" | "127.0.0.1" | "::1") {
            "http"
        } else {
            "https"
        }
    }

    /// Digest if pinned, otherwise the tag.
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or(DEFAULT_TAG)
    }

    /// URL of the manifest endpoint for this image.
    pub fn manifest_url(&self) -> String {
        format!(
            "{}://{}/v2/{}/manifests/{}",
            self.scheme(),
            self.api_host(),
            self.repository,
            self.manifest_reference()
        )
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

fn looks_like_registry(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

pub(crate) fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_hexdigit())
}
