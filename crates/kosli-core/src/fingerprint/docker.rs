//! Digests of images held by a local container engine.

use std::process::{Command, Stdio};

use tracing::debug;

use super::digest::normalize_digest;
use super::image_ref::is_sha256_hex;
use crate::error::{KosliError, KosliResult};

/// A local container engine that can report an image's repo digests.
pub trait ImageEngine: Send + Sync {
    /// `RepoDigests` of a local image, e.g. `["acme/app@sha256:..."]`.
    fn repo_digests(&self, image: &str) -> KosliResult<Vec<String>>;
}

/// [`ImageEngine`] backed by the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    bin: String,
}

impl DockerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ImageEngine for DockerCli {
    fn repo_digests(&self, image: &str) -> KosliResult<Vec<String>> {
        let output = Command::new(&self.bin)
            .args(["image", "inspect", "--format", "{{json .RepoDigests}}", image])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| KosliError::ImageEngine {
                message: format!("failed to run '{}': {}", self.bin, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KosliError::ImageEngine {
                message: format!(
                    "failed to inspect image {}: {}",
                    image,
                    stderr.trim()
                ),
            });
        }

        parse_repo_digests(image, &String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_repo_digests(image: &str, stdout: &str) -> KosliResult<Vec<String>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).map_err(|e| KosliError::ImageEngine {
        message: format!("unexpected inspect output for image {}: {}", image, e),
    })
}

/// Fingerprint of a local image.
///
/// Picks the repo digest whose repository matches `image`, falling back to
/// the first one. Images that were never pushed or pulled have no repo digest
/// and cannot be fingerprinted this way.
pub fn docker_image_sha256(engine: &dyn ImageEngine, image: &str) -> KosliResult<String> {
    let digests = engine.repo_digests(image)?;
    debug!(image, repo_digests = ?digests, "inspected local image");

    let repository = image_repository(image);
    let chosen = digests
        .iter()
        .find(|d| d.split('@').next() == Some(repository))
        .or_else(|| digests.first())
        .ok_or_else(|| KosliError::ImageEngine {
            message: format!(
                "failed to get a repo digest for image {}. Make sure the image has been pushed to a registry",
                image
            ),
        })?;

    let (_, digest) = chosen
        .split_once('@')
        .ok_or_else(|| KosliError::ImageEngine {
            message: format!("malformed repo digest '{}' for image {}", chosen, image),
        })?;
    let digest = normalize_digest(digest);
    if !is_sha256_hex(&digest) {
        return Err(KosliError::ImageEngine {
            message: format!("repo digest '{}' for image {} is not sha256", chosen, image),
        });
    }
    Ok(digest)
}

fn image_repository(image: &str) -> &str {
    let name = image.split('@').next().unwrap_or(image);
    let last_slash = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[last_slash..].rfind(':') {
        Some(colon) => &name[..last_slash + colon],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HEX_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    struct FakeEngine(Vec<String>);

    impl ImageEngine for FakeEngine {
        fn repo_digests(&self, _image: &str) -> KosliResult<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn parses_inspect_output() {
        let out = format!("[\"acme/app@sha256:{}\"]\n", HEX_A);
        assert_eq!(
            parse_repo_digests("acme/app", &out).unwrap(),
            vec![format!("acme/app@sha256:{}", HEX_A)]
        );
        assert!(parse_repo_digests("acme/app", "[]").unwrap().is_empty());
        assert!(parse_repo_digests("acme/app", "null").unwrap().is_empty());
        assert!(parse_repo_digests("acme/app", "{").is_err());
    }

    #[test]
    fn prefers_matching_repository() {
        let engine = FakeEngine(vec![
            format!("mirror.io/acme/app@sha256:{}", HEX_A),
            format!("acme/app@sha256:{}", HEX_B),
        ]);
        assert_eq!(docker_image_sha256(&engine, "acme/app:1.0").unwrap(), HEX_B);
    }

    #[test]
    fn falls_back_to_first_digest() {
        let engine = FakeEngine(vec![format!("mirror.io/acme/app@sha256:{}", HEX_A)]);
        assert_eq!(docker_image_sha256(&engine, "acme/app").unwrap(), HEX_A);
    }

    #[test]
    fn unpushed_image_is_an_error() {
        let err = docker_image_sha256(&FakeEngine(vec![]), "acme/app").unwrap_err();
        assert!(err.to_string().contains("pushed to a registry"));
    }

    #[test]
    fn repository_strips_tag_not_port() {
        assert_eq!(image_repository("localhost:5000/app:1"), "localhost:5000/app");
        assert_eq!(image_repository("localhost:5000/app"), "localhost:5000/app");
        assert_eq!(image_repository("app"), "app");
    }

    #[test]
    fn missing_binary_is_engine_error() {
        let engine = DockerCli::new("/definitely/not/a/docker");
        assert!(matches!(
            engine.repo_digests("alpine"),
            Err(KosliError::ImageEngine { .. })
        ));
    }
}
