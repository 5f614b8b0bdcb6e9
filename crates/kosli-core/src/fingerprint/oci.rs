//! Manifest digests from OCI / Docker registries.
//!
//! One GET against `/v2/<repo>/manifests/<ref>`. A 401 with a `Bearer`
//! challenge is answered by fetching a pull token from the advertised realm
//! (with basic auth when credentials are given); a `Basic` challenge is
//! answered with the credentials directly.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::{ACCEPT, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::digest::{normalize_digest, sha256_hex_bytes};
use super::image_ref::{is_sha256_hex, ImageReference};
use crate::config::FingerprintConfig;
use crate::error::{KosliError, KosliResult};

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.oci.image.index.v1+json, \
application/vnd.docker.distribution.manifest.list.v2+json, \
application/vnd.oci.image.manifest.v1+json, \
application/vnd.docker.distribution.manifest.v2+json";

const CONTENT_DIGEST_HEADER: &str = "docker-content-digest";

/// Username/password pair for a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

enum Auth<'a> {
    Basic(&'a RegistryCredentials),
    Bearer(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Client that resolves image manifest digests.
#[derive(Debug, Clone)]
pub struct OciClient {
    client: reqwest::Client,
}

impl OciClient {
    /// Create a client with the configured timeout and user agent.
    pub fn new(config: &FingerprintConfig) -> KosliResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| KosliError::Network {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Digest of the manifest `image` points at, as 64 lowercase hex characters.
    pub async fn manifest_digest(
        &self,
        image: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> KosliResult<String> {
        let reference = ImageReference::parse(image)?;
        let url = reference.manifest_url();
        debug!(url = %url, "fetching image manifest");

        let mut response = self.get_manifest(&url, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_challenge);

            let auth = match challenge {
                Some(Challenge::Bearer {
                    realm,
                    service,
                    scope,
                }) => {
                    let scope = scope
                        .unwrap_or_else(|| format!("repository:{}:pull", reference.repository));
                    let token = self
                        .fetch_token(image, &realm, service.as_deref(), &scope, credentials)
                        .await?;
                    Auth::Bearer(token)
                }
                Some(Challenge::Basic) => match credentials {
                    Some(credentials) => Auth::Basic(credentials),
                    None => return Err(unauthorized(image)),
                },
                None => return Err(unauthorized(image)),
            };

            response = self.get_manifest(&url, Some(&auth)).await?;
        }

        let status = response.status();
        match status.as_u16() {
            200..=299 => {}
            401 | 403 => return Err(unauthorized(image)),
            404 => {
                return Err(KosliError::Registry {
                    reference: image.to_string(),
                    message: "manifest not found".to_string(),
                })
            }
            _ => {
                return Err(KosliError::Registry {
                    reference: image.to_string(),
                    message: format!("unexpected status {}", status),
                })
            }
        }

        let header_digest = response
            .headers()
            .get(CONTENT_DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(normalize_digest);

        match header_digest {
            Some(digest) if is_sha256_hex(&digest) => Ok(digest),
            other => {
                warn!(
                    image,
                    header = ?other,
                    "registry returned no usable Docker-Content-Digest, hashing manifest body"
                );
                let body = response.bytes().await.map_err(|e| KosliError::Network {
                    message: format!("failed to read manifest body: {}", e),
                })?;
                Ok(sha256_hex_bytes(&body))
            }
        }
    }

    async fn get_manifest(
        &self,
        url: &str,
        auth: Option<&Auth<'_>>,
    ) -> KosliResult<reqwest::Response> {
        let mut request = self.client.get(url).header(ACCEPT, MANIFEST_MEDIA_TYPES);
        match auth {
            Some(Auth::Basic(credentials)) => {
                request = request.basic_auth(&credentials.username, Some(&credentials.password));
            }
            Some(Auth::Bearer(token)) => {
                request = request.bearer_auth(token);
            }
            None => {}
        }
        Ok(request.send().await?)
    }

    async fn fetch_token(
        &self,
        image: &str,
        realm: &str,
        service: Option<&str>,
        scope: &str,
        credentials: Option<&RegistryCredentials>,
    ) -> KosliResult<String> {
        let mut token_url = Url::parse(realm).map_err(|e| KosliError::Registry {
            reference: image.to_string(),
            message: format!("invalid token realm '{}': {}", realm, e),
        })?;
        {
            let mut query = token_url.query_pairs_mut();
            if let Some(service) = service {
                query.append_pair("service", service);
            }
            query.append_pair("scope", scope);
        }
        debug!(realm, scope, "requesting registry token");

        let mut request = self.client.get(token_url);
        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(unauthorized(image));
        }
        if !status.is_success() {
            return Err(KosliError::Registry {
                reference: image.to_string(),
                message: format!("token request failed with status {}", status),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| KosliError::Registry {
            reference: image.to_string(),
            message: format!("invalid token response: {}", e),
        })?;
        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| KosliError::Registry {
                reference: image.to_string(),
                message: "token response carried no token".to_string(),
            })
    }
}

fn unauthorized(image: &str) -> KosliError {
    KosliError::Registry {
        reference: image.to_string(),
        message: "unauthorized, check --registry-username and --registry-password".to_string(),
    }
}

fn parse_challenge(header: &str) -> Option<Challenge> {
    let header = header.trim();
    let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

    if scheme.eq_ignore_ascii_case("basic") {
        return Some(Challenge::Basic);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut params = parse_auth_params(params);
    Some(Challenge::Bearer {
        realm: params.remove("realm")?,
        service: params.remove("service"),
        scope: params.remove("scope"),
    })
}

fn parse_auth_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut rest = input.trim();

    while let Some((key, after)) = rest.split_once('=') {
        let key = key.trim().to_ascii_lowercase();
        let after = after.trim_start();
        let (value, remainder) = match after.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            },
            None => match after.find(',') {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            },
        };
        params.insert(key, value.to_string());
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_challenge() {
        let challenge = parse_challenge(
            r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/alpine:pull,push""#,
        );
        assert_eq!(
            challenge,
            Some(Challenge::Bearer {
                realm: "https://auth.docker.io/token".to_string(),
                service: Some("registry.docker.io".to_string()),
                scope: Some("repository:library/alpine:pull,push".to_string()),
            })
        );
    }

    #[test]
    fn parses_basic_and_unknown_challenges() {
        assert_eq!(parse_challenge(r#"Basic realm="registry""#), Some(Challenge::Basic));
        assert_eq!(parse_challenge("Negotiate"), None);
        assert_eq!(parse_challenge(r#"Bearer service="x""#), None);
    }

    #[test]
    fn unquoted_params() {
        let params = parse_auth_params("realm=https://r/token, service=reg");
        assert_eq!(params.get("realm").map(String::as_str), Some("https://r/token"));
        assert_eq!(params.get("service").map(String::as_str), Some("reg"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = RegistryCredentials::new("ci", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("ci"));
        assert!(!printed.contains("hunter2"));
    }
}
