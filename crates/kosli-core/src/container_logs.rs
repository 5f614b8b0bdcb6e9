//! Running-image digest and start time from app service container logs.
//!
//! The platform logs a `Digest: sha256:<hex>` line when it pulls an image and
//! a `... for site <name> initialized successfully and is ready to serve
//! requests.` line once the container is up. Both lines start with a
//! millisecond UTC timestamp such as `2023-09-25T12:21:09.927Z`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{KosliError, KosliResult};

const DIGEST_MARKER: &str = "Digest: sha256:";
const TIMESTAMP_LEN: usize = 24;
const FINGERPRINT_LEN: usize = 64;

/// What the logs say about the running image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageStart {
    /// Digest of the last pulled image, when one was logged.
    pub fingerprint: Option<String>,
    /// Unix seconds of the last start, only known when a digest was logged too.
    pub started_at: Option<i64>,
}

/// Extract the running image's fingerprint and start time.
///
/// Returns `Ok(None)` when the last start line predates the last digest line,
/// meaning the pulled image is not running yet.
pub fn extract_image_start(logs: &str, web_app_name: &str) -> KosliResult<Option<ImageStart>> {
    let started_marker = format!(
        "for site {} initialized successfully and is ready to serve requests.",
        web_app_name
    );

    let mut last_digest_line = None;
    let mut last_started_line = None;
    for line in logs.lines() {
        if line.contains(DIGEST_MARKER) {
            last_digest_line = Some(line);
        }
        if line.contains(&started_marker) {
            last_started_line = Some(line);
        }
    }

    let fingerprint = last_digest_line.map(trailing_fingerprint).transpose()?;

    let started_at = match (last_digest_line, last_started_line) {
        (Some(digest_line), Some(started_line)) => {
            let digest_logged_at = leading_timestamp(digest_line)?;
            let started_logged_at = leading_timestamp(started_line)?;
            if started_logged_at < digest_logged_at {
                return Ok(None);
            }
            Some(started_logged_at.timestamp())
        }
        _ => None,
    };

    Ok(Some(ImageStart {
        fingerprint,
        started_at,
    }))
}

fn trailing_fingerprint(line: &str) -> KosliResult<String> {
    let line = line.trim_end();
    line.len()
        .checked_sub(FINGERPRINT_LEN)
        .and_then(|start| line.get(start..))
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| KosliError::ContainerLogs {
            message: format!("digest line is too short: '{}'", line),
        })
}

fn leading_timestamp(line: &str) -> KosliResult<DateTime<Utc>> {
    let raw = line.get(..TIMESTAMP_LEN).ok_or_else(|| KosliError::ContainerLogs {
        message: format!("line does not start with a timestamp: '{}'", line),
    })?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| KosliError::ContainerLogs {
            message: format!("invalid timestamp '{}': {}", raw, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "4a1c4b21597c1b4415bdbecb28a3296c6b5e23ca4f9feeb599860a1dac6a0108";

    fn digest_line(ts: &str) -> String {
        format!("{} INFO  - Digest: sha256:{}", ts, HEX)
    }

    fn started_line(ts: &str) -> String {
        format!(
            "{} INFO  - Container web_0_1 for site web initialized successfully and is ready to serve requests.",
            ts
        )
    }

    #[test]
    fn digest_then_start() {
        let logs = [
            "2023-09-25T12:20:00.000Z INFO  - Pulling image".to_string(),
            digest_line("2023-09-25T12:21:09.927Z"),
            started_line("2023-09-25T12:21:40.000Z"),
        ]
        .join("\n");

        let start = extract_image_start(&logs, "web").unwrap().unwrap();
        assert_eq!(start.fingerprint.as_deref(), Some(HEX));
        assert_eq!(start.started_at, Some(1_695_644_500));
    }

    #[test]
    fn last_lines_win() {
        let other = "0".repeat(64);
        let logs = [
            format!("2023-09-25T10:00:00.000Z INFO  - Digest: sha256:{}", other),
            started_line("2023-09-25T10:00:30.000Z"),
            digest_line("2023-09-25T12:21:09.927Z"),
            started_line("2023-09-25T12:21:40.000Z"),
        ]
        .join("\n");

        let start = extract_image_start(&logs, "web").unwrap().unwrap();
        assert_eq!(start.fingerprint.as_deref(), Some(HEX));
    }

    #[test]
    fn start_before_digest_is_not_running() {
        let logs = [
            started_line("2023-09-25T12:00:00.000Z"),
            digest_line("2023-09-25T12:21:09.927Z"),
        ]
        .join("\n");
        assert_eq!(extract_image_start(&logs, "web").unwrap(), None);
    }

    #[test]
    fn other_site_is_ignored() {
        let logs = [
            digest_line("2023-09-25T12:21:09.927Z"),
            started_line("2023-09-25T12:21:40.000Z"),
        ]
        .join("\n");

        let start = extract_image_start(&logs, "api").unwrap().unwrap();
        assert_eq!(start.fingerprint.as_deref(), Some(HEX));
        assert_eq!(start.started_at, None);
    }

    #[test]
    fn empty_logs() {
        assert_eq!(
            extract_image_start("", "web").unwrap(),
            Some(ImageStart {
                fingerprint: None,
                started_at: None
            })
        );
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let logs = [
            digest_line("not-a-timestamp-at-all!!"),
            started_line("2023-09-25T12:21:40.000Z"),
        ]
        .join("\n");
        assert!(matches!(
            extract_image_start(&logs, "web"),
            Err(KosliError::ContainerLogs { .. })
        ));
    }

    #[test]
    fn short_digest_line_is_an_error() {
        assert!(matches!(
            extract_image_start("Digest: sha256:abc", "web"),
            Err(KosliError::ContainerLogs { .. })
        ));
    }
}
