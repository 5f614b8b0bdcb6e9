//! Normalisation of repository URLs built from CI variables.
//!
//! CI systems such as Jenkins expose the remote they cloned from, which may be
//! an ssh remote (`git@host:org/repo.git`) or an http remote with
//! credentials. Commit URLs built from those need rewriting before they are
//! usable in a browser.

use url::Url;

const BITBUCKET_HOST: &str = "bitbucket.org";

/// Rewrite a remote-derived URL into a plain `https://host/path` URL.
///
/// - `git@host:org/repo.git/...` and `ssh://[user@]host[:port]/...` become https
/// - user info is dropped from http(s) URLs
/// - a `.git` suffix on any path segment is removed
///
/// Input that does not look like a remote is returned with only the `.git`
/// clean-up applied.
pub fn canonical_repo_url(remote: &str) -> String {
    let remote = remote.trim();

    let rewritten = if let Some(rest) = remote.strip_prefix("ssh://") {
        ssh_url_to_https(rest)
    } else if let Some(scp) = scp_like_to_https(remote) {
        scp
    } else if let Ok(mut url) = Url::parse(remote) {
        if matches!(url.scheme(), "http" | "https") {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        } else {
            remote.to_string()
        }
    } else {
        remote.to_string()
    };

    strip_git_suffixes(&rewritten)
}

/// Whether `url` points at bitbucket.org.
pub fn is_bitbucket_cloud(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.host_str() == Some(BITBUCKET_HOST),
        Err(_) => url.contains(BITBUCKET_HOST),
    }
}

/// bitbucket.org uses `/commits/<sha>` where GitHub and GitLab use `/commit/<sha>`.
///
/// Only the first `commit` path segment is rewritten; URLs for other hosts are
/// returned unchanged.
pub fn pluralize_bitbucket_commit(url: &str) -> String {
    if !is_bitbucket_cloud(url) {
        return url.to_string();
    }
    if url.contains("/commit/") {
        url.replacen("/commit/", "/commits/", 1)
    } else if let Some(base) = url.strip_suffix("/commit") {
        format!("{}/commits", base)
    } else {
        url.to_string()
    }
}

fn ssh_url_to_https(rest: &str) -> String {
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    let host = host.split_once(':').map(|(h, _)| h).unwrap_or(host);
    format!("https://{}/{}", host, path)
}

fn scp_like_to_https(remote: &str) -> Option<String> {
    if remote.contains("://") {
        return None;
    }
    let (user_host, path) = remote.split_once(':')?;
    let (_, host) = user_host.split_once('@')?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(format!("https://{}/{}", host, path.trim_start_matches('/')))
}

fn strip_git_suffixes(url: &str) -> String {
    let cleaned = url.replace(".git/", "/");
    cleaned
        .strip_suffix(".git")
        .map(str::to_string)
        .unwrap_or(cleaned)
}
