//! Directory tree fingerprints.
//!
//! The digest covers every entry's path relative to the root and, for regular
//! files, its content. Entries are visited in lexicographic order of their
//! `/`-separated relative path, so the same tree always hashes the same way
//! regardless of the order the filesystem lists it in. The root's own name
//! is not part of the digest.
//!
//! Exclude patterns are globs matched against relative paths. A matching
//! directory is pruned with everything under it.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::digest::{file_sha256, sha256_hex_bytes};
use crate::error::{KosliError, KosliResult};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EntryKind {
    Dir,
    File,
    Symlink(String),
}

#[derive(Debug)]
struct Entry {
    relative: String,
    absolute: PathBuf,
    kind: EntryKind,
}

/// sha256 of a directory tree, as 64 lowercase hex characters.
pub fn dir_sha256(root: impl AsRef<Path>, exclude_paths: &[String]) -> KosliResult<String> {
    let root = root.as_ref();
    let metadata = fs::metadata(root).map_err(|e| KosliError::io(root, e))?;
    if !metadata.is_dir() {
        return Err(KosliError::io(
            root,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "is not a directory, use --artifact-type file",
            ),
        ));
    }

    let excludes = compile_excludes(exclude_paths)?;

    let mut entries = Vec::new();
    collect_entries(root, root, &excludes, &mut entries)?;
    entries.sort_by(|a, b| a.relative.cmp(&b.relative));

    let mut hasher = Sha256::new();
    for entry in &entries {
        hasher.update(sha256_hex_bytes(entry.relative.as_bytes()).as_bytes());
        match &entry.kind {
            EntryKind::Dir => {}
            EntryKind::File => {
                hasher.update(file_sha256(&entry.absolute)?.as_bytes());
            }
            EntryKind::Symlink(target) => {
                hasher.update(sha256_hex_bytes(target.as_bytes()).as_bytes());
            }
        }
    }

    let digest = hex::encode(hasher.finalize());
    debug!(
        dir = %root.display(),
        entries = entries.len(),
        fingerprint = %digest,
        "calculated directory fingerprint"
    );
    Ok(digest)
}

fn compile_excludes(patterns: &[String]) -> KosliResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = normalize_pattern(pattern);
        if normalized.is_empty() {
            continue;
        }
        let glob = Glob::new(&normalized).map_err(|e| KosliError::InvalidArtifactArgs {
            message: format!("invalid exclude pattern '{}': {}", pattern, e),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| KosliError::InvalidArtifactArgs {
        message: format!("invalid exclude patterns: {}", e),
    })
}

fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed.trim_end_matches('/').replace('\\', "/")
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn collect_entries(
    root: &Path,
    dir: &Path,
    excludes: &GlobSet,
    out: &mut Vec<Entry>,
) -> KosliResult<()> {
    let read_dir = fs::read_dir(dir).map_err(|e| KosliError::io(dir, e))?;
    for entry in read_dir {
        let entry = entry.map_err(|e| KosliError::io(dir, e))?;
        let path = entry.path();
        let relative = relative_path(root, &path);

        if excludes.is_match(&relative) {
            debug!(path = %relative, "excluded from fingerprint");
            continue;
        }

        let file_type = entry.file_type().map_err(|e| KosliError::io(&path, e))?;
        if file_type.is_symlink() {
            let target = fs::read_link(&path).map_err(|e| KosliError::io(&path, e))?;
            out.push(Entry {
                relative,
                absolute: path,
                kind: EntryKind::Symlink(target.to_string_lossy().into_owned()),
            });
        } else if file_type.is_dir() {
            out.push(Entry {
                relative,
                absolute: path.clone(),
                kind: EntryKind::Dir,
            });
            collect_entries(root, &path, excludes, out)?;
        } else {
            out.push(Entry {
                relative,
                absolute: path,
                kind: EntryKind::File,
            });
        }
    }
    Ok(())
}
