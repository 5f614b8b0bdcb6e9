use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{KosliError, KosliResult};

pub(crate) fn sha256_hex_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub(crate) fn sha256_hex_bytes(bytes: &[u8]) -> String {
    // In-memory hashing should be infallible; keep a single hashing implementation.
    sha256_hex_reader(Cursor::new(bytes)).expect("hashing in-memory bytes via cursor must not fail")
}

/// sha256 of a file's raw bytes, as 64 lowercase hex characters.
pub fn file_sha256(path: impl AsRef<Path>) -> KosliResult<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| KosliError::io(path, e))?;
    if file
        .metadata()
        .map_err(|e| KosliError::io(path, e))?
        .is_dir()
    {
        return Err(KosliError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "is a directory, use --artifact-type dir",
            ),
        ));
    }
    sha256_hex_reader(file).map_err(|e| KosliError::io(path, e))
}

/// Strip an optional `sha256:` prefix and lowercase a digest.
pub(crate) fn normalize_digest(digest: &str) -> String {
    digest
        .trim()
        .strip_prefix("sha256:")
        .unwrap_or(digest.trim())
        .to_ascii_lowercase()
}
