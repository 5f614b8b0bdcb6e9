//! Exit codes of the `kosli` binary.
//! Scripts branch on these, so they are part of the public contract.

use kosli_core::KosliError;

pub const SUCCESS: i32 = 0;
pub const INVALID_INPUT: i32 = 1; // Malformed expression, fingerprint or argument list
pub const INVALID_FLAGS: i32 = 2; // Unsupported artifact type or bad flag combination
pub const LOCAL_FAILURE: i32 = 3; // Filesystem, container engine or log parsing
pub const REMOTE_FAILURE: i32 = 4; // Registry or network
pub const INTERNAL_ERROR: i32 = 5;

/// Exit code for an error that reached `main`.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<KosliError>()
        .map(KosliError::exit_code)
        .unwrap_or(INTERNAL_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_codes_line_up() {
        let input = KosliError::MissingIdentity {
            expression: "backend".into(),
        };
        let flags = KosliError::IncompleteRegistryCredentials {
            artifact_type: "oci".into(),
            supplied: "username",
        };
        let remote = KosliError::Network {
            message: "reset".into(),
        };
        assert_eq!(input.exit_code(), INVALID_INPUT);
        assert_eq!(flags.exit_code(), INVALID_FLAGS);
        assert_eq!(remote.exit_code(), REMOTE_FAILURE);
    }

    #[test]
    fn context_does_not_hide_core_error() {
        let err = anyhow::Error::new(KosliError::ContainerLogs {
            message: "bad".into(),
        })
        .context("reading logs");
        assert_eq!(for_error(&err), LOCAL_FAILURE);
        assert_eq!(for_error(&anyhow::anyhow!("boom")), INTERNAL_ERROR);
    }
}
