//! Attestation type expressions: `name@v<version>`.

use std::fmt;

use serde::Serialize;

use super::{split_on_separator, SeparatorSplit};
use crate::error::{KosliError, KosliResult};

const VERSION_MARKER: &str = "@v";

/// A custom attestation type name and one of its versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttestationTypeVersion {
    pub type_name: String,
    pub version: String,
}

impl AttestationTypeVersion {
    /// Parse `type@v<version>`.
    ///
    /// ```
    /// use kosli_core::AttestationTypeVersion;
    ///
    /// let t = AttestationTypeVersion::parse("junit@v2").unwrap();
    /// assert_eq!((t.type_name.as_str(), t.version.as_str()), ("junit", "2"));
    /// ```
    pub fn parse(expression: &str) -> KosliResult<Self> {
        let SeparatorSplit::Split { head, tail, .. } =
            split_on_separator(expression, &[VERSION_MARKER])
        else {
            return Err(KosliError::MissingVersionMarker {
                expression: expression.to_string(),
            });
        };

        if head.is_empty() {
            return Err(KosliError::MissingName {
                expression: expression.to_string(),
                what: "Attestation type",
            });
        }
        if tail.is_empty() {
            return Err(KosliError::MissingAttestationVersion {
                expression: expression.to_string(),
            });
        }

        Ok(Self {
            type_name: head.to_string(),
            version: tail.to_string(),
        })
    }
}

impl fmt::Display for AttestationTypeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_name, VERSION_MARKER, self.version)
    }
}

impl std::str::FromStr for AttestationTypeVersion {
    type Err = KosliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
