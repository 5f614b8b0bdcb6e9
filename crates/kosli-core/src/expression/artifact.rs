//! Artifact expressions: `flow@fingerprint`, `flow:commit`.

use std::fmt;

use serde::Serialize;

use super::{describe_separators, split_on_separator, SeparatorSplit};
use crate::error::{KosliError, KosliResult};

const SEPARATORS: &[&str] = &["@", ":"];

/// Which separator introduced the artifact identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArtifactSeparator {
    /// `flow@identity`: the identity is a fingerprint.
    #[serde(rename = "@")]
    At,
    /// `flow:identity`: the identity is a commit sha or name.
    #[serde(rename = ":")]
    Colon,
}

impl ArtifactSeparator {
    fn from_symbol(separator: &str) -> Self {
        if separator == "@" {
            Self::At
        } else {
            Self::Colon
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::At => '@',
            Self::Colon => ':',
        }
    }

    pub fn is_fingerprint(self) -> bool {
        self == Self::At
    }
}

/// A flow name plus the identity of one of its artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReference {
    pub flow_name: String,
    pub identity: String,
    pub separator: ArtifactSeparator,
}

impl ArtifactReference {
    /// Parse an artifact expression.
    ///
    /// ```
    /// use kosli_core::{ArtifactReference, ArtifactSeparator};
    ///
    /// let by_fingerprint = ArtifactReference::parse("backend@abc123").unwrap();
    /// assert_eq!(by_fingerprint.separator, ArtifactSeparator::At);
    ///
    /// let by_commit = ArtifactReference::parse("backend:0a1b2c").unwrap();
    /// assert_eq!(by_commit.identity, "0a1b2c");
    /// ```
    pub fn parse(expression: &str) -> KosliResult<Self> {
        let (flow_name, separator, identity) = match split_on_separator(expression, SEPARATORS) {
            SeparatorSplit::Split {
                head,
                separator,
                tail,
            } => (head, separator, tail),
            SeparatorSplit::Conflict => {
                return Err(KosliError::AmbiguousSeparator {
                    expression: expression.to_string(),
                    separators: describe_separators(SEPARATORS),
                })
            }
            SeparatorSplit::Unsplit => {
                return Err(KosliError::MissingIdentity {
                    expression: expression.to_string(),
                })
            }
        };

        if flow_name.is_empty() {
            return Err(KosliError::MissingName {
                expression: expression.to_string(),
                what: "Flow",
            });
        }
        if identity.is_empty() {
            return Err(KosliError::MissingIdentity {
                expression: expression.to_string(),
            });
        }

        Ok(Self {
            flow_name: flow_name.to_string(),
            identity: identity.to_string(),
            separator: ArtifactSeparator::from_symbol(separator),
        })
    }

    /// Path segment identifying the artifact within its flow.
    pub fn path_segment(&self) -> &str {
        &self.identity
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.flow_name,
            self.separator.as_char(),
            self.identity
        )
    }
}

impl std::str::FromStr for ArtifactReference {
    type Err = KosliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_separator() {
        let r = ArtifactReference::parse("myflow@abc123").unwrap();
        assert_eq!(r.flow_name, "myflow");
        assert_eq!(r.identity, "abc123");
        assert_eq!(r.separator, ArtifactSeparator::At);
        assert!(r.separator.is_fingerprint());
    }

    #[test]
    fn colon_separator() {
        let r = ArtifactReference::parse("myflow:abc123").unwrap();
        assert_eq!(r.flow_name, "myflow");
        assert_eq!(r.identity, "abc123");
        assert_eq!(r.separator, ArtifactSeparator::Colon);
        assert!(!r.separator.is_fingerprint());
    }

    #[test]
    fn both_separators_is_ambiguous() {
        let err = ArtifactReference::parse("myflow@abc:def").unwrap_err();
        assert!(matches!(err, KosliError::AmbiguousSeparator { .. }));
        assert!(err.to_string().contains("'@' or ':'"));
    }

    #[test]
    fn no_separator_has_no_identity() {
        assert!(matches!(
            ArtifactReference::parse("myflow"),
            Err(KosliError::MissingIdentity { .. })
        ));
    }

    #[test]
    fn empty_parts() {
        assert!(matches!(
            ArtifactReference::parse("@abc"),
            Err(KosliError::MissingName { .. })
        ));
        assert!(matches!(
            ArtifactReference::parse("myflow:"),
            Err(KosliError::MissingIdentity { .. })
        ));
    }

    #[test]
    fn identity_keeps_later_separators() {
        let r = ArtifactReference::parse("flow@sha@more").unwrap();
        assert_eq!(r.identity, "sha@more");
    }

    #[test]
    fn display_and_segment() {
        let r: ArtifactReference = "api:v1.2".parse().unwrap();
        assert_eq!(r.to_string(), "api:v1.2");
        assert_eq!(r.path_segment(), "v1.2");
    }

    #[test]
    fn serializes_separator_as_char() {
        let r = ArtifactReference::parse("api@ff").unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["separator"], "@");
    }
}
