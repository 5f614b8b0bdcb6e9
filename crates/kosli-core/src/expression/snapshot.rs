//! Snapshot expressions: `env`, `env~N`, `env#N`, `env@<time>`.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use super::{describe_separators, split_on_separator, SeparatorSplit};
use crate::error::{KosliError, KosliResult};

const SEPARATORS: &[&str] = &["@", "~", "#"];

/// Fragment meaning "the latest snapshot".
pub const LATEST_FRAGMENT: &str = "-1";

/// Everything except ASCII alphanumerics and `-`, `.`, `_` is escaped, so the
/// separator itself never reaches the path unescaped.
const FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');

/// An environment name plus a path-safe snapshot fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotReference {
    pub environment_name: String,
    pub encoded_fragment: String,
}

impl SnapshotReference {
    /// Parse a snapshot expression.
    ///
    /// ```
    /// use kosli_core::SnapshotReference;
    ///
    /// let latest = SnapshotReference::parse("prod").unwrap();
    /// assert_eq!(latest.encoded_fragment, "-1");
    ///
    /// let pinned = SnapshotReference::parse("prod#3").unwrap();
    /// assert_eq!(pinned.encoded_fragment, "%233");
    /// ```
    pub fn parse(expression: &str) -> KosliResult<Self> {
        match split_on_separator(expression, SEPARATORS) {
            SeparatorSplit::Unsplit => {
                if expression.is_empty() {
                    return Err(missing_name(expression));
                }
                Ok(Self {
                    environment_name: expression.to_string(),
                    encoded_fragment: LATEST_FRAGMENT.to_string(),
                })
            }
            SeparatorSplit::Conflict => Err(KosliError::AmbiguousSeparator {
                expression: expression.to_string(),
                separators: describe_separators(SEPARATORS),
            }),
            SeparatorSplit::Split {
                head,
                separator,
                tail,
            } => {
                if head.is_empty() {
                    return Err(missing_name(expression));
                }
                let raw = format!("{}{}", separator, tail);
                Ok(Self {
                    environment_name: head.to_string(),
                    encoded_fragment: utf8_percent_encode(&raw, FRAGMENT).to_string(),
                })
            }
        }
    }

    /// Whether this points at the latest snapshot.
    pub fn is_latest(&self) -> bool {
        self.encoded_fragment == LATEST_FRAGMENT
    }

    /// Suffix appended to the snapshot request path.
    pub fn path_suffix(&self) -> &str {
        &self.encoded_fragment
    }
}

fn missing_name(expression: &str) -> KosliError {
    KosliError::MissingName {
        expression: expression.to_string(),
        what: "Environment",
    }
}

impl fmt::Display for SnapshotReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.environment_name, self.encoded_fragment)
    }
}

impl std::str::FromStr for SnapshotReference {
    type Err = KosliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(expr: &str) -> (String, String) {
        let r = SnapshotReference::parse(expr).unwrap();
        (r.environment_name, r.encoded_fragment)
    }

    #[test]
    fn plain_name_is_latest() {
        assert_eq!(parsed("prod"), ("prod".to_string(), "-1".to_string()));
        assert!(SnapshotReference::parse("prod").unwrap().is_latest());
    }

    #[test]
    fn each_separator_is_encoded() {
        assert_eq!(parsed("prod~2"), ("prod".to_string(), "%7E2".to_string()));
        assert_eq!(parsed("prod#2"), ("prod".to_string(), "%232".to_string()));
        assert_eq!(
            parsed("prod@2023-01-01T00:00:00Z"),
            ("prod".to_string(), "%402023-01-01T00%3A00%3A00Z".to_string())
        );
    }

    #[test]
    fn remainder_characters_are_escaped() {
        let (_, fragment) = parsed("prod@2023-01-01 10:00/x?y");
        assert!(!fragment.contains('/'));
        assert!(!fragment.contains('?'));
        assert!(!fragment.contains(' '));
        assert!(fragment.starts_with("%40"));
    }

    #[test]
    fn any_two_separators_conflict() {
        for expr in ["prod~2#3", "prod~2@now", "prod#2@now", "prod@a~b#c"] {
            assert!(
                matches!(
                    SnapshotReference::parse(expr),
                    Err(KosliError::AmbiguousSeparator { .. })
                ),
                "{} should be ambiguous",
                expr
            );
        }
    }

    #[test]
    fn missing_environment_name() {
        for expr in ["~1", "#1", "@now", ""] {
            assert!(
                matches!(
                    SnapshotReference::parse(expr),
                    Err(KosliError::MissingName {
                        what: "Environment",
                        ..
                    })
                ),
                "{:?} should miss a name",
                expr
            );
        }
    }

    #[test]
    fn path_suffix_is_fragment() {
        let r = SnapshotReference::parse("staging#14").unwrap();
        assert_eq!(r.path_suffix(), "%2314");
        assert!(!r.is_latest());
        assert_eq!(r.to_string(), "staging/%2314");
    }
}
