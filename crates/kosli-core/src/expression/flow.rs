//! Flow expressions: `name`, `name#N`, `name~N`.

use std::fmt;

use serde::Serialize;

use super::{describe_separators, split_on_separator, SeparatorSplit};
use crate::error::{KosliError, KosliResult};

const SEPARATORS: &[&str] = &["~", "#"];

/// Ordinal meaning "the latest entry".
pub const LATEST_ORDINAL: i64 = -1;

/// A flow name plus a signed ordinal.
///
/// `ordinal >= 0` is an absolute position, `-1` is the latest entry and
/// `-(N + 1)` is `N` entries before the latest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowReference {
    pub name: String,
    pub ordinal: i64,
}

impl FlowReference {
    /// Parse a flow expression.
    ///
    /// ```
    /// use kosli_core::FlowReference;
    ///
    /// let latest = FlowReference::parse("build").unwrap();
    /// assert_eq!(latest.ordinal, -1);
    ///
    /// let pinned = FlowReference::parse("build#5").unwrap();
    /// assert_eq!(pinned.ordinal, 5);
    ///
    /// let back = FlowReference::parse("build~3").unwrap();
    /// assert_eq!(back.ordinal, -4);
    /// ```
    pub fn parse(expression: &str) -> KosliResult<Self> {
        let (name, separator, count) = match split_on_separator(expression, SEPARATORS) {
            SeparatorSplit::Unsplit => {
                return Ok(Self {
                    name: expression.to_string(),
                    ordinal: LATEST_ORDINAL,
                })
            }
            SeparatorSplit::Conflict => {
                return Err(KosliError::AmbiguousSeparator {
                    expression: expression.to_string(),
                    separators: describe_separators(SEPARATORS),
                })
            }
            SeparatorSplit::Split {
                head,
                separator,
                tail,
            } => (head, separator, tail),
        };

        if name.is_empty() {
            return Err(KosliError::MissingName {
                expression: expression.to_string(),
                what: "Flow",
            });
        }

        let value: u64 = count.parse().map_err(|_| KosliError::NonIntegerOrdinal {
            expression: expression.to_string(),
            value: count.to_string(),
        })?;
        let value = i64::try_from(value).map_err(|_| KosliError::OrdinalOutOfRange {
            expression: expression.to_string(),
            value: count.to_string(),
        })?;

        // !n == -n - 1, and stays in range for n == i64::MAX
        let ordinal = if separator == "~" { !value } else { value };

        Ok(Self {
            name: name.to_string(),
            ordinal,
        })
    }

    /// Whether this points at the latest entry.
    pub fn is_latest(&self) -> bool {
        self.ordinal == LATEST_ORDINAL
    }

    /// Whether this is an absolute position (`name#N`).
    pub fn is_absolute(&self) -> bool {
        self.ordinal >= 0
    }

    /// How many entries before the latest this points at, for relative refs.
    pub fn steps_back(&self) -> Option<u64> {
        (self.ordinal < 0).then(|| (!self.ordinal) as u64)
    }

    /// The `id=<ordinal>` query parameter sent to the server.
    pub fn query(&self) -> String {
        format!("id={}", self.ordinal)
    }
}

impl fmt::Display for FlowReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.steps_back() {
            None => write!(f, "{}#{}", self.name, self.ordinal),
            Some(0) => write!(f, "{}", self.name),
            Some(n) => write!(f, "{}~{}", self.name, n),
        }
    }
}

impl std::str::FromStr for FlowReference {
    type Err = KosliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(expr: &str) -> (String, i64) {
        let r = FlowReference::parse(expr).unwrap();
        (r.name, r.ordinal)
    }

    #[test]
    fn plain_name_is_latest() {
        assert_eq!(parsed("build"), ("build".to_string(), -1));
        assert_eq!(parsed("my-flow_2.x"), ("my-flow_2.x".to_string(), -1));
    }

    #[test]
    fn empty_expression_passes_through() {
        assert_eq!(parsed(""), (String::new(), -1));
    }

    #[test]
    fn absolute_ordinal() {
        assert_eq!(parsed("build#5"), ("build".to_string(), 5));
        assert_eq!(parsed("build#0"), ("build".to_string(), 0));
    }

    #[test]
    fn relative_ordinal_sign_flip() {
        assert_eq!(parsed("build~0"), ("build".to_string(), -1));
        assert_eq!(parsed("build~1"), ("build".to_string(), -2));
        assert_eq!(parsed("build~3"), ("build".to_string(), -4));
        for n in [0_i64, 1, 7, 41] {
            assert_eq!(parsed(&format!("f~{}", n)).1, -(n + 1));
        }
    }

    #[test]
    fn both_separators_is_ambiguous() {
        let err = FlowReference::parse("build~3#5").unwrap_err();
        assert!(matches!(err, KosliError::AmbiguousSeparator { ref expression, .. } if expression == "build~3#5"));
        assert_eq!(
            err.to_string(),
            "invalid expression: build~3#5. Only one of '~' or '#' can be present"
        );
    }

    #[test]
    fn missing_name() {
        assert!(matches!(
            FlowReference::parse("~3"),
            Err(KosliError::MissingName { what: "Flow", .. })
        ));
        assert!(matches!(
            FlowReference::parse("#1"),
            Err(KosliError::MissingName { .. })
        ));
    }

    #[test]
    fn non_integer_count() {
        match FlowReference::parse("build~x") {
            Err(KosliError::NonIntegerOrdinal { value, .. }) => assert_eq!(value, "x"),
            other => panic!("expected NonIntegerOrdinal, got {:?}", other),
        }
        assert!(matches!(
            FlowReference::parse("build#"),
            Err(KosliError::NonIntegerOrdinal { .. })
        ));
        assert!(matches!(
            FlowReference::parse("build~-2"),
            Err(KosliError::NonIntegerOrdinal { .. })
        ));
        assert!(matches!(
            FlowReference::parse("build~1~2"),
            Err(KosliError::NonIntegerOrdinal { .. })
        ));
    }

    #[test]
    fn counts_beyond_u32() {
        assert_eq!(parsed("build#4294967296"), ("build".to_string(), 4_294_967_296));
        assert_eq!(parsed("build~4294967296"), ("build".to_string(), -4_294_967_297));
        assert_eq!(parsed("build#9223372036854775807").1, i64::MAX);
        assert_eq!(parsed("build~9223372036854775807").1, i64::MIN);
    }

    #[test]
    fn count_above_i64_is_out_of_range() {
        let err = FlowReference::parse("build~9223372036854775808").unwrap_err();
        assert!(matches!(err, KosliError::OrdinalOutOfRange { ref value, .. } if value == "9223372036854775808"));
        assert_eq!(
            err.to_string(),
            "invalid expression: build~9223372036854775808. '9223372036854775808' is too large"
        );
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn extreme_ordinals_do_not_overflow() {
        let oldest = FlowReference {
            name: "build".to_string(),
            ordinal: i64::MIN,
        };
        assert_eq!(oldest.steps_back(), Some(i64::MAX as u64));
        assert_eq!(oldest.to_string(), format!("build~{}", i64::MAX));
    }

    #[test]
    fn accessors_and_query() {
        let latest = FlowReference::parse("build").unwrap();
        assert!(latest.is_latest());
        assert_eq!(latest.steps_back(), Some(0));
        assert_eq!(latest.query(), "id=-1");

        let pinned = FlowReference::parse("build#12").unwrap();
        assert!(pinned.is_absolute());
        assert_eq!(pinned.steps_back(), None);
        assert_eq!(pinned.query(), "id=12");

        let back = FlowReference::parse("build~2").unwrap();
        assert!(!back.is_absolute());
        assert_eq!(back.steps_back(), Some(2));
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(FlowReference::parse("build").unwrap().to_string(), "build");
        assert_eq!(FlowReference::parse("build~0").unwrap().to_string(), "build");
        assert_eq!(FlowReference::parse("build~3").unwrap().to_string(), "build~3");
        assert_eq!(FlowReference::parse("build#4").unwrap().to_string(), "build#4");
    }

    #[test]
    fn from_str() {
        let r: FlowReference = "deploy#9".parse().unwrap();
        assert_eq!(r.ordinal, 9);
    }
}
