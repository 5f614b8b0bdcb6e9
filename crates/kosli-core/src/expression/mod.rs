//! Shorthand expressions that address flows, snapshots, artifacts and
//! attestation type versions.
//!
//! | Expression | Meaning |
//! |------------|---------|
//! | `backend` | latest entry of flow `backend` |
//! | `backend#12` | entry 12 of flow `backend` |
//! | `backend~2` | two entries before the latest |
//! | `prod@2023-01-01T00:00:00Z` | snapshot of `prod` at a point in time |
//! | `backend@<fingerprint>` | artifact by fingerprint |
//! | `backend:<commit>` | artifact by commit |
//! | `junit@v2` | version 2 of attestation type `junit` |
//!
//! Each grammar is its own small parser on top of [`split_on_separator`],
//! so error messages stay specific to the grammar.

mod artifact;
mod attestation_type;
mod flow;
mod snapshot;

pub use artifact::{ArtifactReference, ArtifactSeparator};
pub use attestation_type::AttestationTypeVersion;
pub use flow::{FlowReference, LATEST_ORDINAL};
pub use snapshot::{SnapshotReference, LATEST_FRAGMENT};

/// Outcome of looking for mutually exclusive separators in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorSplit<'a> {
    /// None of the separators occur.
    Unsplit,
    /// Exactly one kind occurs; split on its first occurrence.
    Split {
        head: &'a str,
        separator: &'static str,
        tail: &'a str,
    },
    /// More than one kind occurs.
    Conflict,
}

/// Split `expression` on whichever of `separators` it contains.
///
/// Returns [`SeparatorSplit::Conflict`] when more than one kind is present.
/// Later occurrences of the chosen separator stay in the tail.
pub fn split_on_separator<'a>(
    expression: &'a str,
    separators: &[&'static str],
) -> SeparatorSplit<'a> {
    let mut present = separators.iter().filter(|sep| expression.contains(**sep));

    let Some(&separator) = present.next() else {
        return SeparatorSplit::Unsplit;
    };
    if present.next().is_some() {
        return SeparatorSplit::Conflict;
    }

    match expression.split_once(separator) {
        Some((head, tail)) => SeparatorSplit::Split {
            head,
            separator,
            tail,
        },
        None => SeparatorSplit::Unsplit,
    }
}

/// Render separators for error messages: `'~' or '#'`, `'@', '~' or '#'`.
pub(crate) fn describe_separators(separators: &[&str]) -> String {
    let quoted: Vec<String> = separators.iter().map(|s| format!("'{}'", s)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsplit_without_separators() {
        assert_eq!(split_on_separator("build", &["~", "#"]), SeparatorSplit::Unsplit);
    }

    #[test]
    fn splits_on_first_occurrence() {
        assert_eq!(
            split_on_separator("a~1~2", &["~", "#"]),
            SeparatorSplit::Split {
                head: "a",
                separator: "~",
                tail: "1~2"
            }
        );
    }

    #[test]
    fn conflict_when_two_kinds_present() {
        assert_eq!(split_on_separator("a~1#2", &["~", "#"]), SeparatorSplit::Conflict);
        assert_eq!(split_on_separator("a@b:c", &["@", ":"]), SeparatorSplit::Conflict);
    }

    #[test]
    fn multi_char_separator() {
        assert_eq!(
            split_on_separator("junit@v2", &["@v"]),
            SeparatorSplit::Split {
                head: "junit",
                separator: "@v",
                tail: "2"
            }
        );
    }

    #[test]
    fn describes_separator_lists() {
        assert_eq!(describe_separators(&["~", "#"]), "'~' or '#'");
        assert_eq!(describe_separators(&["@", "~", "#"]), "'@', '~' or '#'");
        assert_eq!(describe_separators(&["@"]), "'@'");
    }
}
