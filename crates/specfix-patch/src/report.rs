//! Per-edit outcomes of a patch run.

use std::fmt;

use serde::Serialize;
use specfix_types::{EditKind, Path};

/// What an applied edit did to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Created,
    Updated,
    Added,
    Deleted,
    Renamed,
    Modified,
    Appended,
    Removed,
    Replaced,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
            Self::Modified => "modified",
            Self::Appended => "appended",
            Self::Removed => "removed",
            Self::Replaced => "replaced",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an edit left the document untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyCorrect,
    AlreadyExists,
    AlreadyPresent,
    AlreadyInPosition,
    NotFound,
    KeyNotFound,
    NoMatchingElement,
    ArrayNotFound,
    ArrayItemNotFound,
    /// A move recorded without a content hash; there is nothing to check.
    Untracked,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyCorrect => "already correct",
            Self::AlreadyExists => "already exists",
            Self::AlreadyPresent => "already present",
            Self::AlreadyInPosition => "already in position",
            Self::NotFound => "not found",
            Self::KeyNotFound => "key not found",
            Self::NoMatchingElement => "no matching element",
            Self::ArrayNotFound => "array not found",
            Self::ArrayItemNotFound => "array item not found",
            Self::Untracked => "not array-tracked",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Applied(Action),
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied(action) => write!(f, "{action}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// The outcome of one edit, in edit-set order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EditOutcome {
    pub path: Path,
    pub kind: EditKind,
    pub description: String,
    pub outcome: Outcome,
}

impl EditOutcome {
    /// `"<action>: <description>"` or `"skipped: <reason>: <description>"`.
    pub fn message(&self) -> String {
        format!("{}: {}", self.outcome, self.description)
    }
}

/// Everything a patch run did and did not do.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<EditOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> impl Iterator<Item = String> + '_ {
        self.outcomes
            .iter()
            .filter(|o| o.outcome.is_applied())
            .map(EditOutcome::message)
    }

    pub fn skipped(&self) -> impl Iterator<Item = String> + '_ {
        self.outcomes
            .iter()
            .filter(|o| !o.outcome.is_applied())
            .map(EditOutcome::message)
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_applied()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }

    /// Returns `true` if no edit changed the document.
    pub fn is_noop(&self) -> bool {
        self.applied_count() == 0
    }

    pub(crate) fn push(&mut self, outcome: EditOutcome) {
        self.outcomes.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specfix_types::path;

    fn outcome(outcome: Outcome) -> EditOutcome {
        EditOutcome {
            path: path!["info", "title"],
            kind: EditKind::SetValue,
            description: "Update title".into(),
            outcome,
        }
    }

    #[test]
    fn messages() {
        assert_eq!(
            outcome(Outcome::Applied(Action::Updated)).message(),
            "updated: Update title"
        );
        assert_eq!(
            outcome(Outcome::Skipped(SkipReason::AlreadyCorrect)).message(),
            "skipped: already correct: Update title"
        );
    }

    #[test]
    fn counts_and_filters() {
        let report = ApplyReport {
            outcomes: vec![
                outcome(Outcome::Applied(Action::Created)),
                outcome(Outcome::Skipped(SkipReason::NotFound)),
                outcome(Outcome::Skipped(SkipReason::KeyNotFound)),
            ],
        };
        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.skipped_count(), 2);
        assert!(!report.is_noop());
        assert_eq!(report.applied().collect::<Vec<_>>(), vec!["created: Update title"]);
        assert_eq!(report.skipped().count(), 2);
        assert!(ApplyReport::default().is_noop());
    }

    #[test]
    fn outcome_serializes_tagged() {
        let wire = serde_json::to_value(outcome(Outcome::Skipped(SkipReason::ArrayNotFound))).unwrap();
        assert_eq!(wire["outcome"]["status"], "skipped");
        assert_eq!(wire["outcome"]["detail"], "array_not_found");
        assert_eq!(wire["path"], "info|title");
        assert_eq!(wire["kind"], "set_value");
    }
}
