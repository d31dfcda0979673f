//! Serializable summaries of a selection for reporting collaborators.

use crate::error::Result;
use crate::model::{CaseId, GroupId, Metadata};
use crate::world::{RunSet, SelectedGroup, Selection, SkippedCase};
use serde::Serialize;

/// Case entry in a summary.
#[derive(Debug, Clone, Serialize)]
pub struct CaseSummary {
    pub id: CaseId,
    pub description: String,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Selected group entry in a summary.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub describes: Option<String>,
    pub examples: Vec<CaseSummary>,
}

/// Skipped case entry in a summary.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSummary {
    pub id: CaseId,
    pub description: String,
    pub reason: String,
}

/// Counts plus the selected groups, and the skips when built from a
/// [`Selection`].
#[derive(Debug, Clone, Serialize)]
pub struct RunSetSummary {
    pub group_count: usize,
    pub case_count: usize,
    pub groups: Vec<GroupSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedSummary>,
}

impl RunSetSummary {
    #[must_use]
    pub fn from_run_set(run_set: &RunSet<'_>) -> Self {
        Self {
            group_count: run_set.len(),
            case_count: run_set.case_count(),
            groups: run_set.iter().map(group_summary).collect(),
            skipped: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_selection(selection: &Selection<'_>) -> Self {
        Self {
            skipped: selection.skipped_cases.iter().map(skipped_summary).collect(),
            ..Self::from_run_set(&selection.run_set)
        }
    }

    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn group_summary(selected: &SelectedGroup<'_>) -> GroupSummary {
    GroupSummary {
        id: selected.group.id(),
        description: selected.group.description().to_string(),
        describes: selected.group.describes().map(|e| e.name().to_string()),
        examples: selected
            .examples_to_run
            .iter()
            .map(|case| CaseSummary {
                id: case.id(),
                description: case.description().to_string(),
                metadata: case.effective_metadata().clone(),
            })
            .collect(),
    }
}

fn skipped_summary(skipped: &SkippedCase<'_>) -> SkippedSummary {
    SkippedSummary {
        id: skipped.case.id(),
        description: skipped.case.description().to_string(),
        reason: skipped.reason.to_string(),
    }
}
