//! Selection engine.
//!
//! The [`World`] owns every registered group plus the process-wide inclusion
//! and exclusion criteria, and turns them into a [`RunSet`]. Its lifecycle is
//! linear: register groups, configure filters, then select. Selection borrows
//! the world immutably, so filters cannot change while a run-set is alive.

use crate::config::FilterConfig;
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::matcher::{Filterable, first_mismatch, matches};
use crate::model::{Case, CaseId, Group, GroupDecl, GroupId};
use std::fmt;
use tracing::{debug, trace};

/// Keep the entities that match `criteria`, in order.
///
/// Empty criteria select nothing.
pub fn apply_inclusion_filters<I>(entities: I, criteria: &FilterCriteria) -> Vec<I::Item>
where
    I: IntoIterator,
    I::Item: Filterable,
{
    if criteria.is_empty() {
        return Vec::new();
    }
    entities
        .into_iter()
        .filter(|entity| matches(entity, criteria))
        .collect()
}

/// Drop the entities that match `criteria`, in order.
///
/// Empty criteria drop nothing.
pub fn apply_exclusion_filters<I>(entities: I, criteria: &FilterCriteria) -> Vec<I::Item>
where
    I: IntoIterator,
    I::Item: Filterable,
{
    if criteria.is_empty() {
        return entities.into_iter().collect();
    }
    entities
        .into_iter()
        .filter(|entity| !matches(entity, criteria))
        .collect()
}

/// Registry of groups and the filters applied to them.
#[derive(Debug, Default)]
pub struct World {
    groups: Vec<Group>,
    inclusion: FilterCriteria,
    exclusion: FilterCriteria,
}

impl World {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare and register a group.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::Validation` if the declaration is invalid.
    pub fn register(&mut self, decl: GroupDecl) -> Result<GroupId> {
        let group = Group::declare(decl)?;
        Ok(self.add_group(group))
    }

    /// Register an already declared group.
    pub fn add_group(&mut self, group: Group) -> GroupId {
        let id = group.id();
        debug!(
            group = %id,
            description = group.description(),
            cases = group.cases().len(),
            "Registered example group"
        );
        self.groups.push(group);
        id
    }

    /// Registered groups in registration order.
    #[must_use]
    pub fn example_groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| group.id() == id)
    }

    #[must_use]
    pub fn case(&self, id: CaseId) -> Option<&Case> {
        self.group(id.group()).and_then(|group| group.case(id))
    }

    #[must_use]
    pub const fn inclusion_filter(&self) -> &FilterCriteria {
        &self.inclusion
    }

    #[must_use]
    pub const fn exclusion_filter(&self) -> &FilterCriteria {
        &self.exclusion
    }

    pub fn set_inclusion_filter(&mut self, criteria: FilterCriteria) {
        self.inclusion = criteria;
    }

    pub fn set_exclusion_filter(&mut self, criteria: FilterCriteria) {
        self.exclusion = criteria;
    }

    /// Replace both filters with a loaded configuration.
    pub fn configure(&mut self, config: FilterConfig) {
        let include: Vec<&str> = config.include.keys().collect();
        let exclude: Vec<&str> = config.exclude.keys().collect();
        debug!(?include, ?exclude, "Configured filters");
        self.inclusion = config.include;
        self.exclusion = config.exclude;
    }

    /// Select the groups and cases to run.
    ///
    /// With no inclusion filter configured every case is a candidate; the
    /// exclusion filter then removes cases, and groups left empty are dropped.
    #[must_use]
    pub fn select_run_set(&self) -> RunSet<'_> {
        debug!(
            groups = self.groups.len(),
            include = self.inclusion.len(),
            exclude = self.exclusion.len(),
            "Selecting run set"
        );

        let groups = self
            .groups
            .iter()
            .filter_map(|group| {
                let candidates = if self.inclusion.is_empty() {
                    group.cases().iter().collect()
                } else {
                    apply_inclusion_filters(group.cases(), &self.inclusion)
                };
                let examples_to_run = apply_exclusion_filters(candidates, &self.exclusion);
                if examples_to_run.is_empty() {
                    trace!(group = %group.id(), "No examples left to run");
                    return None;
                }
                Some(SelectedGroup {
                    group,
                    examples_to_run,
                })
            })
            .collect::<Vec<_>>();

        let run_set = RunSet { groups };
        debug!(
            groups = run_set.len(),
            cases = run_set.case_count(),
            "Selected run set"
        );
        run_set
    }

    /// Select the run-set and record why every other case is skipped.
    #[must_use]
    pub fn select_with_report(&self) -> Selection<'_> {
        let mut groups = Vec::new();
        let mut skipped_cases = Vec::new();
        let mut skipped_groups = Vec::new();

        for group in &self.groups {
            let mut examples_to_run = Vec::new();
            for case in group.cases() {
                match self.skip_reason(case) {
                    Some(reason) => {
                        trace!(case = %case.id(), %reason, "Skipping example");
                        skipped_cases.push(SkippedCase { case, reason });
                    }
                    None => examples_to_run.push(case),
                }
            }

            if examples_to_run.is_empty() {
                skipped_groups.push(group);
            } else {
                groups.push(SelectedGroup {
                    group,
                    examples_to_run,
                });
            }
        }

        Selection {
            run_set: RunSet { groups },
            skipped_cases,
            skipped_groups,
        }
    }

    fn skip_reason(&self, case: &Case) -> Option<SkipReason> {
        if let Some(key) = first_mismatch(case, &self.inclusion) {
            return Some(SkipReason::NotIncluded {
                key: key.to_string(),
            });
        }
        if !self.exclusion.is_empty() && matches(case, &self.exclusion) {
            return Some(SkipReason::Excluded);
        }
        None
    }
}

/// A group chosen to run, with the cases that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedGroup<'w> {
    pub group: &'w Group,
    pub examples_to_run: Vec<&'w Case>,
}

/// Ordered selection result consumed by the execution layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSet<'w> {
    groups: Vec<SelectedGroup<'w>>,
}

impl<'w> RunSet<'w> {
    #[must_use]
    pub fn groups(&self) -> &[SelectedGroup<'w>] {
        &self.groups
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedGroup<'w>> {
        self.groups.iter()
    }

    /// Number of selected groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of selected cases across all groups.
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.groups
            .iter()
            .map(|selected| selected.examples_to_run.len())
            .sum()
    }

    /// Cases to run for `id`, if the group was selected.
    #[must_use]
    pub fn examples_to_run(&self, id: GroupId) -> Option<&[&'w Case]> {
        self.groups
            .iter()
            .find(|selected| selected.group.id() == id)
            .map(|selected| selected.examples_to_run.as_slice())
    }

    #[must_use]
    pub fn contains_case(&self, id: CaseId) -> bool {
        self.examples_to_run(id.group())
            .is_some_and(|cases| cases.iter().any(|case| case.id() == id))
    }
}

impl<'a, 'w> IntoIterator for &'a RunSet<'w> {
    type Item = &'a SelectedGroup<'w>;
    type IntoIter = std::slice::Iter<'a, SelectedGroup<'w>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Why a case was left out of the run-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The inclusion filter failed on `key`.
    NotIncluded { key: String },
    /// Every key of the exclusion filter matched.
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotIncluded { key } => write!(f, "not included: '{key}' did not match"),
            Self::Excluded => f.write_str("excluded by filter"),
        }
    }
}

/// A case left out of the run-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCase<'w> {
    pub case: &'w Case,
    pub reason: SkipReason,
}

/// Run-set plus the skip report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'w> {
    pub run_set: RunSet<'w>,
    pub skipped_cases: Vec<SkippedCase<'w>>,
    /// Groups with no case left to run.
    pub skipped_groups: Vec<&'w Group>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityRef, Metadata};

    fn awesome_world() -> (World, GroupId) {
        let mut world = World::new();
        let id = world
            .register(
                GroupDecl::describing(EntityRef::named("Bar"), "find these examples")
                    .example_with(
                        "I have no options",
                        Metadata::new().with("color", "red").with("awesome", true),
                    )
                    .example_with(
                        "I also have no options",
                        Metadata::new().with("color", "red").with("awesome", true),
                    )
                    .example_with(
                        "not so awesome",
                        Metadata::new().with("color", "red").with("awesome", false),
                    ),
            )
            .unwrap();
        (world, id)
    }

    #[test]
    fn no_filters_runs_everything() {
        let (world, id) = awesome_world();
        let run_set = world.select_run_set();
        assert_eq!(run_set.len(), 1);
        assert_eq!(run_set.examples_to_run(id).map(<[_]>::len), Some(3));
    }

    #[test]
    fn inclusion_then_exclusion() {
        let (mut world, id) = awesome_world();
        world.set_inclusion_filter(FilterCriteria::new().with("color", "red"));
        world.set_exclusion_filter(FilterCriteria::new().with("awesome", false));

        let run_set = world.select_run_set();
        let group = world.group(id).unwrap();
        assert_eq!(run_set.groups()[0].group, group);
        assert_eq!(
            run_set.examples_to_run(id).unwrap(),
            &[&group.cases()[0], &group.cases()[1]]
        );
        assert!(!run_set.contains_case(group.cases()[2].id()));
    }

    #[test]
    fn groups_without_cases_are_dropped() {
        let (mut world, _) = awesome_world();
        world.set_inclusion_filter(FilterCriteria::new().with("color", "green"));
        assert!(world.select_run_set().is_empty());
    }

    #[test]
    fn report_explains_skips() {
        let (mut world, id) = awesome_world();
        world.set_exclusion_filter(FilterCriteria::new().with("awesome", false));
        let selection = world.select_with_report();
        assert_eq!(selection.run_set, world.select_run_set());
        assert_eq!(selection.skipped_cases.len(), 1);
        assert_eq!(selection.skipped_cases[0].reason, SkipReason::Excluded);

        world.set_exclusion_filter(FilterCriteria::new());
        world.set_inclusion_filter(FilterCriteria::new().with("color", "red").with("fast", true));
        let selection = world.select_with_report();
        assert!(selection.run_set.is_empty());
        assert_eq!(selection.skipped_groups.len(), 1);
        assert_eq!(selection.skipped_groups[0].id(), id);
        assert!(selection.skipped_cases.iter().all(|skipped| skipped.reason
            == SkipReason::NotIncluded {
                key: "fast".to_string()
            }));
    }

    #[test]
    fn case_lookup_by_id() {
        let (world, id) = awesome_world();
        let case_id = world.group(id).unwrap().cases()[2].id();
        assert_eq!(world.case(case_id).map(Case::description), Some("not so awesome"));
    }

    #[test]
    fn skip_reason_display() {
        let reason = SkipReason::NotIncluded {
            key: "color".to_string(),
        };
        assert_eq!(reason.to_string(), "not included: 'color' did not match");
        assert_eq!(SkipReason::Excluded.to_string(), "excluded by filter");
    }
}
