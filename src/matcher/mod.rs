//! Entity matcher: applies a whole [`FilterCriteria`] to a group or case.
//!
//! Criteria are a conjunction. Keys are checked in insertion order and the
//! first failing key ends the match. A key missing from the entity's
//! effective metadata fails; the group-link key is answered by the owning
//! group's identity instead.

use crate::filter::{Expected, FilterCriteria, GROUP_LINK_KEY, evaluate};
use crate::model::{Case, Group, GroupIdentity, Metadata, Value};

/// Something the matcher can filter: a group or a case.
pub trait Filterable {
    /// Metadata the matcher reads.
    fn effective_metadata(&self) -> &Metadata;

    /// Group consulted by the group-link key.
    fn group_identity(&self) -> &GroupIdentity;
}

impl Filterable for Group {
    fn effective_metadata(&self) -> &Metadata {
        self.metadata()
    }

    fn group_identity(&self) -> &GroupIdentity {
        self.identity()
    }
}

impl Filterable for Case {
    fn effective_metadata(&self) -> &Metadata {
        Self::effective_metadata(self)
    }

    fn group_identity(&self) -> &GroupIdentity {
        self.group()
    }
}

impl<T: Filterable + ?Sized> Filterable for &T {
    fn effective_metadata(&self) -> &Metadata {
        (**self).effective_metadata()
    }

    fn group_identity(&self) -> &GroupIdentity {
        (**self).group_identity()
    }
}

/// Does `entity` satisfy every key of `criteria`?
#[must_use]
pub fn matches<E: Filterable + ?Sized>(entity: &E, criteria: &FilterCriteria) -> bool {
    first_mismatch(entity, criteria).is_none()
}

/// The first key of `criteria` that `entity` fails, if any.
#[must_use]
pub fn first_mismatch<'c, E: Filterable + ?Sized>(
    entity: &E,
    criteria: &'c FilterCriteria,
) -> Option<&'c str> {
    criteria
        .iter()
        .find(|(key, expected)| !key_matches(entity, key, expected))
        .map(|(key, _)| key.as_str())
}

fn key_matches<E: Filterable + ?Sized>(entity: &E, key: &str, expected: &Expected) -> bool {
    if key == GROUP_LINK_KEY {
        return group_matches(entity.group_identity(), expected);
    }
    entity
        .effective_metadata()
        .get(key)
        .is_some_and(|actual| evaluate(actual, expected))
}

fn group_matches(group: &GroupIdentity, expected: &Expected) -> bool {
    let Expected::Group(criteria) = expected else {
        return false;
    };

    let describes_ok = criteria.describes.as_deref().is_none_or(|expected| {
        group
            .describes()
            .is_some_and(|entity| evaluate(&Value::Entity(entity.clone()), expected))
    });
    if !describes_ok {
        return false;
    }

    criteria.description.as_deref().is_none_or(|expected| {
        evaluate(&Value::Str(group.description().to_string()), expected)
    })
}
