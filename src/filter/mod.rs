//! Filter expectations and the predicate evaluator.
//!
//! A [`FilterCriteria`] maps metadata keys to [`Expected`] values. The
//! reserved [`GROUP_LINK_KEY`] holds a [`GroupCriteria`] that inspects the
//! owning group instead of metadata.
//!
//! [`evaluate`] decides whether one stored value satisfies one expectation.
//! It never fails: shapes it does not understand simply do not match.

mod pattern;
mod predicate;

pub use pattern::Pattern;
pub use predicate::{Predicate, ValuePredicate};

use crate::model::{EntityRef, Value};
use std::slice;

/// Criteria key that redirects matching to the owning group.
pub const GROUP_LINK_KEY: &str = "example_group";

/// Expected value for one criteria key.
#[derive(Debug, Clone)]
pub enum Expected {
    /// Scalar or sequence compared by structural equality.
    Value(Value),
    /// Regular expression matched against the value's string form.
    Pattern(Pattern),
    /// Caller-supplied test.
    Predicate(Predicate),
    /// Group-link criteria; only meaningful under [`GROUP_LINK_KEY`].
    Group(GroupCriteria),
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Pattern> for Expected {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<Predicate> for Expected {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<GroupCriteria> for Expected {
    fn from(criteria: GroupCriteria) -> Self {
        Self::Group(criteria)
    }
}

impl From<bool> for Expected {
    fn from(value: bool) -> Self {
        Self::Value(value.into())
    }
}

impl From<i32> for Expected {
    fn from(value: i32) -> Self {
        Self::Value(value.into())
    }
}

impl From<i64> for Expected {
    fn from(value: i64) -> Self {
        Self::Value(value.into())
    }
}

impl From<&str> for Expected {
    fn from(value: &str) -> Self {
        Self::Value(value.into())
    }
}

impl From<String> for Expected {
    fn from(value: String) -> Self {
        Self::Value(value.into())
    }
}

impl From<EntityRef> for Expected {
    fn from(value: EntityRef) -> Self {
        Self::Value(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Expected {
    fn from(values: Vec<T>) -> Self {
        Self::Value(values.into())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Expected {
    fn from(values: [T; N]) -> Self {
        Self::Value(values.into())
    }
}

/// Decide whether `actual` satisfies `expected`.
#[must_use]
pub fn evaluate(actual: &Value, expected: &Expected) -> bool {
    match expected {
        Expected::Pattern(pattern) => actual
            .match_str()
            .is_some_and(|text| pattern.is_match(&text)),
        Expected::Predicate(predicate) => predicate.test(actual),
        Expected::Value(Value::List(items)) => {
            matches!(actual, Value::List(actual_items) if actual_items == items)
        }
        Expected::Value(value) => actual == value,
        Expected::Group(_) => false,
    }
}

/// Sub-criteria for the group-link key.
///
/// Every field that is set must match.
#[derive(Debug, Clone, Default)]
pub struct GroupCriteria {
    /// Matched against the group's described entity.
    pub describes: Option<Box<Expected>>,
    /// Matched against the group's description text.
    pub description: Option<Box<Expected>>,
}

impl GroupCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_describes(mut self, expected: impl Into<Expected>) -> Self {
        self.describes = Some(Box::new(expected.into()));
        self
    }

    #[must_use]
    pub fn with_description(mut self, expected: impl Into<Expected>) -> Self {
        self.description = Some(Box::new(expected.into()));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.describes.is_none() && self.description.is_none()
    }
}

/// Ordered map of criteria key to expectation.
///
/// Keys keep insertion order; inserting an existing key replaces its
/// expectation in place.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    entries: Vec<(String, Expected)>,
}

impl FilterCriteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, expected: impl Into<Expected>) -> Self {
        self.insert(key, expected);
        self
    }

    /// Builder: add group-link criteria.
    #[must_use]
    pub fn with_group(self, criteria: GroupCriteria) -> Self {
        self.with(GROUP_LINK_KEY, criteria)
    }

    /// Insert a key, returning the expectation it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        expected: impl Into<Expected>,
    ) -> Option<Expected> {
        let key = key.into();
        let expected = expected.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(slot, expected));
        }
        self.entries.push((key, expected));
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<Expected> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Expected> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, expected)| expected)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> slice::Iter<'_, (String, Expected)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another set of criteria on top of this one (its keys win).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, expected) in &other.entries {
            self.insert(key.clone(), expected.clone());
        }
    }
}

impl<K: Into<String>, E: Into<Expected>> FromIterator<(K, E)> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        let mut criteria = Self::new();
        for (key, expected) in iter {
            criteria.insert(key, expected);
        }
        criteria
    }
}

impl<'a> IntoIterator for &'a FilterCriteria {
    type Item = &'a (String, Expected);
    type IntoIter = slice::Iter<'a, (String, Expected)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
