//! Caller-supplied predicate expectations.

use crate::model::Value;
use std::fmt;
use std::sync::Arc;

/// Capability to test one metadata value.
///
/// Implemented for every `Fn(&Value) -> bool + Send + Sync` closure.
pub trait ValuePredicate: Send + Sync {
    fn test(&self, actual: &Value) -> bool;
}

impl<F> ValuePredicate for F
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn test(&self, actual: &Value) -> bool {
        self(actual)
    }
}

/// A shareable predicate expectation.
#[derive(Clone)]
pub struct Predicate {
    label: String,
    inner: Arc<dyn ValuePredicate>,
}

impl Predicate {
    #[must_use]
    pub fn new(predicate: impl ValuePredicate + 'static) -> Self {
        Self::named("predicate", predicate)
    }

    /// Predicate with a label shown in `Debug` output.
    #[must_use]
    pub fn named(label: impl Into<String>, predicate: impl ValuePredicate + 'static) -> Self {
        Self {
            label: label.into(),
            inner: Arc::new(predicate),
        }
    }

    /// Matches when the value equals any of `values`.
    #[must_use]
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        let label = format!(
            "one_of({})",
            values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self::named(label, move |actual: &Value| values.contains(actual))
    }

    /// Matches string values containing `needle`.
    #[must_use]
    pub fn contains(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let label = format!("contains({needle:?})");
        Self::named(label, move |actual: &Value| {
            actual.as_str().is_some_and(|text| text.contains(needle.as_str()))
        })
    }

    #[must_use]
    pub fn test(&self, actual: &Value) -> bool {
        self.inner.test(actual)
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_predicate() {
        let predicate = Predicate::new(|value: &Value| value.as_bool() == Some(false));
        assert!(predicate.test(&Value::from(false)));
        assert!(!predicate.test(&Value::from(true)));
        assert_eq!(format!("{predicate:?}"), "Predicate(predicate)");
    }

    #[test]
    fn one_of_membership() {
        let predicate = Predicate::one_of(["red", "blue"]);
        assert!(predicate.test(&Value::from("blue")));
        assert!(!predicate.test(&Value::from("green")));
        assert_eq!(predicate.label(), "one_of(\"red\", \"blue\")");
    }

    #[test]
    fn contains_only_matches_strings() {
        let predicate = Predicate::contains("-1");
        assert!(predicate.test(&Value::from("find group-1")));
        assert!(!predicate.test(&Value::from("find group-2")));
        assert!(!predicate.test(&Value::from(-1)));
        assert_eq!(predicate.label(), "contains(\"-1\")");
    }

    struct AlwaysTrue;

    impl ValuePredicate for AlwaysTrue {
        fn test(&self, _actual: &Value) -> bool {
            true
        }
    }

    #[test]
    fn trait_object_predicate() {
        let predicate = Predicate::named("always", AlwaysTrue);
        assert!(predicate.test(&Value::from([1, 2])));
        assert_eq!(format!("{predicate:?}"), "Predicate(always)");
    }
}
