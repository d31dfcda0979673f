//! Core data types for `example_filter`.
//!
//! This module defines the fundamental types the selection engine reads:
//! - `Value` - Tagged metadata value with structural equality
//! - `EntityRef` - Identity token for the thing a group describes
//! - `Metadata` - Key/value attribute bag
//! - `Group` / `Case` - Declared example groups and their examples
//! - `GroupDecl` / `CaseDecl` - Builders used to declare them

use crate::error::{Result, SelectError};
use crate::validation::DeclarationValidator;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Identity token for the entity a group describes.
///
/// Identity is by name: two references are equal when their names are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Reference a Rust type by its unqualified name.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let start = base.rfind("::").map_or(0, |idx| idx + 2);
        Self(full[start..].to_string())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Entity(EntityRef),
}

impl Value {
    /// String form used for pattern matching.
    ///
    /// Sequences have no string form.
    #[must_use]
    pub fn match_str(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Str(s) => Some(Cow::Borrowed(s)),
            Self::Int(n) => Some(Cow::Owned(n.to_string())),
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Entity(entity) => Some(Cow::Borrowed(entity.name())),
            Self::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Entity(entity) => write!(f, "{entity}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<EntityRef> for Value {
    fn from(value: EntityRef) -> Self {
        Self::Entity(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>, const N: usize> From<[T; N]> for Value {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Key/value attribute bag attached to a group or case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a key, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Return `self` overlaid by `top` (keys in `top` win).
    #[must_use]
    pub fn overlaid_with(&self, top: &Self) -> Self {
        let mut merged = self.clone();
        for (key, value) in &top.0 {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

static NEXT_GROUP_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u32);

impl GroupId {
    fn next() -> Self {
        Self(NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

impl Serialize for GroupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Case identifier: owning group plus 1-based declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId {
    group: GroupId,
    index: u32,
}

impl CaseId {
    #[must_use]
    pub const fn group(self) -> GroupId {
        self.group
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.index)
    }
}

impl Serialize for CaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The parts of a group that cases link back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIdentity {
    id: GroupId,
    description: String,
    describes: Option<EntityRef>,
}

impl GroupIdentity {
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn describes(&self) -> Option<&EntityRef> {
        self.describes.as_ref()
    }
}

/// A declared example group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    identity: Arc<GroupIdentity>,
    metadata: Metadata,
    cases: Vec<Case>,
}

impl Group {
    /// Validate a declaration and build the group, computing every case's
    /// effective metadata.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::Validation` if the declaration is invalid.
    pub fn declare(decl: GroupDecl) -> Result<Self> {
        DeclarationValidator::validate_group(&decl)
            .map_err(|errors| SelectError::Validation { errors })?;

        let description = match (decl.description, &decl.describes) {
            (Some(text), _) => text,
            (None, Some(entity)) => entity.name().to_string(),
            (None, None) => String::new(),
        };
        let identity = Arc::new(GroupIdentity {
            id: GroupId::next(),
            description,
            describes: decl.describes,
        });

        let cases = decl
            .cases
            .into_iter()
            .zip(1_u32..)
            .map(|(case, index)| Case {
                id: CaseId {
                    group: identity.id,
                    index,
                },
                effective: decl.metadata.overlaid_with(&case.metadata),
                description: case.description,
                metadata: case.metadata,
                group: Arc::clone(&identity),
            })
            .collect::<Vec<_>>();

        trace!(
            group = %identity.id,
            description = %identity.description,
            cases = cases.len(),
            "Declared group"
        );

        Ok(Self {
            identity,
            metadata: decl.metadata,
            cases,
        })
    }

    #[must_use]
    pub fn id(&self) -> GroupId {
        self.identity.id
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.identity.description
    }

    #[must_use]
    pub fn describes(&self) -> Option<&EntityRef> {
        self.identity.describes.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> &GroupIdentity {
        &self.identity
    }

    /// The group's own metadata, which is also its effective metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Cases in declaration order.
    #[must_use]
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    #[must_use]
    pub fn case(&self, id: CaseId) -> Option<&Case> {
        if id.group != self.id() {
            return None;
        }
        let idx = usize::try_from(id.index).ok()?.checked_sub(1)?;
        self.cases.get(idx)
    }
}

/// A single declared example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    id: CaseId,
    description: String,
    metadata: Metadata,
    effective: Metadata,
    group: Arc<GroupIdentity>,
}

impl Case {
    #[must_use]
    pub const fn id(&self) -> CaseId {
        self.id
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Group description followed by the case description.
    #[must_use]
    pub fn full_description(&self) -> String {
        format!("{} {}", self.group.description, self.description)
    }

    /// Metadata declared on the case itself.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Group metadata overlaid by the case's own metadata.
    #[must_use]
    pub const fn effective_metadata(&self) -> &Metadata {
        &self.effective
    }

    #[must_use]
    pub fn group(&self) -> &GroupIdentity {
        &self.group
    }
}

/// Declaration of a case inside a [`GroupDecl`].
#[derive(Debug, Clone, Default)]
pub struct CaseDecl {
    pub(crate) description: String,
    pub(crate) metadata: Metadata,
}

impl CaseDecl {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Declaration of a group, consumed by [`Group::declare`] or
/// `World::register`.
#[derive(Debug, Clone, Default)]
pub struct GroupDecl {
    pub(crate) description: Option<String>,
    pub(crate) describes: Option<EntityRef>,
    pub(crate) metadata: Metadata,
    pub(crate) cases: Vec<CaseDecl>,
}

impl GroupDecl {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Declare a group describing `entity`.
    #[must_use]
    pub fn describing(entity: EntityRef, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            describes: Some(entity),
            ..Self::default()
        }
    }

    /// Declare a group describing `entity` whose description is the entity name.
    #[must_use]
    pub fn for_entity(entity: EntityRef) -> Self {
        Self {
            describes: Some(entity),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append a case with no metadata of its own.
    #[must_use]
    pub fn example(self, description: impl Into<String>) -> Self {
        self.case(CaseDecl::new(description))
    }

    /// Append a case with its own metadata.
    #[must_use]
    pub fn example_with(self, description: impl Into<String>, metadata: Metadata) -> Self {
        self.case(CaseDecl::new(description).with_metadata(metadata))
    }

    #[must_use]
    pub fn case(mut self, case: CaseDecl) -> Self {
        self.cases.push(case);
        self
    }
}
