//! Filter configuration for `example_filter`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. Programmatic overrides
//! 2. Environment variables (`EXAMPLE_FILTER_INCLUDE`, `EXAMPLE_FILTER_EXCLUDE`)
//! 3. Project config (`<dir>/.example_filter.yaml`)
//! 4. User config (`~/.config/example_filter/filters.yaml`)
//! 5. Defaults (no filters)
//!
//! Layers merge per key: a key set in a higher layer replaces the same key
//! from a lower one, other keys are kept.
//!
//! Loaded configuration can only express plain values, patterns and the
//! group-link criteria. Predicates have to be added in code.

use crate::error::{Result, SelectError};
use crate::filter::{Expected, FilterCriteria, GROUP_LINK_KEY, GroupCriteria, Pattern};
use crate::model::{EntityRef, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Project config filename.
const PROJECT_CONFIG_FILENAME: &str = ".example_filter.yaml";
/// Environment variable holding inclusion criteria.
pub const INCLUDE_ENV: &str = "EXAMPLE_FILTER_INCLUDE";
/// Environment variable holding exclusion criteria.
pub const EXCLUDE_ENV: &str = "EXAMPLE_FILTER_EXCLUDE";

/// Inclusion and exclusion criteria from one configuration source.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub include: FilterCriteria,
    pub exclude: FilterCriteria,
}

impl FilterConfig {
    #[must_use]
    pub fn new(include: FilterCriteria, exclude: FilterCriteria) -> Self {
        Self { include, exclude }
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        self.include.merge_from(&other.include);
        self.exclude.merge_from(&other.exclude);
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let layer = Self::from_yaml_str(&contents).map_err(|err| match err {
            SelectError::Yaml(source) => SelectError::ConfigFile {
                path: path.to_path_buf(),
                reason: source.to_string(),
            },
            other => other,
        })?;
        debug!(
            path = %path.display(),
            include = layer.include.len(),
            exclude = layer.exclude.len(),
            "Loaded filter config"
        );
        Ok(layer)
    }

    /// Build a layer from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or holds unsupported values.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mapping = match value {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => {
                return Err(SelectError::Config(
                    "filter config must be a mapping with 'include' and/or 'exclude'".to_string(),
                ));
            }
        };

        let mut layer = Self::default();
        for (key, value) in &mapping {
            match key.as_str() {
                Some("include") => layer.include = criteria_from_yaml(value)?,
                Some("exclude") => layer.exclude = criteria_from_yaml(value)?,
                Some(other) => warn!(key = other, "Ignoring unknown filter config key"),
                None => warn!("Ignoring non-string filter config key"),
            }
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an unparseable entry.
    pub fn from_env() -> Result<Self> {
        Self::from_env_values(
            env::var(INCLUDE_ENV).ok().as_deref(),
            env::var(EXCLUDE_ENV).ok().as_deref(),
        )
    }

    /// Build a layer from raw `key=value,key=value` strings.
    ///
    /// `example_group.describes` and `example_group.description` address the
    /// group-link criteria. Values may not contain commas.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is not `key=value` or its pattern is invalid.
    pub fn from_env_values(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map_or_else(|| Ok(FilterCriteria::new()), criteria_from_env)?,
            exclude: exclude.map_or_else(|| Ok(FilterCriteria::new()), criteria_from_env)?,
        })
    }
}

/// Path of the project config inside `dir`.
#[must_use]
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_CONFIG_FILENAME)
}

/// Load project config (`<dir>/.example_filter.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(dir: &Path) -> Result<FilterConfig> {
    FilterConfig::from_yaml(&project_config_path(dir))
}

/// Load user config (`~/.config/example_filter/filters.yaml`).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<FilterConfig> {
    let Ok(home) = env::var("HOME") else {
        return Ok(FilterConfig::default());
    };
    let path = Path::new(&home)
        .join(".config")
        .join("example_filter")
        .join("filters.yaml");
    FilterConfig::from_yaml(&path)
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if any config file or environment value is invalid.
pub fn load_config(project_dir: &Path, overrides: &FilterConfig) -> Result<FilterConfig> {
    let user = load_user_config()?;
    let project = load_project_config(project_dir)?;
    let env_layer = FilterConfig::from_env()?;

    Ok(FilterConfig::merge_layers(&[
        user,
        project,
        env_layer,
        overrides.clone(),
    ]))
}

fn criteria_from_yaml(value: &serde_yaml::Value) -> Result<FilterCriteria> {
    let mapping = match value {
        serde_yaml::Value::Null => return Ok(FilterCriteria::new()),
        serde_yaml::Value::Mapping(mapping) => mapping,
        _ => {
            return Err(SelectError::Config(
                "filter criteria must be a mapping of key to value".to_string(),
            ));
        }
    };

    let mut criteria = FilterCriteria::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str() else {
            return Err(SelectError::Config(
                "filter criteria keys must be strings".to_string(),
            ));
        };
        criteria.insert(key, expected_from_yaml(key, value)?);
    }
    Ok(criteria)
}

fn expected_from_yaml(key: &str, value: &serde_yaml::Value) -> Result<Expected> {
    if key == GROUP_LINK_KEY {
        return group_criteria_from_yaml(value).map(Expected::Group);
    }
    match value {
        serde_yaml::Value::String(text) => parse_text(text),
        serde_yaml::Value::Tagged(tagged) => expected_from_yaml(key, &tagged.value),
        other => value_from_yaml(key, other).map(Expected::Value),
    }
}

fn group_criteria_from_yaml(value: &serde_yaml::Value) -> Result<GroupCriteria> {
    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err(SelectError::unsupported(
            GROUP_LINK_KEY,
            "expected a mapping with 'describes' and/or 'description'",
        ));
    };

    let mut criteria = GroupCriteria::new();
    for (sub_key, sub_value) in mapping {
        let Some(text) = sub_value.as_str() else {
            return Err(SelectError::unsupported(
                GROUP_LINK_KEY,
                "group criteria values must be strings or patterns",
            ));
        };
        match sub_key.as_str() {
            Some("describes") => criteria = criteria.with_describes(parse_describes(text)?),
            Some("description") => criteria = criteria.with_description(parse_text(text)?),
            _ => {
                return Err(SelectError::unsupported(
                    GROUP_LINK_KEY,
                    format!("unknown field {sub_key:?}"),
                ));
            }
        }
    }
    Ok(criteria)
}

fn value_from_yaml(key: &str, value: &serde_yaml::Value) -> Result<Value> {
    match value {
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| SelectError::unsupported(key, format!("non-integer number {n}"))),
        serde_yaml::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| value_from_yaml(key, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        serde_yaml::Value::Tagged(tagged) => value_from_yaml(key, &tagged.value),
        serde_yaml::Value::Null => Err(SelectError::unsupported(key, "null")),
        serde_yaml::Value::Mapping(_) => Err(SelectError::unsupported(key, "nested mapping")),
    }
}

fn criteria_from_env(raw: &str) -> Result<FilterCriteria> {
    let mut criteria = FilterCriteria::new();
    let mut group = GroupCriteria::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(SelectError::Config(format!(
                "expected key=value, got '{entry}'"
            )));
        };
        let (key, value) = (key.trim(), value.trim());

        let Some(rest) = key.strip_prefix(GROUP_LINK_KEY) else {
            criteria.insert(key, parse_scalar(value)?);
            continue;
        };
        match rest {
            ".describes" => group = group.with_describes(parse_describes(value)?),
            ".description" => group = group.with_description(parse_text(value)?),
            "" => {
                return Err(SelectError::unsupported(
                    GROUP_LINK_KEY,
                    "expected example_group.describes or example_group.description",
                ));
            }
            other => {
                return Err(SelectError::unsupported(
                    GROUP_LINK_KEY,
                    format!("unknown field '{}'", other.trim_start_matches('.')),
                ));
            }
        }
    }

    if !group.is_empty() {
        criteria.insert(GROUP_LINK_KEY, group);
    }
    Ok(criteria)
}

/// Strings are patterns when written as `/.../flags`, plain text otherwise.
fn parse_text(text: &str) -> Result<Expected> {
    Ok(match Pattern::parse_literal(text)? {
        Some(pattern) => Expected::Pattern(pattern),
        None => Expected::Value(Value::Str(text.to_string())),
    })
}

/// A `describes` string names an entity unless it is a pattern.
fn parse_describes(text: &str) -> Result<Expected> {
    Ok(match Pattern::parse_literal(text)? {
        Some(pattern) => Expected::Pattern(pattern),
        None => Expected::Value(Value::Entity(EntityRef::named(text))),
    })
}

/// Environment values: booleans, integers, patterns, otherwise strings.
fn parse_scalar(text: &str) -> Result<Expected> {
    match text {
        "true" => return Ok(Expected::Value(Value::Bool(true))),
        "false" => return Ok(Expected::Value(Value::Bool(false))),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Expected::Value(Value::Int(n)));
    }
    parse_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    fn expect_value<'a>(criteria: &'a FilterCriteria, key: &str) -> &'a Value {
        match criteria.get(key) {
            Some(Expected::Value(value)) => value,
            other => panic!("expected value for {key}, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().expect("tempdir");
        let config = load_project_config(temp.path()).expect("config");
        assert!(config.is_empty());
    }

    #[test]
    fn yaml_values_are_typed() {
        let yaml = r"
include:
  color: red
  foo: 1
  pending: true
  array: [1, 2, 3, 4]
exclude:
  name: /exclude/i
";
        let config = FilterConfig::from_yaml_str(yaml).expect("config");
        assert_eq!(expect_value(&config.include, "color"), &Value::from("red"));
        assert_eq!(expect_value(&config.include, "foo"), &Value::from(1));
        assert_eq!(expect_value(&config.include, "pending"), &Value::from(true));
        assert_eq!(
            expect_value(&config.include, "array"),
            &Value::from([1, 2, 3, 4])
        );
        assert!(matches!(
            config.exclude.get("name"),
            Some(Expected::Pattern(p)) if p.is_match("EXCLUDE me")
        ));
        assert_eq!(
            config.include.keys().collect::<Vec<_>>(),
            vec!["color", "foo", "pending", "array"]
        );
    }

    #[test]
    fn yaml_group_link() {
        let yaml = r"
include:
  example_group:
    describes: Bar
    description: /find group/
";
        let config = FilterConfig::from_yaml_str(yaml).expect("config");
        let Some(Expected::Group(group)) = config.include.get(GROUP_LINK_KEY) else {
            panic!("expected group criteria");
        };
        assert!(matches!(
            group.describes.as_deref(),
            Some(Expected::Value(Value::Entity(entity))) if entity.name() == "Bar"
        ));
        assert!(matches!(group.description.as_deref(), Some(Expected::Pattern(_))));
    }

    #[test]
    fn yaml_rejects_unsupported_values() {
        let err = FilterConfig::from_yaml_str("include:\n  color: ~\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFilterValue);

        let err = FilterConfig::from_yaml_str("include:\n  ratio: 0.5\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFilterValue);

        let err =
            FilterConfig::from_yaml_str("include:\n  example_group:\n    owner: me\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFilterValue);

        let err = FilterConfig::from_yaml_str("- include\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
    }

    #[test]
    fn empty_yaml_is_empty_config() {
        assert!(FilterConfig::from_yaml_str("").expect("config").is_empty());
        let config = FilterConfig::from_yaml_str("include:\nexclude:\n").expect("config");
        assert!(config.is_empty());
    }

    #[test]
    fn malformed_file_reports_path() {
        let temp = TempDir::new().expect("tempdir");
        let path = project_config_path(temp.path());
        fs::write(&path, "include: [unclosed").expect("write config");
        let err = load_project_config(temp.path()).unwrap_err();
        assert!(matches!(err, SelectError::ConfigFile { path: ref p, .. } if *p == path));
    }

    #[test]
    fn env_values_parse() {
        let config = FilterConfig::from_env_values(
            Some("color=red, foo=1 ,fast=false,example_group.describes=Bar"),
            Some("name=/exclude/"),
        )
        .expect("config");
        assert_eq!(expect_value(&config.include, "color"), &Value::from("red"));
        assert_eq!(expect_value(&config.include, "foo"), &Value::from(1));
        assert_eq!(expect_value(&config.include, "fast"), &Value::from(false));
        assert!(matches!(
            config.include.get(GROUP_LINK_KEY),
            Some(Expected::Group(group)) if group.describes.is_some() && group.description.is_none()
        ));
        assert!(matches!(config.exclude.get("name"), Some(Expected::Pattern(_))));
    }

    #[test]
    fn env_rejects_bad_entries() {
        let err = FilterConfig::from_env_values(Some("color"), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConfigError);
        let err = FilterConfig::from_env_values(None, Some("name=/(/")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPattern);
        let err = FilterConfig::from_env_values(Some("example_group.owner=me"), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFilterValue);
    }

    #[test]
    fn env_group_link_key_needs_a_field() {
        let err = FilterConfig::from_env_values(None, Some("example_group=Bar")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFilterValue);
        let err =
            FilterConfig::from_env_values(None, Some("example_groupx.describes=Bar")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnsupportedFilterValue);

        let yaml_err = FilterConfig::from_yaml_str("exclude:\n  example_group: Bar\n").unwrap_err();
        assert_eq!(yaml_err.code(), err.code());

        let config =
            FilterConfig::from_env_values(None, Some("example_group.describes=Bar")).expect("env");
        assert_eq!(config.exclude.keys().collect::<Vec<_>>(), vec![GROUP_LINK_KEY]);
    }

    #[test]
    fn layers_merge_per_key() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(
            project_config_path(temp.path()),
            "include:\n  color: blue\n  slow: true\nexclude:\n  flaky: true\n",
        )
        .expect("write config");

        let project = load_project_config(temp.path()).expect("project");
        let env_layer = FilterConfig::from_env_values(Some("color=red"), None).expect("env");
        let overrides = FilterConfig::new(
            FilterCriteria::new(),
            FilterCriteria::new().with("flaky", false),
        );

        let merged = FilterConfig::merge_layers(&[project, env_layer, overrides]);
        assert_eq!(expect_value(&merged.include, "color"), &Value::from("red"));
        assert_eq!(expect_value(&merged.include, "slow"), &Value::from(true));
        assert_eq!(expect_value(&merged.exclude, "flaky"), &Value::from(false));
    }
}
