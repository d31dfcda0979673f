//! Regular-expression expectations.

use crate::error::{Result, SelectError};
use regex::{Regex, RegexBuilder};
use std::fmt;

/// A compiled regular expression used as a filter expectation.
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::InvalidPattern` if the expression does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| SelectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            source: format!("/{pattern}/"),
        })
    }

    /// Parse a `/body/flags` literal.
    ///
    /// Returns `Ok(None)` when `text` is not a pattern literal. Recognised
    /// flags are `i` (case-insensitive), `m` (multi-line), `s` (dot matches
    /// newline) and `x` (ignore whitespace); any other trailing character
    /// means the text is not a literal.
    ///
    /// # Errors
    ///
    /// Returns `SelectError::InvalidPattern` if the body does not compile.
    pub fn parse_literal(text: &str) -> Result<Option<Self>> {
        let Some(rest) = text.strip_prefix('/') else {
            return Ok(None);
        };
        let Some(end) = rest.rfind('/') else {
            return Ok(None);
        };
        let (body, flags) = (&rest[..end], &rest[end + 1..]);
        if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x')) {
            return Ok(None);
        }

        let regex = RegexBuilder::new(body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build()
            .map_err(|source| SelectError::InvalidPattern {
                pattern: text.to_string(),
                source,
            })?;
        Ok(Some(Self {
            regex,
            source: text.to_string(),
        }))
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// The pattern as written, in `/body/flags` form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        let source = format!("/{}/", regex.as_str());
        Self { regex, source }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
