//! Validation helpers for group and case declarations.
//!
//! These routines run before a group is built and return every problem
//! found at once rather than stopping at the first one.

use crate::error::ValidationError;
use crate::filter::GROUP_LINK_KEY;
use crate::model::{GroupDecl, Metadata};

/// Validates declarations before they become groups.
pub struct DeclarationValidator;

impl DeclarationValidator {
    /// Validate a group declaration and all of its cases.
    ///
    /// # Errors
    ///
    /// Returns a `Vec<ValidationError>` if any validation rules are violated.
    pub fn validate_group(decl: &GroupDecl) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        // Description: required unless the group describes an entity.
        let has_description = decl
            .description
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty());
        if !has_description && decl.describes.is_none() {
            errors.push(ValidationError::new(
                "description",
                "required when the group describes no entity",
            ));
        }

        validate_metadata("metadata", &decl.metadata, &mut errors);

        for (idx, case) in decl.cases.iter().enumerate() {
            let field = format!("cases[{idx}]");
            if case.description.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("{field}.description"),
                    "cannot be empty",
                ));
            }
            validate_metadata(&format!("{field}.metadata"), &case.metadata, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_metadata(field: &str, metadata: &Metadata, errors: &mut Vec<ValidationError>) {
    for key in metadata.keys() {
        if key.trim().is_empty() {
            errors.push(ValidationError::new(field, "keys cannot be empty"));
        } else if key == GROUP_LINK_KEY {
            errors.push(ValidationError::new(
                field,
                format!("'{GROUP_LINK_KEY}' is reserved for group filters"),
            ));
        }
    }
}
