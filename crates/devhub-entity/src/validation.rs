//! Field validation shared by the input structs.
//!
//! The same rules are enforced by `CHECK` constraints in the schema; running
//! them here first turns violations into `BadRequest` instead of store errors.

use devhub_core::{AppError, AppResult};
use validator::{Validate, ValidationError};

/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 100;

/// Repository names: lowercase letters, digits and underscore.
pub fn repository_name(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("repository_name")
            .with_message("Name may only contain lowercase letters, digits and '_'".into()))
    }
}

/// Usernames: same alphabet as repository names plus '.' and '-'.
pub fn slug(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-')
        })
    {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(
            "Username may only contain lowercase letters, digits, '_', '.' and '-'".into(),
        ))
    }
}

/// URLs must start with "http".
pub fn http_url(value: &str) -> Result<(), ValidationError> {
    if value.starts_with("http") {
        Ok(())
    } else {
        Err(ValidationError::new("http_url").with_message("URL must start with http".into()))
    }
}

/// Every tag is non-empty and at most [`MAX_TAG_LEN`] characters.
pub fn tags(value: &[String]) -> Result<(), ValidationError> {
    if value
        .iter()
        .all(|t| !t.is_empty() && t.chars().count() <= MAX_TAG_LEN)
    {
        Ok(())
    } else {
        Err(ValidationError::new("tags")
            .with_message(format!("Tags must be 1-{MAX_TAG_LEN} characters").into()))
    }
}

/// Run `validator` rules and map failures to `BadRequest`.
pub trait ValidateExt {
    /// Validate and convert the outcome into an [`AppResult`].
    fn validate_input(&self) -> AppResult<()>;
}

impl<T: Validate> ValidateExt for T {
    fn validate_input(&self) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::bad_request(format!("Validation failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Access, LinkKind, NewLink, NewRepository};

    #[test]
    fn test_repository_name_rules() {
        assert!(repository_name("my_repo_2").is_ok());
        assert!(repository_name("MyRepo").is_err());
        assert!(repository_name("with space").is_err());
        assert!(repository_name("").is_err());
    }

    #[test]
    fn test_new_repository_validation() {
        let ok = NewRepository {
            name: "demo".into(),
            description: "A demo".into(),
            access: Access::Public,
        };
        assert!(ok.validate_input().is_ok());

        let bad = NewRepository {
            name: "Demo!".into(),
            description: "x".repeat(301),
            access: Access::Public,
        };
        let err = bad.validate_input().unwrap_err();
        assert_eq!(err.kind, devhub_core::error::ErrorKind::BadRequest);
    }

    #[test]
    fn test_link_validation() {
        let ok = NewLink {
            kind: LinkKind::Github,
            title: "source".into(),
            url: "https://github.com/x/y".into(),
        };
        assert!(ok.validate_input().is_ok());

        let bad_url = NewLink {
            url: "ftp://example.com".into(),
            ..ok.clone()
        };
        assert!(bad_url.validate_input().is_err());

        let long_title = NewLink {
            title: "t".repeat(31),
            ..ok
        };
        assert!(long_title.validate_input().is_err());
    }

    #[test]
    fn test_tags_rule() {
        assert!(tags(&["rust".into(), "web".into()]).is_ok());
        assert!(tags(&["x".repeat(101)]).is_err());
        assert!(tags(&[String::new()]).is_err());
    }
}
