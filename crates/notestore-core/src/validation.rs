//! Title validation.

use crate::error::ValidationError;

/// Check that a title is usable as a note key.
///
/// A title is valid when it is non-empty after trimming whitespace. The
/// title itself is not modified; what the caller passed is what gets stored.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_blank_titles_rejected() {
        assert_eq!(validate_title(""), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_title("   "), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_title("\t\n"), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn test_padded_title_accepted() {
        assert!(validate_title("  Buy milk  ").is_ok());
    }

    proptest! {
        #[test]
        fn test_any_visible_char_makes_title_valid(
            pad in "[ \t]{0,4}",
            body in "[a-zA-Z0-9]{1,16}",
        ) {
            let title = format!("{pad}{body}{pad}");
            prop_assert!(validate_title(&title).is_ok());
        }

        #[test]
        fn test_whitespace_only_always_rejected(title in "[ \t\r\n]{0,12}") {
            prop_assert_eq!(validate_title(&title), Err(ValidationError::EmptyTitle));
        }
    }
}
