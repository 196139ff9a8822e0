use crate::shared::errors::AppError;

const MAX_KEYWORDS_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;

pub struct Validator;

impl Validator {
    pub fn validate_keywords(keywords: &str) -> Result<(), AppError> {
        if keywords.trim().is_empty() {
            return Err(AppError::ValidationError(
                "keywords: must be a non-empty string".to_string(),
            ));
        }
        if keywords.chars().count() > MAX_KEYWORDS_LEN {
            return Err(AppError::ValidationError(format!(
                "keywords: too long (max {} characters)",
                MAX_KEYWORDS_LEN
            )));
        }
        Ok(())
    }

    pub fn validate_category(field: &str, category: Option<&str>) -> Result<(), AppError> {
        let Some(category) = category else {
            return Ok(());
        };

        if category.chars().count() > MAX_CATEGORY_LEN {
            return Err(AppError::ValidationError(format!(
                "{}: too long (max {} characters)",
                field, MAX_CATEGORY_LEN
            )));
        }
        if category.chars().any(|c| c.is_control()) {
            return Err(AppError::ValidationError(format!(
                "{}: contains control characters",
                field
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_must_not_be_blank() {
        assert!(Validator::validate_keywords("gardening").is_ok());
        assert!(Validator::validate_keywords("").is_err());
        assert!(Validator::validate_keywords("   ").is_err());
    }

    #[test]
    fn test_keywords_length_limit() {
        let long = "a".repeat(MAX_KEYWORDS_LEN + 1);
        assert!(Validator::validate_keywords(&long).is_err());
        assert!(Validator::validate_keywords(&long[1..]).is_ok());
    }

    #[test]
    fn test_category_is_optional() {
        assert!(Validator::validate_category("category", None).is_ok());
        assert!(Validator::validate_category("category", Some("books")).is_ok());
        assert!(Validator::validate_category("category", Some("bad\u{0}value")).is_err());
    }
}
