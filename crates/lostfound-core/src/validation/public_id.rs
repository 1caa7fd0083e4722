use regex::Regex;
use std::sync::LazyLock;

use crate::error::AppError;

pub const MAX_PUBLIC_ID_LENGTH: usize = 64;

static PUBLIC_ID_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$"));

/// Public ids appear in URLs, so they are restricted to a URL-safe alphabet.
pub fn validate_public_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.len() > MAX_PUBLIC_ID_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Item id must be between 1 and {} characters",
            MAX_PUBLIC_ID_LENGTH
        )));
    }

    let pattern = PUBLIC_ID_PATTERN
        .as_ref()
        .map_err(|e| AppError::Internal(format!("Invalid id pattern: {}", e)))?;

    if !pattern.is_match(id) {
        return Err(AppError::InvalidInput(format!(
            "Item id '{}' contains invalid characters. Allowed: letters, digits, underscore (_), hyphen (-)",
            id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_typical_ids() {
        assert!(validate_public_id("ITEM-X").is_ok());
        assert!(validate_public_id("ITEM-3FA85F64").is_ok());
        assert!(validate_public_id("1717171717_wallet").is_ok());
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        assert!(validate_public_id("").is_err());
        assert!(validate_public_id("-leading").is_err());
        assert!(validate_public_id("a/b").is_err());
        assert!(validate_public_id("has space").is_err());
        assert!(validate_public_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_shared_pattern_compiles() {
        assert!(PUBLIC_ID_PATTERN.is_ok());
        assert!(validate_public_id("ITEM-1").is_ok());
    }
}
