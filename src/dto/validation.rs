//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest nickname accepted, in characters.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// Validates that a nickname has visible characters and fits on a scoreboard.
///
/// # Examples
///
/// ```ignore
/// validate_nickname("Samir") // Ok
/// validate_nickname("   ")   // Err - blank
/// ```
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("nickname_blank");
        err.message = Some("Nickname must not be blank".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_NICKNAME_CHARS {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!("Nickname must be at most {MAX_NICKNAME_CHARS} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_valid() {
        assert!(validate_nickname("Samir").is_ok());
        assert!(validate_nickname("  Lina ").is_ok());
        assert!(validate_nickname("Aïcha").is_ok());
        assert!(validate_nickname(&"é".repeat(MAX_NICKNAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_nickname_blank() {
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
    }

    #[test]
    fn test_validate_nickname_too_long() {
        assert!(validate_nickname(&"a".repeat(MAX_NICKNAME_CHARS + 1)).is_err());
    }
}
