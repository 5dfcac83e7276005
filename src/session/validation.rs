//! Nickname validation for joining a chat session.

use thiserror::Error;

use crate::ChatError;

/// Minimum nickname length, in characters.
pub const MIN_NICKNAME_LENGTH: usize = 2;

/// Maximum nickname length, in characters.
pub const MAX_NICKNAME_LENGTH: usize = 20;

/// Nickname validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NicknameError {
    /// Nickname is empty.
    #[error("please enter a nickname")]
    Empty,

    /// Nickname is too short.
    #[error("nickname must be 2-20 characters")]
    TooShort,

    /// Nickname is too long.
    #[error("nickname must be 2-20 characters")]
    TooLong,
}

impl From<NicknameError> for ChatError {
    fn from(e: NicknameError) -> Self {
        ChatError::Validation(e.to_string())
    }
}

/// Validate a nickname.
///
/// Length is counted in characters, not bytes. Callers trim the input
/// first.
///
/// # Examples
///
/// ```
/// use mqteam::session::validate_nickname;
///
/// assert!(validate_nickname("alice").is_ok());
/// assert!(validate_nickname("a").is_err()); // too short
/// assert!(validate_nickname("").is_err()); // empty
/// ```
pub fn validate_nickname(nickname: &str) -> Result<(), NicknameError> {
    if nickname.is_empty() {
        return Err(NicknameError::Empty);
    }

    let length = nickname.chars().count();
    if length < MIN_NICKNAME_LENGTH {
        return Err(NicknameError::TooShort);
    }
    if length > MAX_NICKNAME_LENGTH {
        return Err(NicknameError::TooLong);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_valid() {
        assert!(validate_nickname("bob").is_ok());
        assert!(validate_nickname("Alice Smith").is_ok());
    }

    #[test]
    fn test_validate_nickname_empty() {
        assert_eq!(validate_nickname(""), Err(NicknameError::Empty));
    }

    #[test]
    fn test_validate_nickname_exact_lengths() {
        assert!(validate_nickname("ab").is_ok());
        assert!(validate_nickname(&"a".repeat(20)).is_ok());
        assert_eq!(validate_nickname("a"), Err(NicknameError::TooShort));
        assert_eq!(validate_nickname(&"a".repeat(21)), Err(NicknameError::TooLong));
    }

    #[test]
    fn test_validate_nickname_counts_characters() {
        // Two characters, six bytes
        assert!(validate_nickname("민수").is_ok());
        assert!(validate_nickname(&"가".repeat(20)).is_ok());
        assert!(validate_nickname(&"가".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_nickname_emoji_count_once() {
        // Non-BMP characters count as one each
        assert_eq!(validate_nickname("😀"), Err(NicknameError::TooShort));
        assert!(validate_nickname(&"😀".repeat(20)).is_ok());
        assert_eq!(validate_nickname(&"😀".repeat(21)), Err(NicknameError::TooLong));
    }

    #[test]
    fn test_nickname_error_converts_to_validation() {
        let err: ChatError = NicknameError::TooLong.into();
        assert!(matches!(err, ChatError::Validation(ref m) if m.contains("2-20")));
    }
}
