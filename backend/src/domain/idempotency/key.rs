//! Client-chosen idempotency keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyKeyValidationError {
    EmptyKey,
    InvalidKey,
}

impl fmt::Display for IdempotencyKeyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "idempotency key must not be empty"),
            Self::InvalidKey => write!(f, "idempotency key must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdempotencyKeyValidationError {}

/// UUID naming one logical purchase across retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Parse a key from its textual form.
    ///
    /// # Examples
    /// ```
    /// use airline_backend::domain::idempotency::IdempotencyKey;
    ///
    /// let key = IdempotencyKey::parse("550e8400-e29b-41d4-a716-446655440000")
    ///     .expect("valid UUID");
    /// assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    /// assert!(IdempotencyKey::parse(" 550e8400-e29b-41d4-a716-446655440000").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, IdempotencyKeyValidationError> {
        if raw.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if raw.trim() != raw {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| IdempotencyKeyValidationError::InvalidKey)
    }

    /// Wrap a UUID already known to be valid, such as one read from storage.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random key.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for key parsing.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", IdempotencyKeyValidationError::EmptyKey)]
    #[case("not-a-uuid", IdempotencyKeyValidationError::InvalidKey)]
    #[case("550e8400-e29b-41d4-a716-446655440000 ", IdempotencyKeyValidationError::InvalidKey)]
    fn rejects_malformed_keys(#[case] raw: &str, #[case] expected: IdempotencyKeyValidationError) {
        assert_eq!(IdempotencyKey::parse(raw), Err(expected));
    }

    #[rstest]
    fn serde_uses_string_form() {
        let key = IdempotencyKey::random();
        let json = serde_json::to_string(&key).expect("serialise key");
        let back: IdempotencyKey = serde_json::from_str(&json).expect("deserialise key");
        assert_eq!(back, key);
    }
}
