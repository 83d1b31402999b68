use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for personal data (emails, phone numbers) that keeps the value out of
/// `Debug`/`Display` output, so `tracing::info!("{:?}", person)` never leaks it.
/// Serialization is transparent: API responses and storage rows carry the real value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

const MASK: &str = "********";

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(MASK)
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Masked<T> {
    /// Borrow the real value. Call sites should make the exposure obvious.
    pub fn reveal(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_masked() {
        let email = Masked("maria@email.com".to_string());
        assert_eq!(format!("{:?}", email), MASK);
        assert_eq!(format!("{}", email), MASK);
        assert_eq!(email.reveal(), "maria@email.com");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let phone = Masked("11999998888".to_string());
        let json = serde_json::to_string(&phone).unwrap();
        assert_eq!(json, "\"11999998888\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phone);
    }
}
