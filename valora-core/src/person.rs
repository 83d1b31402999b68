use serde::{Deserialize, Serialize};
use valora_shared::Masked;

use crate::{CoreError, CoreResult};

/// A registered person. Contact fields are masked in logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Assigned by the repository on create
    pub id: Option<i64>,
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: Masked(email.into()),
            phone: Masked(phone.into()),
        }
    }

    /// Replace the email, rejecting values without `@`
    pub fn set_email(&mut self, email: impl Into<String>) -> CoreResult<()> {
        let email = email.into();
        if !email.contains('@') {
            return Err(CoreError::ValidationError(
                "Invalid email: must contain @".to_string(),
            ));
        }
        self.email = Masked(email);
        Ok(())
    }

    /// Check required fields before the record is stored
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError("Name must not be empty".to_string()));
        }
        let email = self.email.reveal();
        if email.trim().is_empty() || !email.contains('@') {
            return Err(CoreError::ValidationError("Invalid email".to_string()));
        }
        if self.phone.reveal().trim().is_empty() {
            return Err(CoreError::ValidationError("Phone must not be empty".to_string()));
        }
        Ok(())
    }

    /// One-line human readable description
    pub fn summary(&self) -> String {
        format!(
            "ID: {} | Name: {} | Email: {} | Phone: {}",
            self.id.map_or_else(|| "N/A".to_string(), |id| id.to_string()),
            self.name,
            self.email.reveal(),
            self.phone.reveal(),
        )
    }
}

/// Loose email check: has `@` and `.`, and is longer than five characters
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.') && email.len() > 5
}

/// Strip everything but ASCII digits, e.g. `(11) 9.8765-4321` -> `11987654321`
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}
