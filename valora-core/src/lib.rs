pub mod tariff;
pub mod person;
pub mod repository;

pub use person::{is_valid_email, normalize_phone, Person};
pub use repository::PersonRepository;
pub use tariff::{RegionCode, StateTariffTable, TariffEntry};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
