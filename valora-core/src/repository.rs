use async_trait::async_trait;

use crate::person::Person;
use crate::CoreResult;

/// Repository trait for person records
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Validate, assign the next id and store. Returns the stored record.
    async fn create(&self, person: Person) -> CoreResult<Person>;

    async fn find_by_id(&self, id: i64) -> CoreResult<Option<Person>>;

    /// Case-insensitive match on the start of the name
    async fn find_by_name_prefix(&self, prefix: &str) -> CoreResult<Vec<Person>>;

    /// Replace the stored record with the same id. Fails with `NotFound` if absent.
    async fn update(&self, person: &Person) -> CoreResult<()>;

    async fn delete(&self, id: i64) -> CoreResult<()>;

    async fn count(&self) -> CoreResult<usize>;

    async fn list_all(&self) -> CoreResult<Vec<Person>>;

    async fn clear_all(&self) -> CoreResult<()>;
}
