pub mod pii;
pub mod models;

pub use models::events::{RunCompletedEvent, RunEvent, RunFailedEvent, RunMode, RunProgressEvent};
pub use pii::Masked;
