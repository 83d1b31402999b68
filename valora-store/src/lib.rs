pub mod app_config;
pub mod person_repo;

pub use app_config::{Config, RunConfig};
pub use person_repo::CsvPersonRepository;
