pub mod connection;
pub mod document;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use document::{decode_analysis, encode_analysis, CURRENT_SCHEMA_VERSION};
pub use fixtures::sample_catalog;
pub use repositories::{
    ConsultationRepository, InMemoryConsultationRepository, RepositoryError,
    SqlConsultationRepository,
};
