use async_trait::async_trait;
use thiserror::Error;

use regimen_core::{Consultation, ConsultationId};

pub mod consultation;
pub mod memory;

pub use consultation::SqlConsultationRepository;
pub use memory::InMemoryConsultationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("consultation `{0}` not found")]
    NotFound(String),
    #[error("consultation `{0}` already exists")]
    Conflict(String),
}

/// Stores consultations keyed by opaque id. Implementations never interpret
/// the analysis beyond decoding it.
#[async_trait]
pub trait ConsultationRepository: Send + Sync {
    async fn create(&self, consultation: Consultation) -> Result<ConsultationId, RepositoryError>;
    async fn find(&self, id: &ConsultationId) -> Result<Option<Consultation>, RepositoryError>;
    async fn update(&self, consultation: Consultation) -> Result<(), RepositoryError>;
}
