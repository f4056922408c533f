use std::collections::HashMap;

use tokio::sync::RwLock;

use regimen_core::{Consultation, ConsultationId};

use super::{ConsultationRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryConsultationRepository {
    consultations: RwLock<HashMap<String, Consultation>>,
}

#[async_trait::async_trait]
impl ConsultationRepository for InMemoryConsultationRepository {
    async fn create(&self, consultation: Consultation) -> Result<ConsultationId, RepositoryError> {
        let mut consultations = self.consultations.write().await;
        if consultations.contains_key(&consultation.id.0) {
            return Err(RepositoryError::Conflict(consultation.id.0));
        }
        let id = consultation.id.clone();
        consultations.insert(id.0.clone(), consultation);
        Ok(id)
    }

    async fn find(&self, id: &ConsultationId) -> Result<Option<Consultation>, RepositoryError> {
        let consultations = self.consultations.read().await;
        Ok(consultations.get(&id.0).cloned())
    }

    async fn update(&self, consultation: Consultation) -> Result<(), RepositoryError> {
        let mut consultations = self.consultations.write().await;
        match consultations.get_mut(&consultation.id.0) {
            Some(stored) => {
                *stored = consultation;
                Ok(())
            }
            None => Err(RepositoryError::NotFound(consultation.id.0)),
        }
    }
}
