use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::info;

use regimen_core::{Consultation, ConsultationId, SavedRoutine};

use super::{ConsultationRepository, RepositoryError};
use crate::document::{decode_analysis, encode_analysis, CURRENT_SCHEMA_VERSION};
use crate::DbPool;

pub struct SqlConsultationRepository {
    pool: DbPool,
}

impl SqlConsultationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field}: {e}")))
}

fn parse_json(field: &str, raw: &str) -> Result<serde_json::Value, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(format!("{field}: {e}")))
}

fn to_json(value: &impl serde::Serialize) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_consultation(row: &sqlx::sqlite::SqliteRow) -> Result<Consultation, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let responses_json: String =
        row.try_get("responses_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let analysis_json: String =
        row.try_get("analysis_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let analysis_digest: String =
        row.try_get("analysis_digest").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let saved_routine_json: Option<String> =
        row.try_get("saved_routine_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let saved_routine = saved_routine_json
        .map(|raw| {
            serde_json::from_str::<SavedRoutine>(&raw)
                .map_err(|e| RepositoryError::Decode(format!("saved_routine_json: {e}")))
        })
        .transpose()?;

    Ok(Consultation {
        id: ConsultationId(id),
        responses: parse_json("responses_json", &responses_json)?,
        analysis: decode_analysis(parse_json("analysis_json", &analysis_json)?)?,
        analysis_digest,
        saved_routine,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

#[async_trait::async_trait]
impl ConsultationRepository for SqlConsultationRepository {
    async fn create(&self, consultation: Consultation) -> Result<ConsultationId, RepositoryError> {
        let analysis_json = to_json(&encode_analysis(&consultation.analysis)?)?;
        let saved_routine_json = consultation.saved_routine.as_ref().map(to_json).transpose()?;

        let result = sqlx::query(
            "INSERT INTO consultation (id, responses_json, analysis_json, schema_version,
                                       analysis_digest, saved_routine_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&consultation.id.0)
        .bind(to_json(&consultation.responses)?)
        .bind(&analysis_json)
        .bind(CURRENT_SCHEMA_VERSION as i64)
        .bind(&consultation.analysis_digest)
        .bind(&saved_routine_json)
        .bind(consultation.created_at.to_rfc3339())
        .bind(consultation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(
                    event_name = "db.consultation.created",
                    consultation_id = %consultation.id,
                    digest = %consultation.analysis_digest,
                    "consultation stored"
                );
                Ok(consultation.id)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RepositoryError::Conflict(consultation.id.0))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find(&self, id: &ConsultationId) -> Result<Option<Consultation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, responses_json, analysis_json, analysis_digest, saved_routine_json,
                    created_at, updated_at
             FROM consultation WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_consultation(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, consultation: Consultation) -> Result<(), RepositoryError> {
        let analysis_json = to_json(&encode_analysis(&consultation.analysis)?)?;
        let saved_routine_json = consultation.saved_routine.as_ref().map(to_json).transpose()?;

        let result = sqlx::query(
            "UPDATE consultation
             SET responses_json = ?, analysis_json = ?, schema_version = ?, analysis_digest = ?,
                 saved_routine_json = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(to_json(&consultation.responses)?)
        .bind(&analysis_json)
        .bind(CURRENT_SCHEMA_VERSION as i64)
        .bind(&consultation.analysis_digest)
        .bind(&saved_routine_json)
        .bind(consultation.updated_at.to_rfc3339())
        .bind(&consultation.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(consultation.id.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use regimen_core::{analysis_digest, AnalysisEngine, Consultation, ConsultationId, RawResponses};

    use super::SqlConsultationRepository;
    use crate::document::encode_analysis;
    use crate::fixtures::sample_catalog;
    use crate::repositories::{ConsultationRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_consultation(id: &str) -> Consultation {
        let responses = json!({
            "skinType": "combination",
            "sensitivityLevel": "mild",
            "primaryConcerns": ["oiliness", "pigmentation"],
            "budgetTier": "mid"
        });
        let raw: RawResponses = serde_json::from_value(responses.clone()).expect("responses");
        let analysis = AnalysisEngine::default()
            .generate_complete_analysis(&raw, &sample_catalog().expect("catalog"))
            .expect("analysis");
        let digest = analysis_digest(&analysis).expect("digest");
        Consultation::new(ConsultationId(id.to_string()), responses, analysis, digest, Utc::now())
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = SqlConsultationRepository::new(setup().await);
        let consultation = sample_consultation("CONS-001");

        let id = repo.create(consultation.clone()).await.expect("create");
        let found = repo.find(&id).await.expect("find").expect("should exist");

        assert_eq!(found, consultation);
        assert_eq!(analysis_digest(&found.analysis).expect("digest"), found.analysis_digest);
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let repo = SqlConsultationRepository::new(setup().await);
        let found = repo.find(&ConsultationId("CONS-404".to_string())).await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_a_conflict() {
        let repo = SqlConsultationRepository::new(setup().await);
        repo.create(sample_consultation("CONS-001")).await.expect("create");

        let err = repo.create(sample_consultation("CONS-001")).await.expect_err("duplicate");
        assert!(matches!(err, RepositoryError::Conflict(id) if id == "CONS-001"));
    }

    #[tokio::test]
    async fn update_persists_saved_routine() {
        let repo = SqlConsultationRepository::new(setup().await);
        let mut consultation = sample_consultation("CONS-001");
        repo.create(consultation.clone()).await.expect("create");

        consultation.save_routine(Utc::now());
        repo.update(consultation.clone()).await.expect("update");

        let found = repo.find(&consultation.id).await.expect("find").expect("should exist");
        assert_eq!(found.saved_routine, consultation.saved_routine);
        assert_eq!(found.updated_at, consultation.updated_at);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let repo = SqlConsultationRepository::new(setup().await);
        let err = repo.update(sample_consultation("CONS-404")).await.expect_err("missing");
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn legacy_rows_are_migrated_on_read() {
        let pool = setup().await;
        let consultation = sample_consultation("CONS-LEGACY");
        let mut document = encode_analysis(&consultation.analysis).expect("encode");
        document["schemaVersion"] = json!(1);
        document["notices"] = json!(["Introduce one product at a time."]);
        let phases = document["phasedRecommendations"].take();
        document["phasedRecommendations"] = json!({ "phases": phases });

        sqlx::query(
            "INSERT INTO consultation (id, responses_json, analysis_json, schema_version,
                                       analysis_digest, saved_routine_json, created_at, updated_at)
             VALUES (?, ?, ?, 1, ?, NULL, ?, ?)",
        )
        .bind("CONS-LEGACY")
        .bind(consultation.responses.to_string())
        .bind(document.to_string())
        .bind(&consultation.analysis_digest)
        .bind(consultation.created_at.to_rfc3339())
        .bind(consultation.updated_at.to_rfc3339())
        .execute(&pool)
        .await
        .expect("insert legacy row");

        let repo = SqlConsultationRepository::new(pool);
        let found = repo.find(&consultation.id).await.expect("find").expect("should exist");

        assert_eq!(
            found.analysis.phased_recommendations,
            consultation.analysis.phased_recommendations
        );
        assert_eq!(found.analysis.notices.len(), 1);
        assert_eq!(found.analysis.notices[0].message, "Introduce one product at a time.");
    }

    #[tokio::test]
    async fn unknown_schema_versions_fail_to_decode() {
        let pool = setup().await;
        let consultation = sample_consultation("CONS-FUTURE");
        let mut document = encode_analysis(&consultation.analysis).expect("encode");
        document["schemaVersion"] = json!(9);

        sqlx::query(
            "INSERT INTO consultation (id, responses_json, analysis_json, schema_version,
                                       analysis_digest, saved_routine_json, created_at, updated_at)
             VALUES (?, '{}', ?, 9, ?, NULL, ?, ?)",
        )
        .bind("CONS-FUTURE")
        .bind(document.to_string())
        .bind(&consultation.analysis_digest)
        .bind(consultation.created_at.to_rfc3339())
        .bind(consultation.updated_at.to_rfc3339())
        .execute(&pool)
        .await
        .expect("insert future row");

        let repo = SqlConsultationRepository::new(pool);
        let err = repo.find(&consultation.id).await.expect_err("future version");
        assert!(matches!(err, RepositoryError::Decode(_)));
    }
}
