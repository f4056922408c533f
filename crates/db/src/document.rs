//! Versioned analysis documents at the storage boundary.
//!
//! Stored analyses carry a `schemaVersion`. Older shapes are upgraded here,
//! once, so nothing downstream ever has to guess which layout it holds.

use serde_json::{Map, Value};
use tracing::debug;

use regimen_core::domain::analysis::{Notice, NoticeCode, ScoredProduct, SelectionSet};
use regimen_core::Analysis;

use crate::repositories::RepositoryError;

pub const CURRENT_SCHEMA_VERSION: u64 = 2;
const SCHEMA_VERSION_FIELD: &str = "schemaVersion";

/// Serializes an analysis into the current document layout.
pub fn encode_analysis(analysis: &Analysis) -> Result<Value, RepositoryError> {
    let mut value =
        serde_json::to_value(analysis).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| RepositoryError::Decode("analysis did not serialize to an object".into()))?;
    object.insert(SCHEMA_VERSION_FIELD.to_string(), Value::from(CURRENT_SCHEMA_VERSION));
    Ok(value)
}

/// Reads a stored document of any known version. Documents written before
/// versioning was introduced have no `schemaVersion` and are treated as v1.
pub fn decode_analysis(value: Value) -> Result<Analysis, RepositoryError> {
    let Value::Object(mut object) = value else {
        return Err(RepositoryError::Decode("analysis document must be a JSON object".into()));
    };

    let version = match object.remove(SCHEMA_VERSION_FIELD) {
        None => 1,
        Some(version) => version.as_u64().ok_or_else(|| {
            RepositoryError::Decode(format!("schemaVersion must be a positive integer: {version}"))
        })?,
    };

    match version {
        1 => {
            debug!(event_name = "db.document.upgraded", from = 1, to = CURRENT_SCHEMA_VERSION);
            upgrade_v1(&mut object)?;
        }
        CURRENT_SCHEMA_VERSION => {}
        other => {
            return Err(RepositoryError::Decode(format!(
                "unsupported analysis schemaVersion {other} \
                 (newest known is {CURRENT_SCHEMA_VERSION})"
            )));
        }
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| RepositoryError::Decode(format!("analysis document: {e}")))
}

fn upgrade_v1(object: &mut Map<String, Value>) -> Result<(), RepositoryError> {
    if let Some(Value::Array(flat)) = object.remove("recommendations") {
        let scored: Vec<ScoredProduct> = serde_json::from_value(Value::Array(flat))
            .map_err(|e| RepositoryError::Decode(format!("v1 recommendations: {e}")))?;
        let mut selection = SelectionSet::new();
        for product in scored {
            let category = product.category();
            let mut bucket = selection.get(category).to_vec();
            bucket.push(product);
            selection.insert(category, bucket);
        }
        let grouped =
            serde_json::to_value(&selection).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        object.insert("recommendations".to_string(), grouped);
    }

    if let Some(Value::Object(mut nested)) = object.remove("phasedRecommendations") {
        let phases = nested.remove("phases").unwrap_or_else(|| Value::Array(Vec::new()));
        object.insert("phasedRecommendations".to_string(), phases);
    }

    if let Some(Value::Array(notices)) = object.get_mut("notices") {
        for notice in notices.iter_mut() {
            if let Value::String(message) = notice {
                let upgraded = Notice::info(NoticeCode::Legacy, message.as_str());
                *notice = serde_json::to_value(upgraded)
                    .map_err(|e| RepositoryError::Decode(e.to_string()))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use regimen_core::domain::analysis::NoticeCode;
    use regimen_core::{AnalysisEngine, Category, RawResponses};

    use super::{decode_analysis, encode_analysis, CURRENT_SCHEMA_VERSION};
    use crate::fixtures::sample_catalog;
    use crate::repositories::RepositoryError;

    fn analysis() -> regimen_core::Analysis {
        let responses: RawResponses = serde_json::from_value(json!({
            "skinType": "oily",
            "sensitivityLevel": "none",
            "primaryConcerns": ["acne"],
            "budgetTier": "mid"
        }))
        .expect("responses");
        AnalysisEngine::default()
            .generate_complete_analysis(&responses, &sample_catalog().expect("catalog"))
            .expect("analysis")
    }

    #[test]
    fn current_documents_carry_schema_version() {
        let analysis = analysis();
        let document = encode_analysis(&analysis).expect("encode");

        assert_eq!(document["schemaVersion"], CURRENT_SCHEMA_VERSION);
        assert_eq!(decode_analysis(document).expect("decode"), analysis);
    }

    #[test]
    fn v1_documents_are_upgraded() {
        let analysis = analysis();
        let mut document = encode_analysis(&analysis).expect("encode");
        let object = document.as_object_mut().expect("object");

        let flat: Vec<serde_json::Value> = analysis
            .recommendations
            .iter()
            .map(|scored| serde_json::to_value(scored).expect("scored"))
            .collect();
        let phases = object.remove("phasedRecommendations").expect("phases");
        object.insert("schemaVersion".into(), json!(1));
        object.insert("recommendations".into(), json!(flat));
        object.insert("phasedRecommendations".into(), json!({ "phases": phases }));
        object.insert("notices".into(), json!(["Patch test new products."]));

        let upgraded = decode_analysis(document).expect("decode v1");

        assert_eq!(upgraded.recommendations, analysis.recommendations);
        assert_eq!(upgraded.phased_recommendations, analysis.phased_recommendations);
        assert_eq!(upgraded.notices.len(), 1);
        assert_eq!(upgraded.notices[0].code, NoticeCode::Legacy);
        assert_eq!(upgraded.notices[0].message, "Patch test new products.");
    }

    #[test]
    fn unversioned_documents_are_read_as_v1() {
        let analysis = analysis();
        let mut document = encode_analysis(&analysis).expect("encode");
        document.as_object_mut().expect("object").remove("schemaVersion");

        let decoded = decode_analysis(document).expect("decode");
        assert_eq!(decoded, analysis);
    }

    #[test]
    fn stored_step_numbers_are_recomputed() {
        let analysis = analysis();
        let mut document = encode_analysis(&analysis).expect("encode");
        for step in document["morningRoutine"].as_array_mut().expect("steps") {
            step["stepNumber"] = json!(42);
        }

        let decoded = decode_analysis(document).expect("decode");
        let numbers: Vec<u32> =
            decoded.morning_routine.steps().iter().map(|step| step.step_number).collect();
        assert_eq!(numbers, (1..=numbers.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut document = encode_analysis(&analysis()).expect("encode");
        document["schemaVersion"] = json!(CURRENT_SCHEMA_VERSION + 1);

        let err = decode_analysis(document).expect_err("future version");
        assert!(matches!(
            err,
            RepositoryError::Decode(message) if message.contains("schemaVersion 3")
        ));
    }

    #[test]
    fn v1_recommendations_group_by_category() {
        let analysis = analysis();
        let cleanser = analysis.recommendations.get(Category::Cleanser)[0].clone();
        let mut document = encode_analysis(&analysis).expect("encode");
        document["schemaVersion"] = json!(1);
        document["recommendations"] = json!([serde_json::to_value(&cleanser).expect("scored")]);

        let decoded = decode_analysis(document).expect("decode");
        assert_eq!(decoded.recommendations.len(), 1);
        assert!(decoded.recommendations.contains(cleanser.id()));
    }
}
