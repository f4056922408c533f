pub mod catalog;
pub mod config;
pub mod coverage;
pub mod domain;
pub mod engine;
pub mod errors;

pub use catalog::{parse_catalog, validate_catalog, CatalogIssue, CatalogSnapshot, IssueCode};
pub use config::{AppConfig, EngineConfig};
pub use coverage::{analyze_coverage, CoverageReport};
pub use domain::analysis::{
    Analysis, Notice, NoticeCode, NoticeSeverity, Phase, PhasePlan, RoutinePlan, RoutineStep,
    ScoredProduct, SelectionSet,
};
pub use domain::concern::{Concern, ConcernTag};
pub use domain::consultation::{Consultation, ConsultationId, SavedRoutine};
pub use domain::product::{Category, Frequency, Product, ProductId, Usage};
pub use domain::profile::{AcneSeverity, BudgetTier, SensitivityLevel, SkinProfile, SkinType};
pub use engine::{analysis_digest, generate_complete_analysis, AnalysisEngine, RawResponses};
pub use errors::{ApplicationError, DomainError, InterfaceError, ValidationError};
