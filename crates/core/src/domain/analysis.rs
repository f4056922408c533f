use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::concern::Concern;
use crate::domain::product::{Category, Frequency, Product, ProductId};
use crate::domain::profile::SkinProfile;

/// A catalog product with its match score against one profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: Product,
    pub match_score: f64,
    #[serde(default)]
    pub matched_reasons: Vec<String>,
}

impl ScoredProduct {
    pub fn id(&self) -> &ProductId {
        &self.product.product_id
    }

    pub fn category(&self) -> Category {
        self.product.category
    }

    /// Ranking order: score descending, then rating descending, then product
    /// id ascending.
    pub fn rank_order(&self, other: &Self) -> Ordering {
        other
            .match_score
            .total_cmp(&self.match_score)
            .then_with(|| other.product.rating.total_cmp(&self.product.rating))
            .then_with(|| self.product.product_id.cmp(&other.product.product_id))
    }
}

/// Selected products keyed by category, each list in ranking order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeMap<Category, Vec<ScoredProduct>>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, mut products: Vec<ScoredProduct>) {
        if products.is_empty() {
            self.0.remove(&category);
            return;
        }
        products.sort_by(ScoredProduct::rank_order);
        self.0.insert(category, products);
    }

    pub fn get(&self, category: Category) -> &[ScoredProduct] {
        self.0.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    /// Every selected product in category order, then ranking order.
    pub fn iter(&self) -> impl Iterator<Item = &ScoredProduct> {
        self.0.values().flatten()
    }

    pub fn product_ids(&self) -> BTreeSet<ProductId> {
        self.iter().map(|scored| scored.id().clone()).collect()
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.iter().any(|scored| scored.id() == product_id)
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&ScoredProduct> {
        self.iter().find(|scored| scored.id() == product_id)
    }

    /// Swaps `outgoing` for `incoming` within the same category, keeping the
    /// category list in ranking order. Returns false when `outgoing` is not
    /// selected.
    pub fn replace(&mut self, outgoing: &ProductId, incoming: ScoredProduct) -> bool {
        let Some(products) = self.0.get_mut(&incoming.category()) else {
            return false;
        };
        let Some(position) = products.iter().position(|scored| scored.id() == outgoing) else {
            return false;
        };
        products[position] = incoming;
        products.sort_by(ScoredProduct::rank_order);
        true
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<Category, Vec<ScoredProduct>> {
        &self.0
    }
}

impl From<BTreeMap<Category, Vec<ScoredProduct>>> for SelectionSet {
    fn from(map: BTreeMap<Category, Vec<ScoredProduct>>) -> Self {
        let mut selection = Self::new();
        for (category, products) in map {
            selection.insert(category, products);
        }
        selection
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeCode {
    EmptyCategory,
    BudgetWidened,
    ConflictSubstituted,
    IngredientConflict,
    SensitivityFallback,
    /// Free-text notices carried over from older stored documents.
    Legacy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub code: NoticeCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product_ids: Vec<ProductId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
}

impl Notice {
    pub fn info(code: NoticeCode, message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            code,
            message: message.into(),
            product_ids: Vec::new(),
            ingredients: Vec::new(),
        }
    }

    pub fn warning(code: NoticeCode, message: impl Into<String>) -> Self {
        Self { severity: NoticeSeverity::Warning, ..Self::info(code, message) }
    }

    pub fn with_products(mut self, product_ids: impl IntoIterator<Item = ProductId>) -> Self {
        self.product_ids = product_ids.into_iter().collect();
        self
    }

    pub fn with_ingredients(mut self, ingredients: impl IntoIterator<Item = String>) -> Self {
        self.ingredients = ingredients.into_iter().collect();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineTime {
    Morning,
    Evening,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineStep {
    #[serde(default)]
    pub step_number: u32,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub brand: String,
    pub category: Category,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub important: bool,
}

/// Ordered routine steps numbered 1..n. Step numbers are always derived from
/// position, including when read back from storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoutinePlan {
    steps: Vec<RoutineStep>,
}

impl RoutinePlan {
    pub fn new(steps: Vec<RoutineStep>) -> Self {
        let mut plan = Self { steps };
        plan.renumber();
        plan
    }

    pub fn renumber(&mut self) {
        for (index, step) in self.steps.iter_mut().enumerate() {
            step.step_number = index as u32 + 1;
        }
    }

    pub fn steps(&self) -> &[RoutineStep] {
        &self.steps
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.steps.iter().map(|step| &step.product_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'de> Deserialize<'de> for RoutinePlan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let steps = Vec::<RoutineStep>::deserialize(deserializer)?;
        Ok(Self::new(steps))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub phase_index: u32,
    pub start_offset_days: u32,
    #[serde(default)]
    pub label: String,
    pub introduced_product_ids: Vec<ProductId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhasePlan {
    phases: Vec<Phase>,
}

impl PhasePlan {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn introduced_product_ids(&self) -> impl Iterator<Item = &ProductId> {
        self.phases.iter().flat_map(|phase| phase.introduced_product_ids.iter())
    }
}

/// Full consultation result handed to callers and persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub profile: SkinProfile,
    pub concerns: Vec<Concern>,
    pub recommendations: SelectionSet,
    pub morning_routine: RoutinePlan,
    pub evening_routine: RoutinePlan,
    pub phased_recommendations: PhasePlan,
    #[serde(default)]
    pub notices: Vec<Notice>,
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Analysis {
    pub fn warnings(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter().filter(|notice| notice.severity == NoticeSeverity::Warning)
    }
}
