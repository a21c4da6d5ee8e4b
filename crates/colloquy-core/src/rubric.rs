//! Declarative weighted rubrics, one per category.
//!
//! Every evaluator reports `raw_*` fields in [0, 1]. A raw field is either an
//! impairment magnitude (0 = ideal) or already oriented (1 = ideal); each
//! rubric characteristic records which, so the derived sub-score is always
//! "higher is better". The table is validated once when it is built and is
//! read-only afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Category, ColloquyError, Result, SubScores};

/// Tolerance for the per-category weight sum.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Characteristic name to weight.
pub type RubricWeights = BTreeMap<String, f64>;

/// How a raw field maps onto its "higher is better" characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// 0 = ideal, 1 = worst. Characteristic is `1 - raw`.
    Impairment,
    /// 1 = ideal. Characteristic is `raw`.
    Direct,
}

impl Orientation {
    /// Orient a raw measurement so that 1.0 is ideal.
    pub fn characteristic(&self, raw: f64) -> f64 {
        match self {
            Orientation::Impairment => 1.0 - raw,
            Orientation::Direct => raw,
        }
    }
}

/// One weighted sub-characteristic of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Characteristic {
    pub name: String,
    pub raw_field: String,
    pub orientation: Orientation,
    pub weight: f64,
}

impl Characteristic {
    fn new(name: &str, raw_field: &str, orientation: Orientation, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            raw_field: raw_field.to_string(),
            orientation,
            weight,
        }
    }
}

/// The rubric for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRubric {
    pub category: Category,
    pub characteristics: Vec<Characteristic>,
}

impl CategoryRubric {
    /// The compiled-in rubric for `category`.
    pub fn standard(category: Category) -> Self {
        use Orientation::{Direct, Impairment};
        let characteristics = match category {
            Category::Fluency => vec![
                Characteristic::new("lack_of_filler_words", "raw_filler_words", Impairment, 0.4),
                Characteristic::new("lack_of_run_ons", "raw_run_ons", Impairment, 0.3),
                Characteristic::new("good_wpm", "raw_wpm", Impairment, 0.3),
            ],
            Category::Prosody => vec![
                Characteristic::new("good_pace", "raw_pace", Impairment, 0.5),
                Characteristic::new("lack_of_pauses", "raw_pauses", Impairment, 0.3),
                Characteristic::new("good_volume_variance", "raw_volume_variance", Direct, 0.2),
            ],
            Category::Pragmatics => vec![
                Characteristic::new("yes_answered_question", "raw_answered_question", Direct, 0.6),
                Characteristic::new("no_rambling", "raw_rambling", Impairment, 0.4),
            ],
            Category::Consideration => vec![
                Characteristic::new("no_hedging", "raw_hedging", Impairment, 0.4),
                Characteristic::new(
                    "good_amount_of_acknowledgment",
                    "raw_acknowledgment",
                    Direct,
                    0.3,
                ),
                Characteristic::new("no_interruptions", "raw_interruptions", Impairment, 0.3),
            ],
            Category::TimeBalance => vec![
                Characteristic::new(
                    "good_interruption_ratio",
                    "raw_interruption_ratio",
                    Impairment,
                    0.5,
                ),
                Characteristic::new("good_speaking_share", "raw_speaking_share", Impairment, 0.5),
            ],
        };
        Self {
            category,
            characteristics,
        }
    }

    /// Characteristic name to weight.
    pub fn weights(&self) -> RubricWeights {
        self.characteristics
            .iter()
            .map(|c| (c.name.clone(), c.weight))
            .collect()
    }

    /// Raw fields an evaluator must report for this category.
    pub fn raw_fields(&self) -> impl Iterator<Item = &str> {
        self.characteristics.iter().map(|c| c.raw_field.as_str())
    }

    /// Orient raw field values into characteristic sub-scores.
    ///
    /// Raw fields absent from `raw` are skipped; the scorer treats them as 0.
    pub fn derive_sub_scores(&self, raw: &HashMap<String, f64>) -> SubScores {
        self.characteristics
            .iter()
            .filter_map(|c| {
                raw.get(&c.raw_field)
                    .map(|v| (c.name.clone(), c.orientation.characteristic(*v)))
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> {
            Err(ColloquyError::InvalidRubric(format!("{}: {msg}", self.category)))
        };

        if self.characteristics.is_empty() {
            return invalid("no characteristics".to_string());
        }

        let mut names = HashSet::new();
        let mut fields = HashSet::new();
        for c in &self.characteristics {
            if !(c.weight > 0.0 && c.weight <= 1.0) {
                return invalid(format!("weight {} of '{}' outside (0, 1]", c.weight, c.name));
            }
            if !names.insert(c.name.as_str()) {
                return invalid(format!("duplicate characteristic '{}'", c.name));
            }
            if !fields.insert(c.raw_field.as_str()) {
                return invalid(format!("duplicate raw field '{}'", c.raw_field));
            }
        }

        let sum: f64 = self.characteristics.iter().map(|c| c.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return invalid(format!("weights sum to {sum}, expected 1.0"));
        }
        Ok(())
    }
}

/// Category to rubric lookup, validated at construction.
#[derive(Debug, Clone)]
pub struct RubricTable {
    rubrics: HashMap<Category, CategoryRubric>,
}

impl RubricTable {
    /// The compiled-in table covering every category.
    pub fn standard() -> Self {
        Self {
            rubrics: Category::ALL
                .into_iter()
                .map(|c| (c, CategoryRubric::standard(c)))
                .collect(),
        }
    }

    /// Build a table from explicit rubrics, validating each one.
    ///
    /// Categories may be omitted; looking them up later yields
    /// [`ColloquyError::UnknownCategory`].
    pub fn from_rubrics(rubrics: Vec<CategoryRubric>) -> Result<Self> {
        let mut table = HashMap::new();
        for rubric in rubrics {
            rubric.validate()?;
            let category = rubric.category;
            if table.insert(category, rubric).is_some() {
                return Err(ColloquyError::InvalidRubric(format!(
                    "{category}: defined more than once"
                )));
            }
        }
        Ok(Self { rubrics: table })
    }

    /// Parse a JSON array of [`CategoryRubric`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rubrics: Vec<CategoryRubric> = serde_json::from_str(json)?;
        Self::from_rubrics(rubrics)
    }

    /// Load and validate a rubric table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rubric for `category`, or `UnknownCategory`.
    pub fn rubric(&self, category: Category) -> Result<&CategoryRubric> {
        self.rubrics
            .get(&category)
            .ok_or_else(|| ColloquyError::UnknownCategory(category.to_string()))
    }

    /// Weights for `category`, or `UnknownCategory` if it is not registered.
    pub fn weights(&self, category: Category) -> Result<RubricWeights> {
        self.rubric(category).map(CategoryRubric::weights)
    }

    /// Registered rubrics in category declaration order.
    pub fn rubrics(&self) -> Vec<&CategoryRubric> {
        Category::ALL
            .iter()
            .filter_map(|c| self.rubrics.get(c))
            .collect()
    }
}

impl Default for RubricTable {
    fn default() -> Self {
        Self::standard()
    }
}
