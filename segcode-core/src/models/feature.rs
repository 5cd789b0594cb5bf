use std::fmt::{self, Display};

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

///
/// Identity of one numeric feature stored on a segment.
///
/// Dataset features are keyed by the dataset's ordinal (its code bit); the
/// others by the configured id.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum FeatureKey {
    Dataset(usize),
    Additional(String),
    Motif(String),
    Pwm(String),
}

impl Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Dataset(bit) => write!(f, "dataset:{}", bit),
            FeatureKey::Additional(id) => write!(f, "additional:{}", id),
            FeatureKey::Motif(id) => write!(f, "motif:{}", id),
            FeatureKey::Pwm(id) => write!(f, "pwm:{}", id),
        }
    }
}

/// Sparse per-segment feature values.
pub type FeatureValues = FxHashMap<FeatureKey, f64>;

/// Column type declared in the second row of a flat-file export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Integer,
    Double,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::String => "String",
            ValueType::Integer => "Integer",
            ValueType::Double => "Double",
        };
        write!(f, "{}", s)
    }
}

///
/// One numeric column of the feature matrix, in the stable order used by the
/// correlation matrix and the flat-file export.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub key: FeatureKey,
    pub label: String,
    pub column_number: usize,
    pub value_type: ValueType,
}

impl FeatureColumn {
    pub fn is_dataset(&self) -> bool {
        matches!(self.key, FeatureKey::Dataset(_))
    }
}
