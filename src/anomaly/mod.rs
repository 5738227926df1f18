//! Anomaly scoring and label mapping
//!
//! The scorer fits an isolation forest over the derived numeric features and
//! assigns every row a binary tag; the label mapper renames the tag into the
//! domain wording each analysis presents ("Suspected Anomaly" / "Rare
//! Condition" and their inlier counterparts).

mod isolation_forest;
mod labels;

pub use isolation_forest::IsolationForest;
pub use labels::LabelContext;

use serde::{Deserialize, Serialize};

/// Binary per-row anomaly tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyTag {
    /// Statistically ordinary row.
    Inlier,
    /// Row flagged unusual relative to the fitted feature distribution.
    Outlier,
}

impl AnomalyTag {
    /// True for [`AnomalyTag::Outlier`].
    pub fn is_outlier(self) -> bool {
        matches!(self, AnomalyTag::Outlier)
    }
}
