//! Classification reporting
//!
//! [`BinaryReport`] computes the usual binary metrics from true/predicted
//! labels. [`SelfConsistencyReport`] wraps it for the performance analysis,
//! where the anomaly tags serve as their own synthetic ground truth: scores
//! are perfect by construction, and the type name says so. The one guard is
//! real: a single-class tag column is rejected instead of reported as perfect
//! accuracy.

use crate::anomaly::AnomalyTag;
use crate::error::{CarelensError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 2x2 confusion counts, with "outlier" as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Count agreements and disagreements between `y_true` and `y_pred`,
    /// where `true` is the positive class.
    pub fn from_labels(y_true: &[bool], y_pred: &[bool]) -> Self {
        let mut cm = Self {
            true_positives: 0,
            false_positives: 0,
            true_negatives: 0,
            false_negatives: 0,
        };
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t, p) {
                (true, true) => cm.true_positives += 1,
                (false, true) => cm.false_positives += 1,
                (false, false) => cm.true_negatives += 1,
                (true, false) => cm.false_negatives += 1,
            }
        }
        cm
    }

    /// True-positive rate (recall of the positive class).
    pub fn tpr(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// False-positive rate.
    pub fn fpr(&self) -> f64 {
        ratio(self.false_positives, self.false_positives + self.true_negatives)
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Precision / recall / F1 for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassScores {
    fn from_counts(tp: usize, fp: usize, fn_: usize, support: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Full binary classification report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryReport {
    pub accuracy: f64,
    /// Scores for the positive (outlier) class.
    pub positive: ClassScores,
    /// Scores for the negative (inlier) class.
    pub negative: ClassScores,
    pub macro_f1: f64,
    pub confusion: ConfusionMatrix,
    /// Area under the ROC curve through the single operating point.
    pub roc_auc: f64,
    pub n_samples: usize,
}

impl BinaryReport {
    /// Compute the report from true/predicted labels.
    ///
    /// Fails with [`CarelensError::DegenerateLabels`] when `y_true` holds only
    /// one class: recall of the absent class is undefined, and a report built
    /// on it would be misleading.
    pub fn compute(y_true: &[bool], y_pred: &[bool]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(CarelensError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{}", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(CarelensError::DegenerateLabels(
                "empty label column".to_string(),
            ));
        }

        let positives = y_true.iter().filter(|&&t| t).count();
        if positives == 0 || positives == y_true.len() {
            let class = if positives == 0 { "positive" } else { "negative" };
            return Err(CarelensError::DegenerateLabels(format!(
                "no {class} examples among {} labels",
                y_true.len()
            )));
        }

        let confusion = ConfusionMatrix::from_labels(y_true, y_pred);
        let n = y_true.len();

        let positive = ClassScores::from_counts(
            confusion.true_positives,
            confusion.false_positives,
            confusion.false_negatives,
            positives,
        );
        // Negative class: swap the roles of hit and miss.
        let negative = ClassScores::from_counts(
            confusion.true_negatives,
            confusion.false_negatives,
            confusion.false_positives,
            n - positives,
        );

        let correct = confusion.true_positives + confusion.true_negatives;

        // Single-threshold ROC: trapezoid through (0,0), (fpr,tpr), (1,1).
        let roc_auc = (1.0 + confusion.tpr() - confusion.fpr()) / 2.0;

        Ok(Self {
            accuracy: ratio(correct, n),
            positive,
            negative,
            macro_f1: (positive.f1 + negative.f1) / 2.0,
            confusion,
            roc_auc,
            n_samples: n,
        })
    }
}

/// Report of the anomaly tags measured against themselves.
///
/// The model's own predictions stand in as ground truth, so every score is
/// 1.0 by construction. The name carries the circularity: this measures the
/// detector's agreement with itself, not accuracy against real labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfConsistencyReport {
    pub report: BinaryReport,
    pub n_outliers: usize,
    pub n_inliers: usize,
}

impl SelfConsistencyReport {
    /// Build the report from a tag column.
    ///
    /// A single-class column (for example, fewer than `1/contamination` rows)
    /// fails with [`CarelensError::DegenerateLabels`].
    pub fn from_tags(tags: &[AnomalyTag]) -> Result<Self> {
        let labels: Vec<bool> = tags.iter().map(|t| t.is_outlier()).collect();
        let report = BinaryReport::compute(&labels, &labels)?;

        let n_outliers = labels.iter().filter(|&&l| l).count();
        let n_inliers = labels.len() - n_outliers;

        info!(
            n_outliers,
            n_inliers,
            accuracy = report.accuracy,
            "computed self-consistency report"
        );

        Ok(Self {
            report,
            n_outliers,
            n_inliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_predictions() {
        let y_true = [true, true, false, false, false, true];
        let y_pred = [true, false, false, true, false, true];

        let report = BinaryReport::compute(&y_true, &y_pred).unwrap();
        assert_eq!(report.confusion.true_positives, 2);
        assert_eq!(report.confusion.false_negatives, 1);
        assert_eq!(report.confusion.false_positives, 1);
        assert_eq!(report.confusion.true_negatives, 2);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((report.positive.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.positive.recall - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_self_consistency_is_trivially_perfect() {
        let tags = [
            AnomalyTag::Outlier,
            AnomalyTag::Inlier,
            AnomalyTag::Inlier,
            AnomalyTag::Outlier,
            AnomalyTag::Inlier,
        ];
        let sc = SelfConsistencyReport::from_tags(&tags).unwrap();

        assert_eq!(sc.n_outliers, 2);
        assert_eq!(sc.n_inliers, 3);
        assert_eq!(sc.report.accuracy, 1.0);
        assert_eq!(sc.report.positive.f1, 1.0);
        assert_eq!(sc.report.negative.f1, 1.0);
        assert_eq!(sc.report.roc_auc, 1.0);
    }

    #[test]
    fn test_all_inlier_tags_are_rejected() {
        let tags = vec![AnomalyTag::Inlier; 10];
        let err = SelfConsistencyReport::from_tags(&tags).unwrap_err();
        assert!(matches!(err, CarelensError::DegenerateLabels(_)));
    }

    #[test]
    fn test_all_outlier_tags_are_rejected() {
        let tags = vec![AnomalyTag::Outlier; 4];
        assert!(matches!(
            SelfConsistencyReport::from_tags(&tags),
            Err(CarelensError::DegenerateLabels(_))
        ));
    }

    #[test]
    fn test_empty_labels_are_rejected() {
        assert!(matches!(
            BinaryReport::compute(&[], &[]),
            Err(CarelensError::DegenerateLabels(_))
        ));
    }

    #[test]
    fn test_length_mismatch_is_a_shape_error() {
        assert!(matches!(
            BinaryReport::compute(&[true, false], &[true]),
            Err(CarelensError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_roc_auc_single_point() {
        // Perfect separation: tpr 1, fpr 0 -> auc 1.
        let report = BinaryReport::compute(&[true, false], &[true, false]).unwrap();
        assert_eq!(report.roc_auc, 1.0);

        // Inverted predictions: tpr 0, fpr 1 -> auc 0.
        let report = BinaryReport::compute(&[true, false], &[false, true]).unwrap();
        assert_eq!(report.roc_auc, 0.0);
    }
}
