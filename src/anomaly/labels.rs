//! Domain wording for the binary anomaly tag

use crate::anomaly::AnomalyTag;

/// Which analysis the tag labels are rendered for. Two analyses present the
/// same two-valued signal under different wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelContext {
    /// Billing anomaly analysis: "Normal" / "Suspected Anomaly".
    Billing,
    /// Medical-condition analysis: "Common Condition" / "Rare Condition".
    Condition,
}

impl LabelContext {
    /// Domain label for a tag. Pure and total over the binary domain.
    pub fn label(self, tag: AnomalyTag) -> &'static str {
        match (self, tag) {
            (LabelContext::Billing, AnomalyTag::Inlier) => "Normal",
            (LabelContext::Billing, AnomalyTag::Outlier) => "Suspected Anomaly",
            (LabelContext::Condition, AnomalyTag::Inlier) => "Common Condition",
            (LabelContext::Condition, AnomalyTag::Outlier) => "Rare Condition",
        }
    }

    /// Label given to inliers in this context.
    pub fn inlier_label(self) -> &'static str {
        self.label(AnomalyTag::Inlier)
    }

    /// Label given to outliers in this context.
    pub fn outlier_label(self) -> &'static str {
        self.label(AnomalyTag::Outlier)
    }

    /// Inverse mapping: recover the tag from a label produced by this context.
    pub fn tag_for(self, label: &str) -> Option<AnomalyTag> {
        if label == self.inlier_label() {
            Some(AnomalyTag::Inlier)
        } else if label == self.outlier_label() {
            Some(AnomalyTag::Outlier)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_labels() {
        assert_eq!(LabelContext::Billing.label(AnomalyTag::Inlier), "Normal");
        assert_eq!(
            LabelContext::Billing.label(AnomalyTag::Outlier),
            "Suspected Anomaly"
        );
    }

    #[test]
    fn test_condition_labels() {
        assert_eq!(
            LabelContext::Condition.label(AnomalyTag::Inlier),
            "Common Condition"
        );
        assert_eq!(
            LabelContext::Condition.label(AnomalyTag::Outlier),
            "Rare Condition"
        );
    }

    #[test]
    fn test_label_round_trip() {
        for ctx in [LabelContext::Billing, LabelContext::Condition] {
            for tag in [AnomalyTag::Inlier, AnomalyTag::Outlier] {
                assert_eq!(ctx.tag_for(ctx.label(tag)), Some(tag));
            }
        }
    }

    #[test]
    fn test_unknown_label_has_no_tag() {
        assert_eq!(LabelContext::Billing.tag_for("Rare Condition"), None);
        assert_eq!(LabelContext::Condition.tag_for("whatever"), None);
    }
}
