//! Carelens - Hospital admissions analytics engine
//!
//! This crate turns uploaded hospital admission tables into anomaly
//! findings and descriptive statistics:
//! - Derived features from raw admission records
//! - Isolation-forest anomaly scoring for billing and conditions
//! - Self-consistency reporting for the fitted detector
//! - Summary statistics and exploratory insights
//!
//! # Modules
//!
//! ## Core Analysis
//! - [`features`] - Feature derivation, scaling, date handling
//! - [`anomaly`] - Isolation forest scoring and status labels
//! - [`report`] - Classification metrics and self-consistency reports
//! - [`pipeline`] - Billing, condition, and performance analyses
//!
//! ## Data Handling
//! - [`schema`] - Required and derived column names
//! - [`store`] - Upload folder access with fingerprint caching
//!
//! ## Exploration
//! - [`stats`] - Value counts, histograms, correlations
//! - [`insights`] - Clustering and regression over patient tables

// Core error handling
pub mod error;

// Data handling
pub mod schema;
pub mod store;

// Core analysis
pub mod features;
pub mod anomaly;
pub mod report;
pub mod pipeline;

// Exploration
pub mod stats;
pub mod insights;

pub use error::{CarelensError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CarelensError, Result};

    // Schema
    pub use crate::schema::{columns, derived, TableSchema};

    // Upload store
    pub use crate::store::{FileFingerprint, UploadStore};

    // Features
    pub use crate::features::{DerivedTable, FeatureDeriver, StandardScaler};

    // Anomaly detection
    pub use crate::anomaly::{AnomalyTag, IsolationForest, LabelContext};

    // Reporting
    pub use crate::report::{BinaryReport, ClassScores, ConfusionMatrix, SelfConsistencyReport};

    // Pipelines
    pub use crate::pipeline::{
        AnalysisConfig, BillingAnalysis, BillingOutcome, ConditionAnalysis, ConditionOutcome,
        PerformanceAnalysis, PerformanceOutcome,
    };

    // Insights
    pub use crate::insights::{patient_clusters, KMeans, RegressionInsight, SimpleLinearRegression};
}
