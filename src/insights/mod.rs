//! Model-driven insight feeds
//!
//! A least-squares billing-by-age regression and a K-Means patient clustering,
//! both over the derived feature columns. These feed the AI-analysis page of
//! the presentation layer.

mod clustering;
mod regression;

pub use clustering::{patient_clusters, KMeans};
pub use regression::{billing_by_age, RegressionInsight, SimpleLinearRegression};
