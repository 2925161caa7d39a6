//! Model artifact contract for the NAFLD lifestyle risk predictor.
//!
//! A trained model is an opaque artifact that scores one positional feature
//! row and reports class probabilities plus a class label. The JSON logistic
//! pipeline is the artifact format shipped with the predictor.

pub mod artifact;
pub mod logistic;

pub use artifact::{BackendError, FeatureValue, ModelArtifact};
pub use logistic::{ColumnTransform, LogisticPipeline};
