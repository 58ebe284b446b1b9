/// Relevance model implementations.
///
/// The engine only ever sees the [`RelevanceModel`] trait: a batch of
/// feature rows in, one score per row out. The production model is a
/// LambdaRank-style export run through tract-onnx; the heuristic model is a
/// hand-tuned substitute for development and tests.
use ndarray::{Array1, Array2};
use std::path::Path;
use tract_onnx::prelude::{tvec, Framework, InferenceModelExt, Tensor};

use super::{RankingError, Result};
use crate::services::features::FEATURE_VECTOR_SIZE;

/// Opaque batch scorer. Implementations must be stateless with respect to
/// requests so one instance can be shared read-only across them.
pub trait RelevanceModel: Send + Sync {
    /// One relevance score per feature row.
    fn predict(&self, features: &Array2<f32>) -> Result<Array1<f32>>;
}

type TractPlan = tract_onnx::prelude::SimplePlan<
    tract_onnx::prelude::TypedFact,
    Box<dyn tract_onnx::prelude::TypedOp>,
    tract_onnx::prelude::Graph<
        tract_onnx::prelude::TypedFact,
        Box<dyn tract_onnx::prelude::TypedOp>,
    >,
>;

/// Pre-trained ranking model loaded from an ONNX file.
pub struct OnnxRankingModel {
    plan: TractPlan,
}

impl OnnxRankingModel {
    /// Load the model file. A missing or unreadable artifact is an error;
    /// the caller treats it as fatal at startup.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(RankingError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| RankingError::ModelLoadError(e.to_string()))?;

        Ok(Self { plan })
    }
}

impl RelevanceModel for OnnxRankingModel {
    fn predict(&self, features: &Array2<f32>) -> Result<Array1<f32>> {
        validate_width(features)?;
        let batch_size = features.shape()[0];

        let input_tensor = tract_onnx::prelude::tract_ndarray::Array2::from_shape_fn(
            (batch_size, FEATURE_VECTOR_SIZE),
            |(i, j)| features[[i, j]],
        );

        let input = tvec![Tensor::from(input_tensor.into_dyn()).into()];
        let output = self
            .plan
            .run(input)
            .map_err(|e| RankingError::InferenceError(format!("ONNX inference failed: {}", e)))?;

        let scores_tensor = output[0]
            .to_array_view::<f32>()
            .map_err(|e| RankingError::InferenceError(format!("Output extraction failed: {}", e)))?;

        Ok(Array1::from_iter(scores_tensor.iter().copied()))
    }
}

/// Hand-tuned linear blend over the rerank features. Stands in for the
/// trained model in tests and local development; the weights roughly mirror
/// what the trained model learns (similarity dominates, popularity gap
/// penalizes).
pub struct HeuristicModel;

impl RelevanceModel for HeuristicModel {
    fn predict(&self, features: &Array2<f32>) -> Result<Array1<f32>> {
        validate_width(features)?;

        let scores = features
            .rows()
            .into_iter()
            .map(|row| 0.55 * row[0] + 0.25 * row[1] + 0.15 * row[2] - 0.05 * row[3])
            .collect();
        Ok(scores)
    }
}

fn validate_width(features: &Array2<f32>) -> Result<()> {
    if features.shape()[1] != FEATURE_VECTOR_SIZE {
        return Err(RankingError::InvalidInput(format!(
            "Expected {} features, got {}",
            FEATURE_VECTOR_SIZE,
            features.shape()[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_scores_batch() {
        let features = Array2::from_shape_vec(
            (2, 4),
            vec![
                0.9, 1.0, 1.0, 0.0, // near-duplicate with full tag overlap
                0.1, 0.0, 0.4, 0.8, // distant, no overlap, large popularity gap
            ],
        )
        .unwrap();

        let scores = HeuristicModel.predict(&features).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn wrong_feature_width_is_rejected() {
        let features = Array2::from_shape_vec((1, 3), vec![1.0, 2.0, 3.0]).unwrap();
        let result = HeuristicModel.predict(&features);
        assert!(matches!(result, Err(RankingError::InvalidInput(_))));
    }

    #[test]
    fn missing_onnx_file_fails_to_load() {
        let result = OnnxRankingModel::load("/nonexistent/lambdarank.onnx");
        assert!(matches!(result, Err(RankingError::ModelLoadError(_))));
    }
}
