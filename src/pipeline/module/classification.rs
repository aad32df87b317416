use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::pipeline::errors::{ArtifactError, PipelineError};

/// Opaque pre-trained classifier capability. The pipeline only needs
/// predict / predict-probabilities over one feature vector; the concrete
/// model format stays swappable behind this trait.
pub trait ClassifierModel: Send + Sync {
    fn input_dim(&self) -> usize;
    fn class_count(&self) -> usize;

    /// Predicted class index; ties resolve to the lowest class index.
    fn predict(&self, features: &ArrayView1<f32>) -> Result<usize, PipelineError>;

    /// Per-class confidence as percentages in [0, 100], ordered by class
    /// index, summing to ~100.
    fn predict_probabilities(&self, features: &ArrayView1<f32>) -> Result<Vec<f32>, PipelineError>;
}

/// Linear scoring model (`w · x + b` per class, softmax over scores),
/// deserialized from the JSON artifact written at training time.
pub struct LinearClassifier {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

#[derive(Debug, Deserialize)]
struct LinearClassifierFile {
    input_dim: usize,
    n_classes: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
}

impl LinearClassifier {
    pub fn from_json(data: &str) -> Result<Self, ArtifactError> {
        let file: LinearClassifierFile = serde_json::from_str(data)
            .map_err(|e| ArtifactError::MalformedModel(e.to_string()))?;

        if file.n_classes == 0 {
            return Err(ArtifactError::MalformedModel(
                "model declares zero classes".to_string(),
            ));
        }
        if file.weights.len() != file.n_classes {
            return Err(ArtifactError::MalformedModel(format!(
                "expected {} weight rows, found {}",
                file.n_classes,
                file.weights.len()
            )));
        }
        if file.bias.len() != file.n_classes {
            return Err(ArtifactError::MalformedModel(format!(
                "expected {} bias terms, found {}",
                file.n_classes,
                file.bias.len()
            )));
        }
        for (idx, row) in file.weights.iter().enumerate() {
            if row.len() != file.input_dim {
                return Err(ArtifactError::MalformedModel(format!(
                    "weight row {} has length {}, expected {}",
                    idx,
                    row.len(),
                    file.input_dim
                )));
            }
        }

        let flat: Vec<f32> = file.weights.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((file.n_classes, file.input_dim), flat)
            .map_err(|e| ArtifactError::MalformedModel(e.to_string()))?;

        Ok(LinearClassifier {
            weights,
            bias: Array1::from(file.bias),
        })
    }

    #[cfg(test)]
    pub fn from_parts(weights: Array2<f32>, bias: Array1<f32>) -> Self {
        LinearClassifier { weights, bias }
    }

    fn scores(&self, features: &ArrayView1<f32>) -> Result<Array1<f32>, PipelineError> {
        if features.len() != self.input_dim() {
            return Err(PipelineError::UnscoredInput {
                expected: self.input_dim(),
                actual: features.len(),
            });
        }
        Ok(self.weights.dot(features) + &self.bias)
    }
}

impl ClassifierModel for LinearClassifier {
    fn input_dim(&self) -> usize {
        self.weights.dim().1
    }

    fn class_count(&self) -> usize {
        self.weights.dim().0
    }

    fn predict(&self, features: &ArrayView1<f32>) -> Result<usize, PipelineError> {
        let scores = self.scores(features)?;
        let mut best = 0usize;
        for (idx, score) in scores.iter().enumerate() {
            // Strict comparison keeps the lowest index on ties
            if *score > scores[best] {
                best = idx;
            }
        }
        Ok(best)
    }

    fn predict_probabilities(&self, features: &ArrayView1<f32>) -> Result<Vec<f32>, PipelineError> {
        let scores = self.scores(features)?;
        let max = scores.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        let exp: Vec<f32> = scores.iter().map(|&v| (v - max).exp()).collect();
        let sum: f32 = exp.iter().sum();
        Ok(exp.into_iter().map(|v| v / sum * 100.0).collect())
    }
}

/// The one qualified-face classification outcome exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub class_index: usize,
    pub class_name: String,
    pub class_probability: Vec<f32>,
}

/// Invokes the pre-loaded model for one feature vector and resolves the
/// predicted index to its class name.
pub struct ClassifierAdapter<'a> {
    model: &'a dyn ClassifierModel,
    class_names: &'a [String],
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

impl<'a> ClassifierAdapter<'a> {
    pub fn new(model: &'a dyn ClassifierModel, class_names: &'a [String]) -> Self {
        ClassifierAdapter { model, class_names }
    }

    pub fn call(&self, features: &ArrayView1<f32>) -> Result<ClassificationResult, PipelineError> {
        let class_index = self.model.predict(features)?;
        let class_probability: Vec<f32> = self
            .model
            .predict_probabilities(features)?
            .into_iter()
            .map(round2)
            .collect();

        Ok(ClassificationResult {
            class_index,
            class_name: self.class_names[class_index].clone(),
            class_probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_model() -> LinearClassifier {
        // 3 classes over 4 inputs; class 1 keys on feature 1, class 2 on feature 3
        let weights = array![
            [1.0f32, 0.0, 0.0, 0.0],
            [0.0, 2.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.5],
        ];
        let bias = array![0.0f32, -1.0, 0.0];
        LinearClassifier::from_parts(weights, bias)
    }

    fn sample_names() -> Vec<String> {
        vec!["alpha".to_string(), "bravo".to_string(), "charlie".to_string()]
    }

    #[test]
    fn test_predict_picks_highest_score() {
        let model = sample_model();
        let x = array![0.0f32, 3.0, 0.0, 0.0];
        assert_eq!(model.predict(&x.view()).unwrap(), 1);
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let weights = Array2::<f32>::zeros((5, 4));
        let bias = Array1::<f32>::zeros(5);
        let model = LinearClassifier::from_parts(weights, bias);

        let x = array![1.0f32, 2.0, 3.0, 4.0];
        assert_eq!(model.predict(&x.view()).unwrap(), 0);
    }

    #[test]
    fn test_probabilities_are_percentages_summing_to_100() {
        let model = sample_model();
        let x = array![2.0f32, 1.0, -0.5, 3.0];
        let probs = model.predict_probabilities(&x.view()).unwrap();

        assert_eq!(probs.len(), 3);
        assert!(probs.iter().all(|&p| (0.0..=100.0).contains(&p)));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_dimension_mismatch_is_unscored_input() {
        let model = sample_model();
        let x = array![1.0f32, 2.0];
        let result = model.predict(&x.view());
        assert!(matches!(
            result,
            Err(PipelineError::UnscoredInput { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_adapter_resolves_class_name() {
        let model = sample_model();
        let names = sample_names();
        let adapter = ClassifierAdapter::new(&model, &names);

        let x = array![0.0f32, 0.0, 0.0, 5.0];
        let result = adapter.call(&x.view()).unwrap();
        assert_eq!(result.class_index, 2);
        assert_eq!(result.class_name, "charlie");
        assert_eq!(result.class_probability.len(), 3);
    }

    #[test]
    fn test_adapter_prediction_matches_max_probability() {
        let model = sample_model();
        let names = sample_names();
        let adapter = ClassifierAdapter::new(&model, &names);

        let x = array![4.0f32, 1.0, 0.0, 1.0];
        let result = adapter.call(&x.view()).unwrap();
        let max_idx = result
            .class_probability
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(result.class_index, max_idx);
    }

    #[test]
    fn test_from_json_accepts_valid_model() {
        let data = r#"{
            "input_dim": 2,
            "n_classes": 2,
            "weights": [[1.0, 0.0], [0.0, 1.0]],
            "bias": [0.0, 0.0]
        }"#;
        let model = LinearClassifier::from_json(data).unwrap();
        assert_eq!(model.input_dim(), 2);
        assert_eq!(model.class_count(), 2);
    }

    #[test]
    fn test_from_json_rejects_ragged_weights() {
        let data = r#"{
            "input_dim": 3,
            "n_classes": 2,
            "weights": [[1.0, 0.0, 0.0], [0.0, 1.0]],
            "bias": [0.0, 0.0]
        }"#;
        let result = LinearClassifier::from_json(data);
        assert!(matches!(result, Err(ArtifactError::MalformedModel(_))));
    }

    #[test]
    fn test_from_json_rejects_bad_bias_length() {
        let data = r#"{
            "input_dim": 2,
            "n_classes": 2,
            "weights": [[1.0, 0.0], [0.0, 1.0]],
            "bias": [0.0]
        }"#;
        let result = LinearClassifier::from_json(data);
        assert!(matches!(result, Err(ArtifactError::MalformedModel(_))));
    }

    #[test]
    fn test_from_json_rejects_zero_classes() {
        // An empty weight matrix still reports input_dim columns, so a
        // zero-class model would pass the load-time dimension check and
        // only surface on the first prediction
        let data = r#"{
            "input_dim": 4096,
            "n_classes": 0,
            "weights": [],
            "bias": []
        }"#;
        let result = LinearClassifier::from_json(data);
        assert!(matches!(result, Err(ArtifactError::MalformedModel(_))));
    }
}
