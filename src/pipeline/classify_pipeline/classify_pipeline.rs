use log::debug;

use crate::pipeline::artifact::store::{ArtifactBundle, ArtifactConfig, STORE};
use crate::pipeline::errors::{ArtifactError, PipelineError};
use crate::pipeline::model_config::config::{FaceQualificationConfig, FeatureExtractionConfig};
use crate::pipeline::module::classification::{ClassificationResult, ClassifierAdapter};
use crate::pipeline::module::face_location::FaceEyeLocator;
use crate::pipeline::module::face_qualification::FaceQualification;
use crate::pipeline::module::feature_extraction::FeatureExtraction;
use crate::pipeline::utils::image::{crop_region, decode_image_payload};

/// End-to-end classification: decode, locate faces and eyes, qualify, then
/// extract features and score each qualified face independently.
///
/// Stateless per request; the only shared state is the read-only artifact
/// bundle loaded once at startup.
pub struct ClassificationPipeline {
    bundle: &'static ArtifactBundle,
    face_qualification: FaceQualification,
    feature_extraction: FeatureExtraction,
}

impl ClassificationPipeline {
    /// Loads the artifacts (a no-op if already loaded) and assembles the
    /// pipeline modules. Fails fatally on missing or malformed artifacts.
    pub fn new(cfg: &ArtifactConfig) -> Result<Self, ArtifactError> {
        let bundle = STORE.load(cfg)?;
        Ok(Self::from_bundle(bundle))
    }

    fn from_bundle(bundle: &'static ArtifactBundle) -> Self {
        let qualification_cfg = FaceQualificationConfig::new();
        let extraction_cfg = FeatureExtractionConfig::new();

        ClassificationPipeline {
            bundle,
            face_qualification: FaceQualification::new(qualification_cfg.min_eye_count),
            feature_extraction: FeatureExtraction::new(
                extraction_cfg.image_size,
                extraction_cfg.wavelet_levels,
            ),
        }
    }

    /// Classify every qualified face in the payload, in detection order.
    /// Zero qualified faces is an empty Ok result, not an error; the
    /// boundary layer decides how to present that.
    pub fn classify(&self, payload: &[u8]) -> Result<Vec<ClassificationResult>, PipelineError> {
        let image = decode_image_payload(payload)?;

        let locator = FaceEyeLocator::new(
            self.bundle.face_detector.as_ref(),
            self.bundle.eye_detector.as_ref(),
        );
        let located = locator.call(&image)?;
        let located_count = located.len();

        let qualified = self.face_qualification.call(located);
        debug!(
            "located {} face candidate(s), {} qualified",
            located_count,
            qualified.len()
        );

        let adapter = ClassifierAdapter::new(&self.bundle.model, &self.bundle.class_names);

        let mut results = Vec::with_capacity(qualified.len());
        for region in qualified {
            let face = crop_region(&image, region.bounds)?;
            let features = self.feature_extraction.call(&face)?;
            results.push(adapter.call(&features.view())?);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::model_config::config::FEATURE_LEN;
    use crate::pipeline::module::classification::LinearClassifier;
    use crate::pipeline::module::face_location::testing::StubDetector;
    use ndarray::{Array1, Array2};
    use opencv::core::{Mat, MatTrait, Rect, Scalar, Vec3b, Vector, CV_8UC3};
    use opencv::imgcodecs::imencode;
    use opencv::prelude::VectorToVec;

    fn encode_png(rows: i32, cols: i32) -> Vec<u8> {
        let mut mat =
            Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(0.0)).unwrap();
        for y in 0..rows {
            for x in 0..cols {
                let px = mat.at_2d_mut::<Vec3b>(y, x).unwrap();
                px[0] = (x % 256) as u8;
                px[1] = (y % 256) as u8;
                px[2] = ((x + y) % 256) as u8;
            }
        }
        let mut buf = Vector::<u8>::new();
        imencode(".png", &mat, &mut buf, &Vector::new()).unwrap();
        buf.to_vec()
    }

    fn leak_bundle(faces: Vec<Rect>, eyes: Vec<Rect>) -> &'static ArtifactBundle {
        Box::leak(Box::new(ArtifactBundle {
            model: LinearClassifier::from_parts(
                Array2::<f32>::zeros((5, FEATURE_LEN)),
                Array1::from(vec![0.0f32, 0.5, 0.0, 0.0, 0.0]),
            ),
            class_names: vec![
                "lionel_messi".to_string(),
                "maria_sharapova".to_string(),
                "roger_federer".to_string(),
                "serena_williams".to_string(),
                "virat_kohli".to_string(),
            ],
            face_detector: Box::new(StubDetector { rects: faces }),
            eye_detector: Box::new(StubDetector { rects: eyes }),
        }))
    }

    fn two_eyes() -> Vec<Rect> {
        vec![Rect::new(5, 8, 10, 6), Rect::new(22, 8, 10, 6)]
    }

    #[test]
    fn test_no_face_yields_empty_result_not_error() {
        let bundle = leak_bundle(vec![], two_eyes());
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let results = pipeline.classify(&encode_png(80, 80)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_qualified_face_is_classified() {
        let bundle = leak_bundle(vec![Rect::new(10, 10, 40, 40)], two_eyes());
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let results = pipeline.classify(&encode_png(100, 100)).unwrap();
        assert_eq!(results.len(), 1);

        let result = &results[0];
        // The bias term favors class 1 in the stub model
        assert_eq!(result.class_index, 1);
        assert_eq!(result.class_name, "maria_sharapova");
        assert_eq!(result.class_probability.len(), 5);
        let sum: f32 = result.class_probability.iter().sum();
        assert!((sum - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_one_eyed_face_is_dropped() {
        let bundle = leak_bundle(
            vec![Rect::new(10, 10, 40, 40)],
            vec![Rect::new(5, 8, 10, 6)],
        );
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let results = pipeline.classify(&encode_png(100, 100)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_results_follow_detection_order() {
        let bundle = leak_bundle(
            vec![Rect::new(0, 0, 30, 30), Rect::new(40, 40, 30, 30)],
            two_eyes(),
        );
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let results = pipeline.classify(&encode_png(100, 100)).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_decode_failure_propagates() {
        let bundle = leak_bundle(vec![], vec![]);
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let result = pipeline.classify(b"not an image at all");
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }

    #[test]
    fn test_data_uri_payload_is_accepted() {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;

        let bundle = leak_bundle(vec![Rect::new(10, 10, 40, 40)], two_eyes());
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let uri = format!("data:image/png;base64,{}", BASE64.encode(encode_png(100, 100)));
        let results = pipeline.classify(uri.as_bytes()).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let bundle = leak_bundle(vec![Rect::new(10, 10, 40, 40)], two_eyes());
        let pipeline = ClassificationPipeline::from_bundle(bundle);

        let payload = encode_png(100, 100);
        let first = pipeline.classify(&payload).unwrap();
        let second = pipeline.classify(&payload).unwrap();
        assert_eq!(first[0].class_probability, second[0].class_probability);
    }
}
