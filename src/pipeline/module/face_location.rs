use std::path::Path;
use std::sync::Mutex;

use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::{CascadeClassifier, CascadeClassifierTrait, CascadeClassifierTraitConst};
use opencv::prelude::VectorToVec;

use crate::pipeline::errors::{ArtifactError, PipelineError};
use crate::pipeline::utils::image::{crop_region, to_grayscale};

/// Generic rectangle-detection capability. Keeping detection behind this
/// trait lets a learned detector replace the haar cascades without touching
/// qualification or feature extraction.
pub trait RegionDetector: Send + Sync {
    fn detect(&self, gray: &Mat) -> Result<Vec<Rect>, PipelineError>;
}

/// Classical multi-stage cascade detector backed by an OpenCV haar XML
/// definition. `detect_multi_scale` needs `&mut self`, so the classifier
/// sits behind a mutex to stay shareable across request threads.
pub struct CascadeDetector {
    classifier: Mutex<CascadeClassifier>,
    scale_factor: f64,
    min_neighbors: i32,
}

impl CascadeDetector {
    pub fn from_file(path: &str, scale_factor: f64, min_neighbors: i32) -> Result<Self, ArtifactError> {
        if !Path::new(path).exists() {
            return Err(ArtifactError::MissingFile { path: path.to_string() });
        }

        let classifier = match CascadeClassifier::new(path) {
            Ok(classifier) => classifier,
            Err(e) => {
                return Err(ArtifactError::CascadeLoad {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        // A cascade that fails to parse loads as an empty classifier
        let empty = classifier.empty().map_err(|e| ArtifactError::CascadeLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        if empty {
            return Err(ArtifactError::CascadeLoad {
                path: path.to_string(),
                reason: "cascade definition is empty".to_string(),
            });
        }

        Ok(CascadeDetector {
            classifier: Mutex::new(classifier),
            scale_factor,
            min_neighbors,
        })
    }
}

impl RegionDetector for CascadeDetector {
    fn detect(&self, gray: &Mat) -> Result<Vec<Rect>, PipelineError> {
        let mut regions = Vector::<Rect>::new();
        // The cascade holds no state a poisoned lock could corrupt, so a
        // panic in a previous holder does not make it unusable
        let mut classifier = self
            .classifier
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        classifier.detect_multi_scale(
            gray,
            &mut regions,
            self.scale_factor,
            self.min_neighbors,
            0,
            Size::default(),
            Size::default(),
        )?;
        Ok(regions.to_vec())
    }
}

/// A candidate face rectangle and the eye rectangles found inside it.
/// Eye coordinates are relative to the face crop.
#[derive(Debug, Clone)]
pub struct FaceRegion {
    pub bounds: Rect,
    pub eyes: Vec<Rect>,
}

/// Finds candidate faces in an image and annotates each with the eyes
/// detected inside its bounding box. Detection is heuristic: zero, one, or
/// many overlapping candidates per real face are all possible outcomes and
/// no geometric merging happens here.
pub struct FaceEyeLocator<'a> {
    face_detector: &'a dyn RegionDetector,
    eye_detector: &'a dyn RegionDetector,
}

impl<'a> FaceEyeLocator<'a> {
    pub fn new(face_detector: &'a dyn RegionDetector, eye_detector: &'a dyn RegionDetector) -> Self {
        FaceEyeLocator { face_detector, eye_detector }
    }

    pub fn call(&self, image: &Mat) -> Result<Vec<FaceRegion>, PipelineError> {
        let gray = to_grayscale(image)?;

        let candidates = self.face_detector.detect(&gray)?;
        let mut regions = Vec::with_capacity(candidates.len());

        for bounds in candidates {
            let face_gray = crop_region(&gray, bounds)?;
            let eyes = self.eye_detector.detect(&face_gray)?;
            regions.push(FaceRegion { bounds, eyes });
        }

        Ok(regions)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubDetector;
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    fn blank_image(rows: i32, cols: i32) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(128.0)).unwrap()
    }

    #[test]
    fn test_locator_annotates_each_face_with_eyes() {
        let faces = StubDetector {
            rects: vec![Rect::new(10, 10, 40, 40), Rect::new(55, 20, 30, 30)],
        };
        let eyes = StubDetector {
            rects: vec![Rect::new(5, 8, 10, 6), Rect::new(22, 8, 10, 6)],
        };

        let locator = FaceEyeLocator::new(&faces, &eyes);
        let regions = locator.call(&blank_image(100, 100)).unwrap();

        assert_eq!(regions.len(), 2);
        for region in &regions {
            assert_eq!(region.eyes.len(), 2);
        }
        assert_eq!(regions[0].bounds, Rect::new(10, 10, 40, 40));
    }

    #[test]
    fn test_locator_returns_empty_when_no_faces() {
        let faces = StubDetector { rects: vec![] };
        let eyes = StubDetector {
            rects: vec![Rect::new(0, 0, 4, 4)],
        };

        let locator = FaceEyeLocator::new(&faces, &eyes);
        let regions = locator.call(&blank_image(64, 64)).unwrap();
        assert!(regions.is_empty());
    }

    #[test]
    fn test_missing_cascade_file_is_reported() {
        let result = CascadeDetector::from_file("/nonexistent/cascade.xml", 1.3, 5);
        assert!(matches!(result, Err(ArtifactError::MissingFile { .. })));
    }

    #[test]
    fn test_detect_survives_poisoned_lock() {
        let detector = CascadeDetector {
            classifier: Mutex::new(CascadeClassifier::default().unwrap()),
            scale_factor: 1.3,
            min_neighbors: 5,
        };

        let poisoner = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = detector.classifier.lock().unwrap();
            panic!("drop the guard mid-panic");
        }));
        assert!(poisoner.is_err());

        // Reaching a Result at all proves the guard was recovered; the
        // empty classifier itself may still reject the call
        let _ = detector.detect(&blank_image(32, 32));
    }
}
