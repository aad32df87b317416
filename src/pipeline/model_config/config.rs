/// Canonical square resolution every qualified face is resized to before
/// feature extraction. This value is a contract with the trained classifier
/// artifact and must not drift independently of it.
pub const CANONICAL_SIZE: i32 = 32;

/// Decomposition depth of the 2D haar wavelet transform applied to the face
/// crop before the detail reconstruction is resized back to canonical size.
pub const WAVELET_LEVELS: usize = 5;

/// Fixed feature vector layout: the flattened canonical color crop followed
/// by the flattened canonical wavelet image, in that order. Versioned
/// alongside the classifier artifact; artifacts declaring a different input
/// length are rejected at load.
pub const FEATURE_LEN: usize =
    (CANONICAL_SIZE * CANONICAL_SIZE * 3) as usize + (CANONICAL_SIZE * CANONICAL_SIZE) as usize;

#[derive(Debug)]
pub struct FaceDetectionConfig {
    pub scale_factor: f64,
    pub min_neighbors: i32,
}

impl FaceDetectionConfig {
    pub fn new() -> Self {
        FaceDetectionConfig {
            scale_factor: 1.3,
            min_neighbors: 5,
        }
    }
}

#[derive(Debug)]
pub struct EyeDetectionConfig {
    pub scale_factor: f64,
    pub min_neighbors: i32,
}

impl EyeDetectionConfig {
    pub fn new() -> Self {
        EyeDetectionConfig {
            scale_factor: 1.1,
            min_neighbors: 3,
        }
    }
}

#[derive(Debug)]
pub struct FaceQualificationConfig {
    pub min_eye_count: usize,
}

impl FaceQualificationConfig {
    pub fn new() -> Self {
        FaceQualificationConfig { min_eye_count: 2 }
    }
}

#[derive(Debug)]
pub struct FeatureExtractionConfig {
    pub image_size: (i32, i32),
    pub wavelet_levels: usize,
}

impl FeatureExtractionConfig {
    pub fn new() -> Self {
        FeatureExtractionConfig {
            image_size: (CANONICAL_SIZE, CANONICAL_SIZE),
            wavelet_levels: WAVELET_LEVELS,
        }
    }
}
