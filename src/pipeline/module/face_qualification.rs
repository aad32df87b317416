use crate::pipeline::module::face_location::FaceRegion;

/// Filters located faces down to the ones usable for classification.
///
/// Two visible eyes is a cheap, robust proxy for a clear, non-occluded,
/// frontal face; candidates below the threshold are dropped silently rather
/// than surfaced as per-face errors.
pub struct FaceQualification {
    min_eye_count: usize,
}

impl FaceQualification {
    pub fn new(min_eye_count: usize) -> Self {
        FaceQualification { min_eye_count }
    }

    pub fn call(&self, regions: Vec<FaceRegion>) -> Vec<FaceRegion> {
        regions
            .into_iter()
            .filter(|region| region.eyes.len() >= self.min_eye_count)
            .collect()
    }
}
