use bytes::Bytes;
use serde::Serialize;

/// One qualified face's classification as serialized to the caller:
/// the winning class plus the full per-class percentage breakdown,
/// ordered by class index.
#[derive(Clone, Serialize)]
pub struct ClassificationResultOutput {
    pub class_index: usize,
    pub class_name: String,
    pub class_probability: Vec<f32>,
}

#[derive(Clone)]
pub struct ClassificationInput {
    pub image_data: Bytes,
}
