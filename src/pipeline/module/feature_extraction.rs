use ndarray::Array1;
use opencv::core::{Mat, MatTraitConst, Vec3b};

use crate::pipeline::errors::PipelineError;
use crate::pipeline::processing::wavelet::detail_reconstruction;
use crate::pipeline::utils::image::{
    gray_mat_to_unit_array, resize_mat, to_grayscale, unit_array_to_gray_mat,
};

/// Turns a qualified face crop into the fixed-length vector the classifier
/// was trained on.
///
/// Layout contract (strict, versioned with the artifact): the canonical
/// color crop flattened pixel-major with channel-last ordering, followed by
/// the flattened canonical wavelet detail image.
#[derive(Debug)]
pub struct FeatureExtraction {
    image_size: (i32, i32),
    wavelet_levels: usize,
}

impl FeatureExtraction {
    pub fn new(image_size: (i32, i32), wavelet_levels: usize) -> Self {
        FeatureExtraction { image_size, wavelet_levels }
    }

    pub fn output_len(&self) -> usize {
        let (w, h) = self.image_size;
        (w * h * 3 + w * h) as usize
    }

    pub fn call(&self, face: &Mat) -> Result<Array1<f32>, PipelineError> {
        let (width, height) = self.image_size;

        // Raw branch: canonical-resolution color crop
        let scaled_raw = resize_mat(face, width, height)?;

        // Wavelet branch: detail reconstruction of the full-size crop,
        // then resized to canonical resolution
        let gray = to_grayscale(face)?;
        let unit = gray_mat_to_unit_array(&gray)?;
        let detail = detail_reconstruction(&unit, self.wavelet_levels);
        let detail_mat = unit_array_to_gray_mat(&detail)?;
        let scaled_wavelet = resize_mat(&detail_mat, width, height)?;

        let mut features = Vec::with_capacity(self.output_len());
        for y in 0..height {
            for x in 0..width {
                let pixel = scaled_raw.at_2d::<Vec3b>(y, x)?;
                for c in 0..3 {
                    features.push(pixel[c] as f32);
                }
            }
        }
        for y in 0..height {
            for x in 0..width {
                features.push(*scaled_wavelet.at_2d::<u8>(y, x)? as f32);
            }
        }

        Ok(Array1::from(features))
    }
}
