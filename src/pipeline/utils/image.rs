use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ndarray::Array2;
use opencv::core::{Mat, MatTraitConst, Rect, Size, CV_8U};
use opencv::imgcodecs::{imdecode, IMREAD_COLOR};
use opencv::imgproc::{cvt_color, resize, COLOR_BGR2GRAY, INTER_LINEAR};

use crate::pipeline::errors::PipelineError;

/// Decode an image payload into a 3-channel BGR Mat.
///
/// Accepts either raw encoded file bytes or a UTF-8 data-URI
/// (`data:<mime>;base64,<payload>`), auto-detected by the `data:` prefix.
pub fn decode_image_payload(payload: &[u8]) -> Result<Mat, PipelineError> {
    if payload.is_empty() {
        return Err(PipelineError::Decode("empty image payload".to_string()));
    }

    let raw: Vec<u8>;
    let bytes: &[u8] = if payload.starts_with(b"data:") {
        raw = strip_data_uri(payload)?;
        &raw
    } else {
        payload
    };

    let buf = Mat::from_slice(bytes)?;
    let img = imdecode(&buf, IMREAD_COLOR)?;

    // imdecode reports malformed input as an empty Mat, not an error
    if img.empty() {
        return Err(PipelineError::Decode("payload is not a valid image".to_string()));
    }

    Ok(img)
}

fn strip_data_uri(payload: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| PipelineError::Decode("data uri is not valid utf-8".to_string()))?;

    let encoded = match text.split_once(',') {
        Some((_, encoded)) => encoded,
        None => {
            return Err(PipelineError::Decode("data uri has no payload separator".to_string()))
        }
    };

    BASE64
        .decode(encoded.trim())
        .map_err(|e| PipelineError::Decode(format!("invalid base64 payload: {e}")))
}

pub fn to_grayscale(img: &Mat) -> Result<Mat, PipelineError> {
    let mut gray = Mat::default();
    cvt_color(img, &mut gray, COLOR_BGR2GRAY, 0)?;
    Ok(gray)
}

pub fn resize_mat(img: &Mat, width: i32, height: i32) -> Result<Mat, PipelineError> {
    let mut resized = Mat::default();
    resize(img, &mut resized, Size::new(width, height), 0.0, 0.0, INTER_LINEAR)?;
    Ok(resized)
}

/// Crop a rectangle out of `img` into an owned Mat.
pub fn crop_region(img: &Mat, region: Rect) -> Result<Mat, PipelineError> {
    let roi = Mat::roi(img, region)?;
    Ok(roi.try_clone()?)
}

/// Single-channel u8 Mat to an f32 ndarray scaled into [0, 1].
pub fn gray_mat_to_unit_array(gray: &Mat) -> Result<Array2<f32>, PipelineError> {
    let rows = gray.rows();
    let cols = gray.cols();

    let mut arr = Array2::<f32>::zeros((rows as usize, cols as usize));
    for i in 0..rows {
        for j in 0..cols {
            arr[[i as usize, j as usize]] = *gray.at_2d::<u8>(i, j)? as f32 / 255.0;
        }
    }
    Ok(arr)
}

/// f32 ndarray in [0, 1] back to a single-channel u8 Mat, clamped.
pub fn unit_array_to_gray_mat(arr: &Array2<f32>) -> Result<Mat, PipelineError> {
    use opencv::core::{MatTrait, Scalar};

    let (rows, cols) = arr.dim();
    let mut mat =
        Mat::new_rows_cols_with_default(rows as i32, cols as i32, CV_8U, Scalar::all(0.0))?;

    for i in 0..rows {
        for j in 0..cols {
            let v = (arr[[i, j]] * 255.0).round().clamp(0.0, 255.0);
            *mat.at_2d_mut::<u8>(i as i32, j as i32)? = v as u8;
        }
    }
    Ok(mat)
}
