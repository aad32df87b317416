use ndarray::Array2;

const INV_SQRT2: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Detail sub-bands produced at one decomposition level, together with the
/// shape of the array that was decomposed (needed to undo odd-length padding
/// during reconstruction).
#[derive(Debug, Clone)]
struct LevelBands {
    lh: Array2<f32>,
    hl: Array2<f32>,
    hh: Array2<f32>,
    shape: (usize, usize),
}

/// Multi-level 2D haar wavelet decomposition of a single-channel image.
#[derive(Debug, Clone)]
pub struct WaveletPyramid {
    approx: Array2<f32>,
    levels: Vec<LevelBands>,
}

fn dwt1(signal: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let n = signal.len();
    let pairs = (n + 1) / 2;
    let mut approx = Vec::with_capacity(pairs);
    let mut detail = Vec::with_capacity(pairs);

    for i in 0..pairs {
        let x0 = signal[2 * i];
        // Symmetric extension for odd-length signals
        let x1 = if 2 * i + 1 < n { signal[2 * i + 1] } else { x0 };
        approx.push((x0 + x1) * INV_SQRT2);
        detail.push((x0 - x1) * INV_SQRT2);
    }

    (approx, detail)
}

fn idwt1(approx: &[f32], detail: &[f32], out_len: usize, out: &mut Vec<f32>) {
    out.clear();
    for (a, d) in approx.iter().zip(detail.iter()) {
        out.push((a + d) * INV_SQRT2);
        out.push((a - d) * INV_SQRT2);
    }
    out.truncate(out_len);
}

/// One separable analysis step: rows first, then columns.
/// Input (r, c) yields four sub-bands of shape (ceil(r/2), ceil(c/2)).
fn decompose_step(img: &Array2<f32>) -> (Array2<f32>, LevelBands) {
    let (rows, cols) = img.dim();
    let half_cols = (cols + 1) / 2;
    let half_rows = (rows + 1) / 2;

    let mut low = Array2::<f32>::zeros((rows, half_cols));
    let mut high = Array2::<f32>::zeros((rows, half_cols));
    for (i, row) in img.outer_iter().enumerate() {
        let row_vec: Vec<f32> = row.to_vec();
        let (a, d) = dwt1(&row_vec);
        for j in 0..half_cols {
            low[[i, j]] = a[j];
            high[[i, j]] = d[j];
        }
    }

    let mut ll = Array2::<f32>::zeros((half_rows, half_cols));
    let mut lh = Array2::<f32>::zeros((half_rows, half_cols));
    let mut hl = Array2::<f32>::zeros((half_rows, half_cols));
    let mut hh = Array2::<f32>::zeros((half_rows, half_cols));

    for j in 0..half_cols {
        let col_low: Vec<f32> = low.column(j).to_vec();
        let col_high: Vec<f32> = high.column(j).to_vec();

        let (la, ld) = dwt1(&col_low);
        let (ha, hd) = dwt1(&col_high);
        for i in 0..half_rows {
            ll[[i, j]] = la[i];
            lh[[i, j]] = ld[i];
            hl[[i, j]] = ha[i];
            hh[[i, j]] = hd[i];
        }
    }

    (ll, LevelBands { lh, hl, hh, shape: (rows, cols) })
}

/// One separable synthesis step: columns first, then rows, truncating the
/// padding introduced for odd dimensions.
fn reconstruct_step(approx: &Array2<f32>, bands: &LevelBands) -> Array2<f32> {
    let (rows, cols) = bands.shape;
    let half_cols = approx.dim().1;

    let mut low = Array2::<f32>::zeros((rows, half_cols));
    let mut high = Array2::<f32>::zeros((rows, half_cols));
    let mut scratch = Vec::with_capacity(rows + 1);

    for j in 0..half_cols {
        idwt1(&approx.column(j).to_vec(), &bands.lh.column(j).to_vec(), rows, &mut scratch);
        for i in 0..rows {
            low[[i, j]] = scratch[i];
        }
        idwt1(&bands.hl.column(j).to_vec(), &bands.hh.column(j).to_vec(), rows, &mut scratch);
        for i in 0..rows {
            high[[i, j]] = scratch[i];
        }
    }

    let mut out = Array2::<f32>::zeros((rows, cols));
    for i in 0..rows {
        idwt1(&low.row(i).to_vec(), &high.row(i).to_vec(), cols, &mut scratch);
        for j in 0..cols {
            out[[i, j]] = scratch[j];
        }
    }

    out
}

impl WaveletPyramid {
    /// Decompose `img` down `levels` times, stopping early once a dimension
    /// can no longer be halved.
    pub fn decompose(img: &Array2<f32>, levels: usize) -> Self {
        let mut approx = img.clone();
        let mut bands = Vec::with_capacity(levels);

        for _ in 0..levels {
            let (rows, cols) = approx.dim();
            if rows < 2 || cols < 2 {
                break;
            }
            let (next, level) = decompose_step(&approx);
            bands.push(level);
            approx = next;
        }

        WaveletPyramid { approx, levels: bands }
    }

    /// Zero the coarsest approximation band. What remains after
    /// reconstruction is the detail (edge) content of the image.
    pub fn drop_approximation(&mut self) {
        self.approx.fill(0.0);
    }

    pub fn reconstruct(&self) -> Array2<f32> {
        let mut img = self.approx.clone();
        for bands in self.levels.iter().rev() {
            img = reconstruct_step(&img, bands);
        }
        img
    }
}

/// Detail-only reconstruction: decompose, discard the coarse approximation,
/// and rebuild. The result keeps edges and texture while flattening smooth
/// intensity gradients, which is the discriminative signal the classifier
/// was trained on.
pub fn detail_reconstruction(img: &Array2<f32>, levels: usize) -> Array2<f32> {
    let mut pyramid = WaveletPyramid::decompose(img, levels);
    pyramid.drop_approximation();
    pyramid.reconstruct()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0f32, f32::max)
    }

    #[test]
    fn test_dwt1_known_values() {
        let (a, d) = dwt1(&[1.0, 3.0]);
        assert!((a[0] - 4.0 * INV_SQRT2).abs() < 1e-6);
        assert!((d[0] - (-2.0) * INV_SQRT2).abs() < 1e-6);
    }

    #[test]
    fn test_dwt1_roundtrip_odd_length() {
        let signal = vec![2.0, -1.0, 5.0, 0.5, 3.0];
        let (a, d) = dwt1(&signal);
        let mut out = Vec::new();
        idwt1(&a, &d, signal.len(), &mut out);
        for (x, y) in signal.iter().zip(out.iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_perfect_reconstruction_full_pyramid() {
        let img = Array2::from_shape_fn((17, 23), |(i, j)| (i * 31 + j * 7) as f32 % 13.0);
        let pyramid = WaveletPyramid::decompose(&img, 3);
        let rebuilt = pyramid.reconstruct();
        assert_eq!(rebuilt.dim(), img.dim());
        assert!(max_abs_diff(&img, &rebuilt) < 1e-3);
    }

    #[test]
    fn test_constant_image_has_no_detail() {
        let img = Array2::from_elem((32, 32), 87.5f32);
        let detail = detail_reconstruction(&img, 5);
        assert_eq!(detail.dim(), (32, 32));
        assert!(detail.iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_edge_survives_detail_reconstruction() {
        // Left half dark, right half bright: the step edge is detail content
        let img = Array2::from_shape_fn((16, 16), |(_, j)| if j < 8 { 0.0 } else { 1.0 });
        let detail = detail_reconstruction(&img, 4);
        let energy: f32 = detail.iter().map(|v| v * v).sum();
        assert!(energy > 0.1);
    }

    #[test]
    fn test_decompose_is_deterministic() {
        let img = Array2::from_shape_fn((32, 32), |(i, j)| ((i * j) as f32).sin());
        let first = detail_reconstruction(&img, 5);
        let second = detail_reconstruction(&img, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_level_cap_on_small_input() {
        // A 2x2 image supports exactly one decomposition level
        let img = array![[1.0f32, 2.0], [3.0, 4.0]];
        let pyramid = WaveletPyramid::decompose(&img, 5);
        assert_eq!(pyramid.levels.len(), 1);
        assert_eq!(pyramid.approx.dim(), (1, 1));
    }
}
