use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::OnceCell;

use crate::config::settings;
use crate::pipeline::errors::ArtifactError;
use crate::pipeline::model_config::config::{
    EyeDetectionConfig, FaceDetectionConfig, FEATURE_LEN,
};
use crate::pipeline::module::classification::{ClassifierModel, LinearClassifier};
use crate::pipeline::module::face_location::{CascadeDetector, RegionDetector};

/// Where on disk the durable artifacts live.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model_path: String,
    pub class_mapping_path: String,
    pub face_cascade_path: String,
    pub eye_cascade_path: String,
}

impl From<&settings::Artifact> for ArtifactConfig {
    fn from(cfg: &settings::Artifact) -> Self {
        ArtifactConfig {
            model_path: cfg.model_path.clone(),
            class_mapping_path: cfg.class_mapping_path.clone(),
            face_cascade_path: cfg.face_cascade_path.clone(),
            eye_cascade_path: cfg.eye_cascade_path.clone(),
        }
    }
}

/// Everything loaded from durable storage, immutable after load and shared
/// read-only by all concurrent requests.
pub struct ArtifactBundle {
    pub model: LinearClassifier,
    pub class_names: Vec<String>,
    pub face_detector: Box<dyn RegionDetector>,
    pub eye_detector: Box<dyn RegionDetector>,
}

/// One-time-initialization guard around the artifact bundle. `load` reads
/// the artifacts exactly once per process; later calls are no-ops returning
/// the same bundle.
pub struct ArtifactStore {
    cell: OnceCell<ArtifactBundle>,
}

pub static STORE: ArtifactStore = ArtifactStore::new();

impl ArtifactStore {
    pub const fn new() -> Self {
        ArtifactStore { cell: OnceCell::new() }
    }

    pub fn load(&self, cfg: &ArtifactConfig) -> Result<&ArtifactBundle, ArtifactError> {
        self.init_with(|| read_bundle(cfg))
    }

    /// Accessor for components that do not drive loading themselves.
    pub fn get(&self) -> Result<&ArtifactBundle, ArtifactError> {
        self.cell.get().ok_or(ArtifactError::NotLoaded)
    }

    fn init_with<F>(&self, init: F) -> Result<&ArtifactBundle, ArtifactError>
    where
        F: FnOnce() -> Result<ArtifactBundle, ArtifactError>,
    {
        self.cell.get_or_try_init(init)
    }
}

fn read_artifact_file(path: &str) -> Result<String, ArtifactError> {
    if !Path::new(path).exists() {
        return Err(ArtifactError::MissingFile { path: path.to_string() });
    }
    fs::read_to_string(path).map_err(|_| ArtifactError::MissingFile { path: path.to_string() })
}

/// Parse the name→index mapping file and invert it into an index-ordered
/// name list. The mapping must cover exactly 0..expected_count with no
/// gaps or duplicates.
fn read_class_mapping(path: &str, expected_count: usize) -> Result<Vec<String>, ArtifactError> {
    let data = read_artifact_file(path)?;
    let mapping: HashMap<String, usize> =
        serde_json::from_str(&data).map_err(|e| ArtifactError::MalformedMapping(e.to_string()))?;

    if mapping.len() != expected_count {
        return Err(ArtifactError::MalformedMapping(format!(
            "mapping lists {} classes but the model has {}",
            mapping.len(),
            expected_count
        )));
    }

    let mut names: Vec<Option<String>> = vec![None; expected_count];
    for (name, index) in mapping {
        if index >= expected_count {
            return Err(ArtifactError::MalformedMapping(format!(
                "class index {index} out of range for {expected_count} classes"
            )));
        }
        if names[index].is_some() {
            return Err(ArtifactError::MalformedMapping(format!(
                "duplicate class index {index}"
            )));
        }
        names[index] = Some(name);
    }

    // len + range + no-duplicates above guarantee every slot is filled
    Ok(names.into_iter().map(|n| n.unwrap()).collect())
}

fn read_bundle(cfg: &ArtifactConfig) -> Result<ArtifactBundle, ArtifactError> {
    let model_json = read_artifact_file(&cfg.model_path)?;
    let model = LinearClassifier::from_json(&model_json)?;

    if model.input_dim() != FEATURE_LEN {
        return Err(ArtifactError::DimensionMismatch {
            expected: FEATURE_LEN,
            artifact: model.input_dim(),
        });
    }

    let class_names = read_class_mapping(&cfg.class_mapping_path, model.class_count())?;

    let face_cfg = FaceDetectionConfig::new();
    let eye_cfg = EyeDetectionConfig::new();
    let face_detector = CascadeDetector::from_file(
        &cfg.face_cascade_path,
        face_cfg.scale_factor,
        face_cfg.min_neighbors,
    )?;
    let eye_detector = CascadeDetector::from_file(
        &cfg.eye_cascade_path,
        eye_cfg.scale_factor,
        eye_cfg.min_neighbors,
    )?;

    Ok(ArtifactBundle {
        model,
        class_names,
        face_detector: Box::new(face_detector),
        eye_detector: Box::new(eye_detector),
    })
}
