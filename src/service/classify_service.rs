use std::sync::Arc;
use log::error;

use crate::models::classify_model::{ClassificationInput, ClassificationResultOutput};
use crate::pipeline::classify_pipeline::classify_pipeline::ClassificationPipeline;
use crate::pipeline::errors::PipelineError;

#[derive(Clone)]
pub struct ClassifyService {
    classify_pipeline: Arc<ClassificationPipeline>,
}

impl ClassifyService {
    pub fn new(classify_pipeline: &Arc<ClassificationPipeline>) -> Self {
        ClassifyService {
            classify_pipeline: Arc::clone(classify_pipeline),
        }
    }

    /// Runs the pipeline for one payload. An empty vector means no face
    /// qualified; the handler maps that to its own response.
    pub async fn classify_image(
        &self,
        input: ClassificationInput,
    ) -> Result<Vec<ClassificationResultOutput>, PipelineError> {
        let results = match self.classify_pipeline.classify(&input.image_data) {
            Ok(results) => results,
            Err(e) => {
                error!("failed to classify image: {e}");
                return Err(e);
            }
        };

        drop(input.image_data);

        Ok(results
            .into_iter()
            .map(|result| ClassificationResultOutput {
                class_index: result.class_index,
                class_name: result.class_name,
                class_probability: result.class_probability,
            })
            .collect())
    }
}
