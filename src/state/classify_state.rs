use std::sync::Arc;
use crate::pipeline::classify_pipeline::classify_pipeline::ClassificationPipeline;
use crate::service::classify_service::ClassifyService;

#[derive(Clone)]
pub struct ClassifyState {
    pub classify_service: ClassifyService,
}

impl ClassifyState {
    pub fn new(pipeline: &Arc<ClassificationPipeline>) -> Self {
        Self {
            classify_service: ClassifyService::new(pipeline),
        }
    }
}
