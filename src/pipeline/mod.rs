pub mod artifact;
pub mod classify_pipeline;
pub mod errors;
pub mod model_config;
pub mod module;
pub mod processing;
pub mod utils;
