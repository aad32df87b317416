pub mod classify_pipeline;
