pub mod classify_model;
