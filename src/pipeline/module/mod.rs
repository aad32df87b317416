pub mod classification;
pub mod face_location;
pub mod face_qualification;
pub mod feature_extraction;
