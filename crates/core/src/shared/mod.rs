pub mod bitmap;
pub mod constants;
pub mod face_box;
pub mod similarity;
