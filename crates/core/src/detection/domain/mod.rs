pub mod crop_rect_builder;
pub mod face_locator;
pub mod landmark_predictor;
pub mod landmarks;
