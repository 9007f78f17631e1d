pub mod dat_format;
pub mod ert_predictor;
pub mod model_resolver;
pub mod regression_tree;
pub mod seeta_face_locator;
