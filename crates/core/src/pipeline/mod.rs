pub mod outcome;
pub mod process_dataset_use_case;
pub mod process_image_use_case;
